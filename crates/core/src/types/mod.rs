//! Core types for FitSupply.
//!
//! This module provides type-safe wrappers and domain records for the
//! storefront and admin console.

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod id;
pub mod order;
pub mod price;
pub mod status;
pub mod user;

pub use analytics::{DashboardSummary, RecentOrder, SalesPoint, percentage_change};
pub use cart::{Cart, CartLine};
pub use catalog::{Category, Product, ProductRef, slugify};
pub use id::*;
pub use order::{Order, OrderCustomer, OrderItem};
pub use price::Price;
pub use status::*;
pub use user::User;
