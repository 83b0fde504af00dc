//! FitSupply Core - Shared domain types.
//!
//! This crate provides the types shared by every FitSupply client component:
//! - `client` - API gateway, state containers and persistence
//! - `cli` - Command-line storefront and admin console
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage. Cart invariants live here so they can be tested
//! without a backend.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, statuses, catalog, cart, orders and analytics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
