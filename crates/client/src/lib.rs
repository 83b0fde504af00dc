//! FitSupply client: API gateway, state containers and durable session state.
//!
//! # Architecture
//!
//! - [`api`] - REST gateway with per-request bearer auth and error flattening
//! - [`store`] - state containers (auth, cart, products, dashboard, orders)
//!   and the [`Store`] composition root
//! - [`persist`] / [`storage`] - durable cart and token records
//! - [`checkout`] - checkout form, totals and order payload
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fitsupply_client::{ClientConfig, Store, TracingNavigator};
//!
//! let config = ClientConfig::from_env()?;
//! let store = Store::open(&config, Arc::new(TracingNavigator))?;
//! store.start_session().await;
//! store.products().fetch_all(None).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod navigation;
pub mod persist;
pub mod storage;
pub mod store;

pub use api::ApiClient;
pub use checkout::{Address, CheckoutForm, Totals};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use navigation::{Navigator, RecordingNavigator, Route, TracingNavigator};
pub use store::{
    AuthState, AuthStore, CartState, CartStore, CatalogAdmin, CatalogStats, DashboardState,
    DashboardStore, Lookup, OrderStore, OrdersState, ProductDraft, ProductFilter, ProductState,
    ProductStore, QuickEdit, Registration, SessionPhase, StockFilter, Store, WidgetResults,
};
