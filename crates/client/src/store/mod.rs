//! State containers and the composition root that wires them together.
//!
//! Each container owns its slice of state behind a `std::sync::RwLock`.
//! Locks are only ever held for short synchronous sections, never across
//! an `.await`.

mod admin;
mod auth;
mod cart;
mod dashboard;
mod orders;
mod products;
mod sync;

pub use admin::{CatalogAdmin, ProductDraft, QuickEdit};
pub use auth::{AuthState, AuthStore, Registration, SessionPhase, SessionTeardown};
pub use cart::{CartState, CartStore};
pub use dashboard::{DashboardState, DashboardStore, WidgetResults};
pub use orders::{OrderStore, OrdersState};
pub use products::{
    CatalogStats, Lookup, ProductFilter, ProductState, ProductStore, StockFilter,
};

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fitsupply_core::User;
use secrecy::SecretString;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::navigation::Navigator;
use crate::persist::Persistence;
use crate::storage::{FileStorage, Storage};

/// Read a container lock, recovering from poisoning.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write a container lock, recovering from poisoning.
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// The full client: one gateway, one storage backend and every container.
///
/// Construction rehydrates the token and cart synchronously, so the first
/// read of any container already sees durable state.
#[derive(Debug, Clone)]
pub struct Store {
    api: ApiClient,
    auth: AuthStore,
    cart: CartStore,
    products: ProductStore,
    dashboard: DashboardStore,
    orders: OrderStore,
    admin: CatalogAdmin,
}

impl Store {
    /// Open a store backed by files in the configured state directory.
    ///
    /// Must be called inside a Tokio runtime for debounced cart uploads.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the state directory or HTTP client cannot be
    /// created.
    pub fn open(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ClientError> {
        let storage = FileStorage::open(&config.state_dir)?;
        Self::with_storage(config, Arc::new(storage), navigator)
    }

    /// Open a store over any storage backend.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be created.
    pub fn with_storage(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let persistence = Persistence::new(storage);
        let rehydrated = persistence.rehydrate();
        info!(
            has_token = rehydrated.token.is_some(),
            cart_lines = rehydrated.cart.len(),
            "Rehydrated client state"
        );

        let api = ApiClient::new(config)?;
        let auth = AuthStore::new(api.clone(), persistence.clone(), rehydrated.token);
        api.set_unauthorized_hook(Arc::new(auth.teardown_hook(navigator)));

        let cart = CartStore::new(
            api.clone(),
            persistence,
            auth.clone(),
            rehydrated.cart,
            config.cart_sync_debounce,
        );
        let products = ProductStore::new(api.clone());
        let dashboard = DashboardStore::new(api.clone(), auth.clone());
        let orders = OrderStore::new(api.clone(), auth.clone(), cart.clone());
        let admin = CatalogAdmin::new(api.clone(), auth.clone(), products.clone());

        Ok(Self {
            api,
            auth,
            cart,
            products,
            dashboard,
            orders,
            admin,
        })
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthStore {
        &self.auth
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn products(&self) -> &ProductStore {
        &self.products
    }

    #[must_use]
    pub const fn dashboard(&self) -> &DashboardStore {
        &self.dashboard
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderStore {
        &self.orders
    }

    #[must_use]
    pub const fn admin(&self) -> &CatalogAdmin {
        &self.admin
    }

    /// Validate any stored session and, if it holds, pull the server cart.
    pub async fn start_session(&self) -> SessionPhase {
        let phase = self.auth.bootstrap().await;
        if phase == SessionPhase::Identified
            && let Err(e) = self.cart.fetch_remote().await
        {
            warn!(error = %e, "Could not load server cart, keeping local cart");
        }
        phase
    }

    /// Log in, identify, and adopt the server cart.
    ///
    /// # Errors
    ///
    /// Returns the login or profile error. A cart fetch failure is logged
    /// and does not fail the sign-in.
    pub async fn sign_in(&self, username: &str, password: &SecretString) -> Result<User, ClientError> {
        let user = self.auth.login_and_identify(username, password).await?;
        if let Err(e) = self.cart.fetch_remote().await {
            warn!(error = %e, "Could not load server cart after sign-in");
        }
        Ok(user)
    }

    /// Upload any pending cart edits, then drop the session.
    pub async fn sign_out(&self) {
        if let Err(e) = self.cart.flush().await {
            warn!(error = %e, "Pending cart upload failed during sign-out");
        }
        self.auth.logout();
    }

    /// Upload pending cart edits before the process exits.
    pub async fn shutdown(&self) {
        if let Err(e) = self.cart.flush().await {
            warn!(error = %e, "Pending cart upload failed during shutdown");
        }
    }
}
