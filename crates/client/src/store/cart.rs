//! Shopping cart container.
//!
//! Every mutation is applied locally, persisted, and (for sessions holding
//! a token) schedules a debounced upload of the whole cart. Local edits
//! never wait on the network.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use fitsupply_core::{Cart, CartLine, LoadStatus, Price};
use tracing::{debug, info, instrument, warn};

use super::auth::AuthStore;
use super::sync::CartSync;
use super::{read, write};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::persist::Persistence;

const CART_PATH: &str = "/cart/";
const CART_AUTH_REQUIRED: &str = "Authentication required to sync the cart.";

/// Snapshot of the cart container.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    pub cart: Cart,
    /// Status of the last server fetch.
    pub status: LoadStatus,
    pub error: Option<String>,
    /// Error from the last upload, cleared by the next successful one.
    pub sync_error: Option<String>,
}

/// Cart container handle. Cheap to clone.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

pub(super) struct CartStoreInner {
    api: ApiClient,
    persistence: Persistence,
    auth: AuthStore,
    state: RwLock<CartState>,
    sync: CartSync,
}

impl CartStore {
    /// Create the container with a rehydrated cart and start the upload
    /// task.
    #[must_use]
    pub fn new(
        api: ApiClient,
        persistence: Persistence,
        auth: AuthStore,
        cart: Cart,
        debounce: Duration,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak| CartStoreInner {
            api,
            persistence,
            auth,
            state: RwLock::new(CartState {
                cart,
                ..CartState::default()
            }),
            sync: CartSync::spawn(weak.clone(), debounce),
        });
        Self { inner }
    }

    pub(super) const fn from_inner(inner: Arc<CartStoreInner>) -> Self {
        Self { inner }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> CartState {
        read(&self.inner.state).clone()
    }

    #[must_use]
    pub fn cart(&self) -> Cart {
        read(&self.inner.state).cart.clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartLine> {
        read(&self.inner.state).cart.items().to_vec()
    }

    /// Sum of `price * qty` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        read(&self.inner.state).cart.subtotal()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        read(&self.inner.state).cart.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.inner.state).cart.is_empty()
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Add a line, merging quantities with an existing line for the same
    /// product.
    pub fn add_item(&self, line: CartLine) {
        debug!(product_id = %line.product_id, qty = line.qty, "Adding to cart");
        self.mutate(|cart| cart.add_item(line));
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove_item(&self, product_id: &str) -> bool {
        self.mutate(|cart| cart.remove_item(product_id))
    }

    /// Set a line's quantity; zero or less removes it. Unknown products are
    /// ignored. Returns whether the cart changed.
    pub fn update_quantity(&self, product_id: &str, qty: i64) -> bool {
        self.mutate(|cart| cart.update_quantity(product_id, qty))
    }

    /// Empty the cart and remove its stored record.
    pub fn clear(&self) {
        write(&self.inner.state).cart.clear();
        self.inner.persistence.clear_cart();
        self.schedule_sync();
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let (result, snapshot) = {
            let mut state = write(&self.inner.state);
            let result = f(&mut state.cart);
            (result, state.cart.clone())
        };
        self.inner.persistence.save_cart(&snapshot);
        self.schedule_sync();
        result
    }

    fn schedule_sync(&self) {
        if self.inner.auth.token().is_some() {
            self.inner.sync.schedule();
        }
    }

    // =========================================================================
    // Server sync
    // =========================================================================

    /// Replace the local cart with the server's copy.
    ///
    /// # Errors
    ///
    /// Fails without a request when no token is held. On failure the local
    /// lines are left untouched.
    #[instrument(skip(self))]
    pub async fn fetch_remote(&self) -> Result<(), ClientError> {
        let Some(token) = self.inner.auth.token() else {
            return Err(ClientError::MissingToken(CART_AUTH_REQUIRED));
        };

        {
            let mut state = write(&self.inner.state);
            state.status = LoadStatus::Loading;
            state.error = None;
        }

        match self.inner.api.get::<Cart>(CART_PATH, &[], Some(&token)).await {
            Ok(remote) => {
                let snapshot = {
                    let mut state = write(&self.inner.state);
                    state.cart.replace(remote);
                    state.status = LoadStatus::Succeeded;
                    state.error = None;
                    state.cart.clone()
                };
                self.inner.persistence.save_cart(&snapshot);
                info!(lines = snapshot.len(), "Loaded cart from server");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cart from server");
                let mut state = write(&self.inner.state);
                state.status = LoadStatus::Failed;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Upload the whole local cart, replacing the server's copy.
    ///
    /// # Errors
    ///
    /// Fails without a request when no token is held.
    #[instrument(skip(self))]
    pub async fn push_remote(&self) -> Result<(), ClientError> {
        let Some(token) = self.inner.auth.token() else {
            return Err(ClientError::MissingToken(CART_AUTH_REQUIRED));
        };
        let snapshot = self.cart();

        match self
            .inner
            .api
            .post_unit(CART_PATH, &snapshot, Some(&token))
            .await
        {
            Ok(()) => {
                debug!(lines = snapshot.len(), "Uploaded cart");
                write(&self.inner.state).sync_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to upload cart");
                write(&self.inner.state).sync_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Cancel any pending debounced upload and upload now, if a token is
    /// held.
    ///
    /// # Errors
    ///
    /// Returns the upload error.
    pub async fn flush(&self) -> Result<(), ClientError> {
        let pending = self.inner.sync.cancel();
        if !pending || self.inner.auth.token().is_none() {
            return Ok(());
        }
        self.push_remote().await
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &read(&self.inner.state).cart.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::persist::CART_KEY;
    use crate::storage::{MemoryStorage, Storage};

    fn store(storage: &Arc<MemoryStorage>, token: Option<&str>) -> CartStore {
        let config = crate::config::ClientConfig::for_backend(
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            std::env::temp_dir(),
        );
        let api = ApiClient::new(&config).unwrap();
        let persistence = Persistence::new(storage.clone());
        let auth = AuthStore::new(api.clone(), persistence.clone(), token.map(SecretString::from));
        CartStore::new(api, persistence, auth, Cart::new(), Duration::from_secs(60))
    }

    fn line(id: &str, cents: i64, qty: u32) -> CartLine {
        CartLine::new(id, format!("Product {id}"), Price::from_cents(cents)).with_quantity(qty)
    }

    fn stored_cart(storage: &MemoryStorage) -> Option<Cart> {
        storage
            .get(CART_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test]
    async fn test_mutations_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let cart = store(&storage, None);

        cart.add_item(line("1", 1000, 2));
        cart.add_item(line("1", 1000, 1));
        cart.add_item(line("2", 250, 4));
        assert_eq!(cart.item_count(), 7);
        assert_eq!(cart.subtotal(), Price::from_cents(4000));
        assert_eq!(stored_cart(&storage).unwrap(), cart.cart());

        assert!(cart.update_quantity("2", 1));
        assert_eq!(stored_cart(&storage).unwrap().item_count(), 4);

        assert!(cart.remove_item("1"));
        assert!(!cart.remove_item("1"));
        assert_eq!(stored_cart(&storage).unwrap().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert!(stored_cart(&storage).is_none());
    }

    #[tokio::test]
    async fn test_update_quantity_to_zero_removes() {
        let storage = Arc::new(MemoryStorage::new());
        let cart = store(&storage, None);
        cart.add_item(line("1", 1000, 2));
        assert!(cart.update_quantity("1", 0));
        assert!(cart.is_empty());
        assert!(!cart.update_quantity("missing", 3));
    }

    #[tokio::test]
    async fn test_remote_ops_require_token() {
        let storage = Arc::new(MemoryStorage::new());
        let cart = store(&storage, None);
        cart.add_item(line("1", 1000, 1));

        assert!(matches!(
            cart.fetch_remote().await,
            Err(ClientError::MissingToken(_))
        ));
        assert!(matches!(
            cart.push_remote().await,
            Err(ClientError::MissingToken(_))
        ));
        // Nothing pending for an anonymous cart.
        assert!(cart.flush().await.is_ok());
        assert_eq!(cart.item_count(), 1);
    }
}
