//! Orders container: checkout submission, history and admin status updates.

use std::sync::{Arc, RwLock};

use fitsupply_core::{LoadStatus, Order, OrderId, OrderStatus};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use super::auth::AuthStore;
use super::cart::CartStore;
use super::products::Lookup;
use super::{read, write};
use crate::api::wire::{OrderWire, StatusPatch};
use crate::api::{ApiClient, convert_order};
use crate::checkout::{CheckoutForm, build_order_request};
use crate::error::ClientError;

const ORDERS_PATH: &str = "/orders/";
const ORDERS_AUTH_REQUIRED: &str = "Please log in to continue.";

/// Snapshot of the orders container.
#[derive(Debug, Clone, Default)]
pub struct OrdersState {
    pub orders: Vec<Order>,
    pub status: LoadStatus,
    pub error: Option<String>,
    /// The order created by the most recent checkout.
    pub last_placed: Option<Order>,
}

/// Orders container handle. Cheap to clone.
#[derive(Clone)]
pub struct OrderStore {
    inner: Arc<OrderStoreInner>,
}

struct OrderStoreInner {
    api: ApiClient,
    auth: AuthStore,
    cart: CartStore,
    state: RwLock<OrdersState>,
}

impl OrderStore {
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthStore, cart: CartStore) -> Self {
        Self {
            inner: Arc::new(OrderStoreInner {
                api,
                auth,
                cart,
                state: RwLock::new(OrdersState::default()),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> OrdersState {
        read(&self.inner.state).clone()
    }

    fn token(&self) -> Result<SecretString, ClientError> {
        self.inner
            .auth
            .token()
            .ok_or(ClientError::MissingToken(ORDERS_AUTH_REQUIRED))
    }

    fn record_failure(&self, e: &ClientError) {
        let mut state = write(&self.inner.state);
        state.status = LoadStatus::Failed;
        state.error = Some(e.to_string());
    }

    /// Submit the current cart as an order, then empty the cart.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any request, or the backend error.
    /// The cart is left intact on failure.
    #[instrument(skip(self, form))]
    pub async fn place_order(&self, form: &CheckoutForm) -> Result<Order, ClientError> {
        let cart = self.inner.cart.cart();
        let result: Result<Order, ClientError> = async {
            let body = build_order_request(&cart, form)?;
            let token = self.token()?;
            let wire: OrderWire = self.inner.api.post(ORDERS_PATH, &body, Some(&token)).await?;
            Ok(convert_order(wire))
        }
        .await;

        match result {
            Ok(order) => {
                info!(order_id = %order.id, order_number = %order.order_number, "Order placed");
                self.inner.cart.clear();
                let mut state = write(&self.inner.state);
                state.last_placed = Some(order.clone());
                state.orders.insert(0, order.clone());
                state.error = None;
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, "Order placement failed");
                write(&self.inner.state).error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Load the caller's orders (all orders for staff), newest first as
    /// returned by the backend.
    ///
    /// # Errors
    ///
    /// Fails without a request when no token is held.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        {
            let mut state = write(&self.inner.state);
            state.status = LoadStatus::Loading;
            state.error = None;
        }

        let result: Result<Vec<OrderWire>, ClientError> = async {
            let token = self.token()?;
            self.inner
                .api
                .get_list::<OrderWire>(ORDERS_PATH, &[], Some(&token))
                .await
        }
        .await;

        match result {
            Ok(wire) => {
                let orders: Vec<Order> = wire.into_iter().map(convert_order).collect();
                let mut state = write(&self.inner.state);
                state.orders.clone_from(&orders);
                state.status = LoadStatus::Succeeded;
                Ok(orders)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load orders");
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// The most recent order, for the confirmation view.
    ///
    /// # Errors
    ///
    /// Returns the list error.
    pub async fn latest_order(&self) -> Result<Lookup<Order>, ClientError> {
        let orders = self.list_orders().await?;
        Ok(orders
            .into_iter()
            .next()
            .map_or(Lookup::NotFound, Lookup::Found))
    }

    /// Change an order's status (staff only).
    ///
    /// # Errors
    ///
    /// Returns the backend error; the local copy is only updated on success.
    #[instrument(skip(self, status), fields(order_id = %id, new_status = %status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Order, ClientError> {
        let token = self.token()?;
        let path = format!("{ORDERS_PATH}{id}/");
        let body = StatusPatch {
            status: status.as_str(),
        };

        match self.inner.api.patch::<OrderWire, _>(&path, &body, Some(&token)).await {
            Ok(wire) => {
                let order = convert_order(wire);
                let mut state = write(&self.inner.state);
                if let Some(existing) = state.orders.iter_mut().find(|o| o.id == id) {
                    *existing = order.clone();
                }
                state.error = None;
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, "Failed to update order status");
                write(&self.inner.state).error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Loaded orders matching a search term and optional status.
    #[must_use]
    pub fn filter(&self, term: &str, status: Option<&OrderStatus>) -> Vec<Order> {
        read(&self.inner.state)
            .orders
            .iter()
            .filter(|order| order.matches_search(term))
            .filter(|order| status.is_none_or(|s| &order.status == s))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore").finish_non_exhaustive()
    }
}
