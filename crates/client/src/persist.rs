//! Mirrors the cart and the session token into durable storage.
//!
//! Two records exist: `cart` (JSON `{"items": [...]}`) and `token` (the raw
//! access token). The user record is never persisted. Write failures are
//! logged and swallowed: the in-memory state stays authoritative for the
//! running session.

use std::sync::Arc;

use fitsupply_core::Cart;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::storage::Storage;

/// Storage key for the cart record.
pub const CART_KEY: &str = "cart";

/// Storage key for the access token.
pub const TOKEN_KEY: &str = "token";

/// State read back from storage at startup.
#[derive(Debug, Default)]
pub struct Rehydrated {
    pub token: Option<SecretString>,
    pub cart: Cart,
}

/// Adapter between the state containers and a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct Persistence {
    storage: Arc<dyn Storage>,
}

impl Persistence {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read the token and cart records.
    ///
    /// Unreadable or corrupt records are treated as absent.
    #[must_use]
    pub fn rehydrate(&self) -> Rehydrated {
        Rehydrated {
            token: self.load_token(),
            cart: self.load_cart(),
        }
    }

    /// The stored token, if any.
    #[must_use]
    pub fn load_token(&self) -> Option<SecretString> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| SecretString::from(raw.to_owned()))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// The stored cart, or an empty cart if missing or corrupt.
    #[must_use]
    pub fn load_cart(&self) -> Cart {
        match self.storage.get(CART_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Stored cart is corrupt, starting empty");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart");
                Cart::new()
            }
        }
    }

    pub fn save_cart(&self, cart: &Cart) {
        let json = match serde_json::to_string(cart) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_KEY, &json) {
            warn!(error = %e, "Failed to persist cart");
        } else {
            debug!(lines = cart.len(), "Persisted cart");
        }
    }

    pub fn clear_cart(&self) {
        if let Err(e) = self.storage.remove(CART_KEY) {
            warn!(error = %e, "Failed to remove stored cart");
        }
    }

    pub fn save_token(&self, token: &SecretString) {
        if let Err(e) = self.storage.set(TOKEN_KEY, token.expose_secret()) {
            warn!(error = %e, "Failed to persist token");
        }
    }

    pub fn purge_token(&self) {
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove stored token");
        }
    }
}
