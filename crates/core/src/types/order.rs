//! Orders placed through checkout and managed from the admin console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderItemId, ProductId, UserId};
use super::price::Price;
use super::status::OrderStatus;

/// The customer attached to an order (absent for guest orders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Option<OrderItemId>,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub price_at_time: Price,
    pub subtotal: Price,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer: Option<OrderCustomer>,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Whether the order matches an admin search term.
    ///
    /// Matches order number and the customer's email, names and username,
    /// case-insensitively. An empty term matches everything.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        if self.order_number.to_lowercase().contains(&term) {
            return true;
        }
        self.customer.as_ref().is_some_and(|customer| {
            [
                &customer.email,
                &customer.first_name,
                &customer.last_name,
                &customer.username,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
        })
    }

    /// Customer display name, falling back to "Guest".
    #[must_use]
    pub fn customer_name(&self) -> String {
        self.customer.as_ref().map_or_else(
            || "Guest".to_owned(),
            |customer| {
                let full = format!("{} {}", customer.first_name, customer.last_name);
                let full = full.trim();
                if full.is_empty() {
                    customer.username.clone()
                } else {
                    full.to_owned()
                }
            },
        )
    }

    /// Total units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(customer: Option<OrderCustomer>) -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "FS-1A2B3C".to_string(),
            customer,
            status: OrderStatus::Pending,
            total_amount: Price::from_cents(5400),
            shipping_address: String::new(),
            billing_address: String::new(),
            payment_method: "credit_card".to_string(),
            notes: String::new(),
            created_at: None,
            updated_at: None,
            items: vec![],
        }
    }

    fn jane() -> OrderCustomer {
        OrderCustomer {
            id: UserId::new(4),
            username: "jdoe".to_string(),
            email: "jane@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
        }
    }

    #[test]
    fn test_matches_search_by_order_number_and_customer() {
        let o = order(Some(jane()));
        assert!(o.matches_search("fs-1a"));
        assert!(o.matches_search("EXAMPLE.COM"));
        assert!(o.matches_search("doe"));
        assert!(o.matches_search(""));
        assert!(!o.matches_search("smith"));
    }

    #[test]
    fn test_guest_order() {
        let o = order(None);
        assert_eq!(o.customer_name(), "Guest");
        assert!(!o.matches_search("jane"));
    }
}
