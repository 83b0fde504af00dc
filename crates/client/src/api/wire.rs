//! Request and response bodies exactly as the backend speaks them.
//!
//! Response types are deliberately lenient (optional fields, alternate
//! shapes); the conversion layer turns them into the canonical core types.

use chrono::{DateTime, Utc};
use fitsupply_core::{CategoryId, OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Collections
// =============================================================================

/// A collection response: bare array or a paginated `{results}` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    List(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) | Self::Page { results: items } => items,
        }
    }
}

/// A lookup that may answer with one record or a collection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(ListResponse<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(list) => list.into_vec(),
            Self::One(item) => vec![item],
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password2: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub first_name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub last_name: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

/// Category as either an embedded object or a bare name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryWire {
    Embedded {
        #[serde(default)]
        id: Option<CategoryId>,
        name: String,
        #[serde(default)]
        slug: Option<String>,
    },
    Named(String),
}

/// Image as a bare URL or an object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageWire {
    Url(String),
    Object {
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductWire {
    pub id: ProductId,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub compare_price: Option<Price>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryWire>,
    #[serde(default)]
    pub images: Option<Vec<ImageWire>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// A product's category in a write: its id when known, otherwise its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryWrite {
    Id(CategoryId),
    Name(String),
}

/// Body for creating or fully replacing a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWrite {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_price: Option<String>,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryWrite>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct OrderUserWire {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderProductWire {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemWire {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub product: Option<OrderProductWire>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: u32,
    pub price_at_time: Price,
    #[serde(default)]
    pub subtotal: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderWire {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: String,
    #[serde(default, alias = "customer")]
    pub user: Option<OrderUserWire>,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItemWire>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
    pub price: String,
}

/// Body of `POST /orders/`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreateRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    pub total_amount: String,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct StatusPatch<'a> {
    pub status: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_accepts_both_shapes() {
        let bare: ListResponse<i64> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);
        let page: ListResponse<i64> =
            serde_json::from_str(r#"{"count":2,"next":null,"results":[3]}"#).unwrap();
        assert_eq!(page.into_vec(), vec![3]);
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<OrderProductWire> =
            serde_json::from_str(r#"{"id":1,"name":"Whey"}"#).unwrap();
        assert_eq!(one.into_vec().len(), 1);
        let many: OneOrMany<OrderProductWire> = serde_json::from_str("[]").unwrap();
        assert!(many.into_vec().is_empty());
    }

    #[test]
    fn test_category_wire_shapes() {
        let named: CategoryWire = serde_json::from_str(r#""Protein""#).unwrap();
        assert!(matches!(named, CategoryWire::Named(ref n) if n == "Protein"));
        let embedded: CategoryWire =
            serde_json::from_str(r#"{"id":3,"name":"Protein","slug":"protein"}"#).unwrap();
        assert!(matches!(embedded, CategoryWire::Embedded { .. }));
    }

    #[test]
    fn test_token_response_without_access() {
        let resp: TokenResponse = serde_json::from_str(r#"{"refresh":"r"}"#).unwrap();
        assert!(resp.access.is_none());
    }

    #[test]
    fn test_register_request_omits_blank_names() {
        let body = serde_json::to_value(RegisterRequest {
            username: "jdoe",
            email: "j@example.com",
            password: "pw",
            password2: "pw",
            first_name: "",
            last_name: "Doe",
        })
        .unwrap();
        assert!(body.get("first_name").is_none());
        assert_eq!(body["last_name"], "Doe");
        assert_eq!(body["password2"], "pw");
    }
}
