//! Catalog types: products and categories.
//!
//! These are the canonical client-side shapes. The backend's inconsistent
//! wire forms (bare category names, single `image` fields) are normalized by
//! the client's conversion layer before they reach these types.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product category.
///
/// Categories that arrived as a bare name string have no `id` or `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<CategoryId>,
    pub name: String,
    pub slug: Option<String>,
}

impl Category {
    /// Create a category known only by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            slug: None,
        }
    }

    /// Whether this category matches a filter value (by slug or name, case-insensitive).
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        self.name.eq_ignore_ascii_case(filter)
            || self
                .slug
                .as_deref()
                .is_some_and(|slug| slug.eq_ignore_ascii_case(filter))
    }
}

/// A read-only projection of a backend product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Price,
    pub compare_price: Option<Price>,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub sku: Option<String>,
    pub category: Option<Category>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Default low-stock threshold used when the backend omits one.
    pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

    /// Whether stock is at or below the low-stock threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }

    /// Whether the product cannot be purchased.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock_quantity <= 0
    }

    /// The first image, used for cart lines and listings.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Category display name, if any.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// A product reference given by a user: either a numeric id or a slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductRef {
    Id(ProductId),
    Slug(String),
}

impl ProductRef {
    /// Interpret user input: all-digit strings are ids, anything else is a slug.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim().trim_matches('/');
        trimmed
            .parse::<ProductId>()
            .map_or_else(|_| Self::Slug(trimmed.to_owned()), Self::Id)
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

impl From<ProductId> for ProductRef {
    fn from(id: ProductId) -> Self {
        Self::Id(id)
    }
}

/// Generate a URL slug from a product name.
///
/// Lowercases, drops anything that is not alphanumeric, whitespace or a
/// hyphen, collapses runs of separators into one hyphen and trims hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: i64, threshold: i64) -> Product {
        Product {
            id: ProductId::new(1),
            slug: "whey".to_string(),
            name: "Whey".to_string(),
            description: String::new(),
            short_description: None,
            price: Price::from_cents(2999),
            compare_price: None,
            stock_quantity: stock,
            low_stock_threshold: threshold,
            sku: None,
            category: Some(Category::named("Protein")),
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            is_active: true,
            is_featured: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(product(10, 10).is_low_stock());
        assert!(!product(11, 10).is_low_stock());
        assert!(product(0, 10).is_out_of_stock());
    }

    #[test]
    fn test_primary_image_and_category() {
        let p = product(5, 10);
        assert_eq!(p.primary_image(), Some("a.jpg"));
        assert_eq!(p.category_name(), Some("Protein"));
    }

    #[test]
    fn test_product_ref_parse() {
        assert_eq!(ProductRef::parse("12"), ProductRef::Id(ProductId::new(12)));
        assert_eq!(
            ProductRef::parse("whey-protein"),
            ProductRef::Slug("whey-protein".to_string())
        );
        assert_eq!(ProductRef::parse("/7/"), ProductRef::Id(ProductId::new(7)));
    }

    #[test]
    fn test_category_matches_name_or_slug() {
        let category = Category {
            id: Some(CategoryId::new(3)),
            name: "Pre-Workout".to_string(),
            slug: Some("pre-workout".to_string()),
        };
        assert!(category.matches("pre-workout"));
        assert!(category.matches("PRE-WORKOUT"));
        assert!(!category.matches("protein"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Whey Protein Powder"), "whey-protein-powder");
        assert_eq!(slugify("  BCAA  (Lemon) 2kg! "), "bcaa-lemon-2kg");
        assert_eq!(slugify("pre--workout__max"), "pre-workout-max");
        assert_eq!(slugify("!!!"), "");
    }
}
