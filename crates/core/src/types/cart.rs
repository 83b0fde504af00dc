//! Shopping cart lines and the invariants that govern them.
//!
//! A [`Cart`] holds at most one [`CartLine`] per product id and every line
//! has a quantity of at least one. All mutation goes through the methods here
//! so the invariants hold no matter where lines come from: user actions,
//! durable storage, or the server's saved copy.

use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::price::Price;

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "productId", alias = "product_id")]
    pub product_id: String,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(alias = "quantity")]
    pub qty: u32,
}

impl CartLine {
    /// Create a line for a single unit of a product.
    #[must_use]
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            image: None,
            qty: 1,
        }
    }

    /// Create a line from a catalog entry.
    #[must_use]
    pub fn from_product(product: &Product, qty: u32) -> Self {
        Self {
            product_id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().map(str::to_owned),
            qty,
        }
    }

    /// Set the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.qty
    }
}

/// The shopping cart.
///
/// Serialized as `{ "items": [...] }`, which is both the durable-storage
/// record and the server's cart payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartRecord", into = "CartRecord")]
pub struct Cart {
    items: Vec<CartLine>,
}

#[derive(Serialize, Deserialize)]
struct CartRecord {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl From<CartRecord> for Cart {
    fn from(record: CartRecord) -> Self {
        Self::from_lines(record.items)
    }
}

impl From<Cart> for CartRecord {
    fn from(cart: Cart) -> Self {
        Self { items: cart.items }
    }
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from untrusted lines, merging duplicates and dropping
    /// zero-quantity lines.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines.into_iter().filter(|line| line.qty > 0) {
            cart.add_item(line);
        }
        cart
    }

    /// The current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.qty)).sum()
    }

    /// Sum of unit price times quantity over every line.
    ///
    /// Recomputed on every call; the cart never caches totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Add a line, or increase the quantity of the existing line for the
    /// same product.
    ///
    /// A quantity of zero counts as one.
    pub fn add_item(&mut self, mut line: CartLine) {
        let qty = line.qty.max(1);
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            existing.qty = existing.qty.saturating_add(qty);
        } else {
            line.qty = qty;
            self.items.push(line);
        }
    }

    /// Remove the line for a product. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Set the quantity of an existing line; zero or negative removes it.
    ///
    /// Returns whether the cart changed. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &str, qty: i64) -> bool {
        if qty <= 0 {
            return self.remove_item(product_id);
        }
        let qty = u32::try_from(qty).unwrap_or(u32::MAX);
        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) if line.qty != qty => {
                line.qty = qty;
                true
            }
            _ => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace every line with another cart's lines.
    pub fn replace(&mut self, other: Self) {
        self.items = other.items;
    }
}
