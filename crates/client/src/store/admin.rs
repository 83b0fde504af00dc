//! Staff catalog management: categories and product CRUD.
//!
//! Every successful write refreshes the catalog container so list views
//! reflect the change.

use fitsupply_core::{Category, Price, Product, ProductId, slugify};
use secrecy::SecretString;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::auth::AuthStore;
use super::products::ProductStore;
use crate::api::wire::{CategoryWire, ProductWire, ProductWrite};
use crate::api::{ApiClient, category_write, convert_category, convert_product};
use crate::error::ClientError;

const ADMIN_AUTH_REQUIRED: &str = "Staff login required.";

/// Editable product fields.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    /// Generated from the name when blank.
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Price,
    pub compare_price: Option<Price>,
    pub stock_quantity: i64,
    pub low_stock_threshold: Option<i64>,
    pub sku: Option<String>,
    /// Written as its id when known, otherwise by name.
    pub category: Option<Category>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
}

impl ProductDraft {
    /// A draft prefilled from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            short_description: product.short_description.clone(),
            price: product.price,
            compare_price: product.compare_price,
            stock_quantity: product.stock_quantity,
            low_stock_threshold: Some(product.low_stock_threshold),
            sku: product.sku.clone(),
            category: product.category.clone(),
            images: product.images.clone(),
            is_active: product.is_active,
            is_featured: product.is_featured,
        }
    }

    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a blank name, a negative price
    /// or negative stock.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Validation("Product name is required.".to_string()));
        }
        if self.price < Price::ZERO {
            return Err(ClientError::Validation("Price cannot be negative.".to_string()));
        }
        if self.stock_quantity < 0 {
            return Err(ClientError::Validation(
                "Stock quantity cannot be negative.".to_string(),
            ));
        }
        Ok(())
    }

    fn to_wire(&self) -> ProductWrite {
        let slug = if self.slug.trim().is_empty() {
            slugify(&self.name)
        } else {
            self.slug.trim().to_owned()
        };
        ProductWrite {
            name: self.name.trim().to_owned(),
            slug,
            description: self.description.clone(),
            short_description: self.short_description.clone(),
            price: self.price.to_wire_string(),
            compare_price: self.compare_price.map(Price::to_wire_string),
            stock_quantity: self.stock_quantity,
            low_stock_threshold: self
                .low_stock_threshold
                .unwrap_or(Product::DEFAULT_LOW_STOCK_THRESHOLD),
            sku: self.sku.clone().filter(|s| !s.trim().is_empty()),
            category: self.category.as_ref().and_then(category_write),
            images: self.images.clone(),
            is_active: self.is_active,
            is_featured: self.is_featured,
        }
    }
}

/// A single-field inline edit from the product table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickEdit {
    Price(Price),
    Stock(i64),
    Active(bool),
    Featured(bool),
}

impl QuickEdit {
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a negative price or stock.
    pub fn validate(self) -> Result<(), ClientError> {
        match self {
            Self::Price(price) if price < Price::ZERO => Err(ClientError::Validation(
                "Price cannot be negative.".to_string(),
            )),
            Self::Stock(stock) if stock < 0 => Err(ClientError::Validation(
                "Stock quantity cannot be negative.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn to_patch(self) -> Value {
        match self {
            Self::Price(price) => json!({ "price": price.to_wire_string() }),
            Self::Stock(stock) => json!({ "stock_quantity": stock }),
            Self::Active(active) => json!({ "is_active": active }),
            Self::Featured(featured) => json!({ "is_featured": featured }),
        }
    }
}

/// Staff catalog service.
#[derive(Debug, Clone)]
pub struct CatalogAdmin {
    api: ApiClient,
    auth: AuthStore,
    products: ProductStore,
}

impl CatalogAdmin {
    #[must_use]
    pub const fn new(api: ApiClient, auth: AuthStore, products: ProductStore) -> Self {
        Self {
            api,
            auth,
            products,
        }
    }

    fn token(&self) -> Result<SecretString, ClientError> {
        self.auth
            .token()
            .ok_or(ClientError::MissingToken(ADMIN_AUTH_REQUIRED))
    }

    /// List categories, falling back to those seen in the loaded catalog
    /// when the endpoint is unavailable.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Vec<Category> {
        let token = self.auth.token();
        match self
            .api
            .get_list::<CategoryWire>("/categories/", &[], token.as_ref())
            .await
        {
            Ok(categories) => categories.into_iter().map(convert_category).collect(),
            Err(e) => {
                warn!(error = %e, "Category endpoint failed, using catalog categories");
                self.products.categories()
            }
        }
    }

    /// # Errors
    ///
    /// Returns validation errors before any request, or the backend error.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ClientError> {
        draft.validate()?;
        let token = self.token()?;
        let draft = self.with_category_id(draft).await;
        let wire: ProductWire = self
            .api
            .post("/products/", &draft.to_wire(), Some(&token))
            .await?;
        let product = convert_product(wire);
        info!(product_id = %product.id, "Product created");
        self.refresh().await;
        Ok(product)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any request, or the backend error.
    #[instrument(skip(self, draft))]
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ClientError> {
        draft.validate()?;
        let token = self.token()?;
        let draft = self.with_category_id(draft).await;
        let wire: ProductWire = self
            .api
            .put(&format!("/products/{id}/"), &draft.to_wire(), Some(&token))
            .await?;
        let product = convert_product(wire);
        info!(product_id = %product.id, "Product updated");
        self.refresh().await;
        Ok(product)
    }

    /// Patch a single field.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any request, or the backend error.
    #[instrument(skip(self))]
    pub async fn quick_edit(&self, id: ProductId, edit: QuickEdit) -> Result<Product, ClientError> {
        edit.validate()?;
        let token = self.token()?;
        let wire: ProductWire = self
            .api
            .patch(&format!("/products/{id}/"), &edit.to_patch(), Some(&token))
            .await?;
        self.refresh().await;
        Ok(convert_product(wire))
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ClientError> {
        let token = self.token()?;
        self.api
            .delete(&format!("/products/{id}/"), Some(&token))
            .await?;
        info!(product_id = %id, "Product deleted");
        self.refresh().await;
        Ok(())
    }

    /// Resolve a category known only by name to the backend's id. A name
    /// the backend does not list is written as is.
    async fn with_category_id(&self, draft: &ProductDraft) -> ProductDraft {
        let mut draft = draft.clone();
        if let Some(category) = draft
            .category
            .as_mut()
            .filter(|c| c.id.is_none() && !c.name.trim().is_empty())
        {
            let name = category.name.trim().to_owned();
            if let Some(known) = self
                .list_categories()
                .await
                .into_iter()
                .find(|c| c.id.is_some() && c.matches(&name))
            {
                debug!(category = %known.name, "Resolved category by name");
                *category = known;
            }
        }
        draft
    }

    /// Reload the catalog with its current filter; failures are left on
    /// the catalog container.
    async fn refresh(&self) {
        let category = self.products.snapshot().category;
        let _ = self.products.fetch_all(category.as_deref()).await;
    }
}
