//! Catalog container: product list, single-product lookup and local
//! filtering.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use fitsupply_core::{Category, LoadStatus, Price, Product, ProductRef};
use tracing::{debug, instrument, warn};

use super::{read, write};
use crate::api::wire::{OneOrMany, ProductWire};
use crate::api::{ApiClient, convert_product};
use crate::error::ClientError;

const PRODUCTS_PATH: &str = "/products/";

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// Snapshot of the catalog container.
#[derive(Debug, Clone, Default)]
pub struct ProductState {
    pub items: Vec<Product>,
    pub status: LoadStatus,
    pub error: Option<String>,
    /// Category filter used by the last list fetch.
    pub category: Option<String>,
    pub selected: Option<Lookup<Product>>,
    pub selected_status: LoadStatus,
    pub selected_error: Option<String>,
}

/// Stock facet for admin filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockFilter {
    #[default]
    All,
    Active,
    Inactive,
    Featured,
    LowStock,
    OutOfStock,
}

impl StockFilter {
    fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Active => product.is_active,
            Self::Inactive => !product.is_active,
            Self::Featured => product.is_featured,
            Self::LowStock => product.is_low_stock(),
            Self::OutOfStock => product.is_out_of_stock(),
        }
    }
}

impl std::str::FromStr for StockFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all" | "" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "featured" => Ok(Self::Featured),
            "low-stock" => Ok(Self::LowStock),
            "out-of-stock" => Ok(Self::OutOfStock),
            other => Err(format!("unknown stock filter: {other}")),
        }
    }
}

/// Local search over the loaded catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Matched against name, description and SKU, case-insensitively.
    pub term: String,
    pub category: Option<String>,
    pub stock: StockFilter,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let term = self.term.trim().to_lowercase();
        let term_ok = term.is_empty()
            || product.name.to_lowercase().contains(&term)
            || product.description.to_lowercase().contains(&term)
            || product
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&term));
        let category_ok = self.category.as_deref().is_none_or(|filter| {
            product
                .category
                .as_ref()
                .is_some_and(|category| category.matches(filter))
        });
        term_ok && category_ok && self.stock.matches(product)
    }
}

/// Aggregate figures over the loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub featured: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    /// Sum of `price * stock` over products with positive stock.
    pub inventory_value: Price,
}

/// Catalog container handle. Cheap to clone.
#[derive(Clone)]
pub struct ProductStore {
    inner: Arc<ProductStoreInner>,
}

struct ProductStoreInner {
    api: ApiClient,
    state: RwLock<ProductState>,
}

impl ProductStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(ProductStoreInner {
                api,
                state: RwLock::new(ProductState::default()),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProductState {
        read(&self.inner.state).clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        read(&self.inner.state).items.clone()
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        read(&self.inner.state).status
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Load the catalog, optionally filtered by category name or slug.
    ///
    /// Overlapping calls are not cancelled; whichever response arrives last
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns the backend error; previously loaded items are kept.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, category: Option<&str>) -> Result<Vec<Product>, ClientError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        {
            let mut state = write(&self.inner.state);
            state.status = LoadStatus::Loading;
            state.error = None;
        }

        let query: Vec<(&str, &str)> = category.iter().map(|c| ("category", *c)).collect();
        let result = self
            .inner
            .api
            .get_list::<ProductWire>(PRODUCTS_PATH, &query, None)
            .await;

        let mut state = write(&self.inner.state);
        match result {
            Ok(wire) => {
                let products: Vec<Product> = wire.into_iter().map(convert_product).collect();
                debug!(count = products.len(), "Loaded products");
                state.items.clone_from(&products);
                state.category = category.map(str::to_owned);
                state.status = LoadStatus::Succeeded;
                state.error = None;
                Ok(products)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                state.status = LoadStatus::Failed;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the full catalog only if it has never been requested.
    ///
    /// # Errors
    ///
    /// Returns the backend error from the fetch, if one was made.
    pub async fn ensure_loaded(&self) -> Result<(), ClientError> {
        if self.status().should_auto_fetch() {
            self.fetch_all(None).await?;
        }
        Ok(())
    }

    /// Look up one product by id or slug.
    ///
    /// Ids use the detail endpoint. Slugs use the list endpoint filtered by
    /// `slug`; if the backend ignores the filter, the detail endpoint is
    /// tried with the slug as the key.
    ///
    /// # Errors
    ///
    /// Returns backend errors other than "not found".
    #[instrument(skip(self), fields(product = %reference))]
    pub async fn fetch_one(&self, reference: &ProductRef) -> Result<Lookup<Product>, ClientError> {
        {
            let mut state = write(&self.inner.state);
            state.selected_status = LoadStatus::Loading;
            state.selected_error = None;
        }

        let result = match reference {
            ProductRef::Id(id) => self.fetch_detail(&id.to_string()).await,
            ProductRef::Slug(slug) => self.fetch_by_slug(slug).await,
        };

        let mut state = write(&self.inner.state);
        match result {
            Ok(lookup) => {
                state.selected = Some(lookup.clone());
                state.selected_status = LoadStatus::Succeeded;
                Ok(lookup)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load product");
                state.selected_status = LoadStatus::Failed;
                state.selected_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_detail(&self, key: &str) -> Result<Lookup<Product>, ClientError> {
        let path = format!("{PRODUCTS_PATH}{key}/");
        match self.inner.api.get::<ProductWire>(&path, &[], None).await {
            Ok(wire) => Ok(Lookup::Found(convert_product(wire))),
            Err(ClientError::NotFound(_)) => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Lookup<Product>, ClientError> {
        let matches: OneOrMany<ProductWire> = self
            .inner
            .api
            .get(PRODUCTS_PATH, &[("slug", slug)], None)
            .await?;
        let candidates = matches.into_vec();
        if candidates.is_empty() {
            return Ok(Lookup::NotFound);
        }
        if let Some(wire) = candidates.into_iter().find(|p| p.slug == slug) {
            return Ok(Lookup::Found(convert_product(wire)));
        }
        debug!("Slug filter ignored by backend, trying detail lookup");
        self.fetch_detail(slug).await
    }

    // =========================================================================
    // Local queries
    // =========================================================================

    /// Loaded products in a category (by name or slug).
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Product> {
        self.search(&ProductFilter {
            category: Some(category.to_owned()),
            ..ProductFilter::default()
        })
    }

    #[must_use]
    pub fn search(&self, filter: &ProductFilter) -> Vec<Product> {
        read(&self.inner.state)
            .items
            .iter()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect()
    }

    /// Distinct categories present in the loaded catalog, sorted by name.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        let state = read(&self.inner.state);
        let unique: BTreeMap<String, Category> = state
            .items
            .iter()
            .filter_map(|product| product.category.clone())
            .map(|category| (category.name.to_lowercase(), category))
            .collect();
        unique.into_values().collect()
    }

    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let state = read(&self.inner.state);
        let items = &state.items;
        CatalogStats {
            total: items.len(),
            active: items.iter().filter(|p| p.is_active).count(),
            featured: items.iter().filter(|p| p.is_featured).count(),
            low_stock: items.iter().filter(|p| p.is_low_stock()).count(),
            out_of_stock: items.iter().filter(|p| p.is_out_of_stock()).count(),
            inventory_value: items
                .iter()
                .filter_map(|p| {
                    u32::try_from(p.stock_quantity)
                        .ok()
                        .map(|stock| p.price * stock)
                })
                .sum(),
        }
    }

    #[cfg(test)]
    fn seed(&self, items: Vec<Product>) {
        let mut state = write(&self.inner.state);
        state.items = items;
        state.status = LoadStatus::Succeeded;
    }
}

impl std::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
