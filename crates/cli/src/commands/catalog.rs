//! Catalog browsing.

use clap::Subcommand;
use fitsupply_client::{Lookup, ProductFilter, StockFilter, Store};
use fitsupply_core::{Product, ProductRef};

use super::{CommandError, emit, row};

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products
    List {
        /// Category name or slug (filtered by the server)
        #[arg(short, long)]
        category: Option<String>,

        /// Match name, description or SKU
        #[arg(short, long)]
        search: Option<String>,

        /// all, active, inactive, featured, low-stock, out-of-stock
        #[arg(long, default_value = "all")]
        stock: StockFilter,
    },
    /// Show one product by id or slug
    Show { product: String },
}

pub async fn run(store: &Store, action: ProductsAction) -> Result<(), CommandError> {
    match action {
        ProductsAction::List {
            category,
            search,
            stock,
        } => {
            store.products().fetch_all(category.as_deref()).await?;
            let filter = ProductFilter {
                term: search.unwrap_or_default(),
                category: None,
                stock,
            };
            let products = store.products().search(&filter);
            emit(&product_table(&products))
        }
        ProductsAction::Show { product } => {
            let reference = ProductRef::parse(&product);
            match store.products().fetch_one(&reference).await? {
                Lookup::Found(product) => emit(&product_detail(&product)),
                Lookup::NotFound => Err(CommandError::Input(format!(
                    "Product not found: {reference}"
                ))),
            }
        }
    }
}

const WIDTHS: [usize; 5] = [6, 32, 10, 8, 16];

pub(crate) fn product_table(products: &[Product]) -> Vec<String> {
    if products.is_empty() {
        return vec!["No products found".to_string()];
    }
    let mut lines = vec![row(&["ID", "NAME", "PRICE", "STOCK", "CATEGORY"], &WIDTHS)];
    lines.extend(products.iter().map(|p| {
        let stock = if p.is_out_of_stock() {
            "out".to_string()
        } else if p.is_low_stock() {
            format!("{} low", p.stock_quantity)
        } else {
            p.stock_quantity.to_string()
        };
        row(
            &[
                &p.id.to_string(),
                &p.name,
                &p.price.to_string(),
                &stock,
                p.category_name().unwrap_or("-"),
            ],
            &WIDTHS,
        )
    }));
    lines
}

fn product_detail(product: &Product) -> Vec<String> {
    let mut lines = vec![
        format!("{} (#{}, {})", product.name, product.id, product.slug),
        format!("Price: {}", product.price),
    ];
    if let Some(compare) = product.compare_price.filter(|c| *c > product.price) {
        lines.push(format!("Was: {compare}"));
    }
    lines.push(format!("Stock: {}", product.stock_quantity));
    if let Some(category) = product.category_name() {
        lines.push(format!("Category: {category}"));
    }
    if let Some(sku) = &product.sku {
        lines.push(format!("SKU: {sku}"));
    }
    if let Some(image) = product.primary_image() {
        lines.push(format!("Image: {image}"));
    }
    if !product.description.is_empty() {
        lines.push(String::new());
        lines.push(product.description.clone());
    }
    lines
}
