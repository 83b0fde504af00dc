//! Staff catalog management.

use clap::{Args, Subcommand};
use fitsupply_client::{Lookup, ProductDraft, QuickEdit, Store};
use fitsupply_core::{Category, CategoryId, Price, ProductId, ProductRef};

use super::catalog::product_table;
use super::{CommandError, emit, row};

#[derive(Subcommand)]
pub enum AdminAction {
    /// List product categories
    Categories,
    /// Inventory overview of the loaded catalog
    Stats,
    /// Create a product
    Create(ProductFields),
    /// Replace a product's fields; omitted fields keep their value
    Update {
        id: ProductId,

        #[command(flatten)]
        fields: ProductFields,
    },
    /// Change a single field
    Edit {
        id: ProductId,

        #[command(flatten)]
        edit: QuickEditArgs,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Args)]
pub struct ProductFields {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    compare_price: Option<Price>,

    #[arg(long)]
    stock: Option<i64>,

    #[arg(long)]
    description: Option<String>,

    /// Category id or name
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    sku: Option<String>,

    #[arg(long)]
    featured: bool,

    /// Hide the product from the storefront
    #[arg(long)]
    inactive: bool,
}

impl ProductFields {
    fn apply(self, mut draft: ProductDraft) -> ProductDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if self.compare_price.is_some() {
            draft.compare_price = self.compare_price;
        }
        if let Some(stock) = self.stock {
            draft.stock_quantity = stock;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(category) = self.category {
            draft.category = Some(parse_category(&category));
        }
        if self.sku.is_some() {
            draft.sku = self.sku;
        }
        draft.is_featured |= self.featured;
        if self.inactive {
            draft.is_active = false;
        }
        draft
    }
}

fn parse_category(value: &str) -> Category {
    match value.trim().parse::<CategoryId>() {
        Ok(id) => Category {
            id: Some(id),
            name: String::new(),
            slug: None,
        },
        Err(_) => Category::named(value.trim()),
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct QuickEditArgs {
    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    stock: Option<i64>,

    #[arg(long)]
    active: Option<bool>,

    #[arg(long)]
    featured: Option<bool>,
}

impl QuickEditArgs {
    fn into_edit(self) -> Option<QuickEdit> {
        self.price
            .map(QuickEdit::Price)
            .or_else(|| self.stock.map(QuickEdit::Stock))
            .or_else(|| self.active.map(QuickEdit::Active))
            .or_else(|| self.featured.map(QuickEdit::Featured))
    }
}

pub async fn run(store: &Store, action: AdminAction) -> Result<(), CommandError> {
    let admin = store.admin();
    match action {
        AdminAction::Categories => {
            let categories = admin.list_categories().await;
            if categories.is_empty() {
                return emit(&["No categories".to_string()]);
            }
            let widths = [6, 24, 24];
            let mut lines = vec![row(&["ID", "NAME", "SLUG"], &widths)];
            lines.extend(categories.iter().map(|c| {
                row(
                    &[
                        &c.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                        &c.name,
                        c.slug.as_deref().unwrap_or("-"),
                    ],
                    &widths,
                )
            }));
            emit(&lines)
        }
        AdminAction::Stats => {
            store.products().ensure_loaded().await?;
            let stats = store.products().stats();
            emit(&[
                format!("Products:        {}", stats.total),
                format!("Active:          {}", stats.active),
                format!("Featured:        {}", stats.featured),
                format!("Low stock:       {}", stats.low_stock),
                format!("Out of stock:    {}", stats.out_of_stock),
                format!("Inventory value: {}", stats.inventory_value),
            ])
        }
        AdminAction::Create(fields) => {
            if fields.name.is_none() || fields.price.is_none() {
                return Err(CommandError::Input(
                    "--name and --price are required".to_string(),
                ));
            }
            let draft = fields.apply(ProductDraft {
                is_active: true,
                ..ProductDraft::default()
            });
            let product = admin.create_product(&draft).await?;
            emit(&product_table(&[product]))
        }
        AdminAction::Update { id, fields } => {
            let Lookup::Found(existing) = store.products().fetch_one(&ProductRef::Id(id)).await?
            else {
                return Err(CommandError::Input(format!("Product not found: {id}")));
            };
            let draft = fields.apply(ProductDraft::from_product(&existing));
            let product = admin.update_product(id, &draft).await?;
            emit(&product_table(&[product]))
        }
        AdminAction::Edit { id, edit } => {
            let edit = edit
                .into_edit()
                .ok_or_else(|| CommandError::Input("Nothing to change".to_string()))?;
            let product = admin.quick_edit(id, edit).await?;
            emit(&product_table(&[product]))
        }
        AdminAction::Delete { id } => {
            admin.delete_product(id).await?;
            emit(&[format!("Deleted product {id}")])
        }
    }
}
