//! Cart commands.

use clap::Subcommand;
use fitsupply_client::{Lookup, Store, Totals};
use fitsupply_core::{CartLine, ProductRef};

use super::{CommandError, emit, row};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product by id or slug
    Add {
        product: String,

        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Remove a product's line
    Remove { product_id: String },
    /// Set a line's quantity (0 removes it)
    Set { product_id: String, qty: i64 },
    /// Empty the cart
    Clear,
    /// Upload the cart to the server now
    Push,
    /// Replace the local cart with the server's copy
    Pull,
}

pub async fn run(store: &Store, action: CartAction) -> Result<(), CommandError> {
    let cart = store.cart();
    match action {
        CartAction::Show => {}
        CartAction::Add { product, qty } => {
            let reference = ProductRef::parse(&product);
            let Lookup::Found(product) = store.products().fetch_one(&reference).await? else {
                return Err(CommandError::Input(format!("Product not found: {reference}")));
            };
            if product.is_out_of_stock() {
                return Err(CommandError::Input(format!("{} is out of stock", product.name)));
            }
            cart.add_item(CartLine::from_product(&product, qty));
        }
        CartAction::Remove { product_id } => {
            if !cart.remove_item(&product_id) {
                return Err(CommandError::Input(format!("Not in cart: {product_id}")));
            }
        }
        CartAction::Set { product_id, qty } => {
            if !cart.update_quantity(&product_id, qty) {
                return Err(CommandError::Input(format!("Not in cart: {product_id}")));
            }
        }
        CartAction::Clear => cart.clear(),
        CartAction::Push => cart.push_remote().await?,
        CartAction::Pull => cart.fetch_remote().await?,
    }
    emit(&cart_summary(store))
}

const WIDTHS: [usize; 4] = [8, 32, 6, 10];

fn cart_summary(store: &Store) -> Vec<String> {
    let cart = store.cart().cart();
    if cart.is_empty() {
        return vec!["Your cart is empty".to_string()];
    }
    let mut lines = vec![row(&["ID", "NAME", "QTY", "TOTAL"], &WIDTHS)];
    lines.extend(cart.items().iter().map(|line| {
        row(
            &[
                &line.product_id,
                &line.name,
                &line.qty.to_string(),
                &line.line_total().to_string(),
            ],
            &WIDTHS,
        )
    }));

    let totals = Totals::for_cart(&cart);
    lines.push(String::new());
    lines.push(format!("Items:    {}", cart.item_count()));
    lines.push(format!("Subtotal: {}", totals.subtotal));
    lines.push(format!("Tax:      {}", totals.tax));
    lines.push(format!("Total:    {}", totals.total));
    lines
}
