//! Checkout: turn the cart into an order.

use clap::Args;
use fitsupply_client::{Address, CheckoutForm, Store, Totals};

use super::{CommandError, emit};

/// Shipping details. Name, email and phone default to the signed-in
/// user's profile.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    address: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    state: String,

    #[arg(long)]
    zip: String,

    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,
}

impl CheckoutArgs {
    fn into_address(self, prefill: Address) -> Address {
        Address {
            first_name: self.first_name.unwrap_or(prefill.first_name),
            last_name: self.last_name.unwrap_or(prefill.last_name),
            email: self.email.unwrap_or(prefill.email),
            phone: self.phone.unwrap_or(prefill.phone),
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip,
            country: self.country.unwrap_or(prefill.country),
        }
    }
}

pub async fn run(store: &Store, args: CheckoutArgs) -> Result<(), CommandError> {
    let prefill = store
        .auth()
        .user()
        .map_or_else(Address::default, |user| Address::for_user(&user));
    let form = CheckoutForm {
        shipping: args.into_address(prefill),
        billing: None,
    };

    // Totals are taken before placing; a successful order empties the cart.
    let totals = Totals::for_cart(&store.cart().cart());
    let order = store.orders().place_order(&form).await?;

    emit(&[
        format!("Order {} placed ({})", order.order_number, order.status.label()),
        format!("Subtotal: {}", totals.subtotal),
        format!("Shipping: {}", totals.shipping),
        format!("Tax:      {}", totals.tax),
        format!("Total:    {}", order.total_amount),
        String::new(),
        "Ship to:".to_string(),
        form.shipping.format_block(),
    ])
}
