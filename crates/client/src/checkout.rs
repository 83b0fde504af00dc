//! Checkout form, totals and the order payload built from a cart.

use fitsupply_core::{Cart, Price, User};

use crate::api::wire::{OrderCreateRequest, OrderLineRequest};
use crate::error::ClientError;

/// Sales tax applied to the subtotal, in percent.
pub const TAX_RATE_PERCENT: u32 = 8;

/// Payment method reported to the backend.
pub const PAYMENT_METHOD: &str = "credit_card";

const DEFAULT_COUNTRY: &str = "United States";

/// A postal address with contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_owned(),
        }
    }
}

impl Address {
    /// An address prefilled with the user's name and email.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ClientError::Validation` listing the missing fields.
    pub fn validate(&self) -> Result<(), ClientError> {
        let required = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("ZIP code", &self.zip_code),
            ("country", &self.country),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();
        if !missing.is_empty() {
            return Err(ClientError::Validation(format!(
                "Please fill in: {}.",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(ClientError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }
        Ok(())
    }

    /// Four-line block: name, street, "city, state zip", country.
    #[must_use]
    pub fn format_block(&self) -> String {
        format!(
            "{} {}\n{}\n{}, {} {}\n{}",
            self.first_name.trim(),
            self.last_name.trim(),
            self.address.trim(),
            self.city.trim(),
            self.state.trim(),
            self.zip_code.trim(),
            self.country.trim()
        )
    }
}

/// Everything the shopper enters at checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub shipping: Address,
    /// `None` bills to the shipping address.
    pub billing: Option<Address>,
}

impl CheckoutForm {
    /// # Errors
    ///
    /// Returns the first address validation failure.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.shipping.validate()?;
        if let Some(billing) = &self.billing {
            billing.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn billing_address(&self) -> &Address {
        self.billing.as_ref().unwrap_or(&self.shipping)
    }
}

/// Order totals derived from a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl Totals {
    /// Free shipping, flat tax on the subtotal, rounded to cents.
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        let subtotal = cart.subtotal();
        let shipping = Price::ZERO;
        let tax = subtotal.percent(TAX_RATE_PERCENT).round_cents();
        Self {
            subtotal,
            shipping,
            tax,
            total: (subtotal + shipping + tax).round_cents(),
        }
    }
}

/// Build the `POST /orders/` body from a cart and a validated form.
///
/// # Errors
///
/// Returns `ClientError::Validation` for an empty cart or invalid form.
pub fn build_order_request(
    cart: &Cart,
    form: &CheckoutForm,
) -> Result<OrderCreateRequest, ClientError> {
    if cart.is_empty() {
        return Err(ClientError::Validation("Your cart is empty.".to_string()));
    }
    form.validate()?;

    let totals = Totals::for_cart(cart);
    let phone = form.shipping.phone.trim();

    Ok(OrderCreateRequest {
        items: cart
            .items()
            .iter()
            .map(|line| OrderLineRequest {
                product_id: line.product_id.clone(),
                quantity: line.qty,
                price: line.price.to_wire_string(),
            })
            .collect(),
        shipping_address: form.shipping.format_block(),
        billing_address: form.billing_address().format_block(),
        payment_method: PAYMENT_METHOD.to_owned(),
        total_amount: totals.total.to_wire_string(),
        notes: if phone.is_empty() {
            String::new()
        } else {
            format!("Phone: {phone}")
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitsupply_core::CartLine;

    use super::*;

    fn address() -> Address {
        Address {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "73301".to_string(),
            ..Address::default()
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(CartLine::new("7", "Whey", Price::from_cents(2999)).with_quantity(2));
        cart.add_item(CartLine::new("9", "Shaker", Price::from_cents(999)));
        cart
    }

    #[test]
    fn test_totals() {
        let totals = Totals::for_cart(&cart());
        assert_eq!(totals.subtotal, Price::from_cents(6997));
        // 8% of 69.97 = 5.5976
        assert_eq!(totals.tax, Price::from_cents(560));
        assert_eq!(totals.total, Price::from_cents(7557));
    }

    #[test]
    fn test_address_block() {
        assert_eq!(
            address().format_block(),
            "Jane Doe\n1 Main St\nAustin, TX 73301\nUnited States"
        );
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let mut a = address();
        a.city.clear();
        a.zip_code = "  ".to_string();
        let err = a.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: city, ZIP code.");
    }

    #[test]
    fn test_build_order_request() {
        let form = CheckoutForm {
            shipping: address(),
            billing: None,
        };
        let req = build_order_request(&cart(), &form).unwrap();
        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items.first().unwrap().price, "29.99");
        assert_eq!(req.items.first().unwrap().quantity, 2);
        assert_eq!(req.billing_address, req.shipping_address);
        assert_eq!(req.payment_method, "credit_card");
        assert_eq!(req.total_amount, "75.57");
        assert_eq!(req.notes, "Phone: 555-0100");
    }

    #[test]
    fn test_empty_cart_rejected() {
        let form = CheckoutForm {
            shipping: address(),
            billing: None,
        };
        let err = build_order_request(&Cart::new(), &form).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
