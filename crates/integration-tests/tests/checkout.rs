//! Checkout, order history and status updates.

#![allow(clippy::unwrap_used)]

use fitsupply_client::{Address, CheckoutForm, ClientError, Lookup, Totals};
use fitsupply_core::{CartLine, OrderStatus, Price, ProductRef};
use fitsupply_integration_tests::{CUSTOMER, STAFF, TestContext};
use serde_json::json;

fn shipping_for(ctx: &TestContext) -> Address {
    let user = ctx.store.auth().user().unwrap();
    Address {
        address: "1 Main St".to_string(),
        city: "Austin".to_string(),
        state: "TX".to_string(),
        zip_code: "73301".to_string(),
        ..Address::for_user(&user)
    }
}

async fn fill_cart(ctx: &TestContext) {
    let whey = ctx
        .store
        .products()
        .fetch_one(&ProductRef::parse("whey-isolate"))
        .await
        .unwrap()
        .found()
        .unwrap();
    ctx.store.cart().add_item(CartLine::from_product(&whey, 2));
}

#[tokio::test]
async fn test_place_order_submits_cart_and_empties_it() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;
    fill_cart(&ctx).await;

    let totals = Totals::for_cart(&ctx.store.cart().cart());
    assert_eq!(totals.subtotal, Price::from_cents(9998));
    assert_eq!(totals.tax, Price::from_cents(800));
    assert_eq!(totals.total, Price::from_cents(10798));

    let form = CheckoutForm {
        shipping: shipping_for(&ctx),
        billing: None,
    };
    let order = ctx.store.orders().place_order(&form).await.unwrap();
    assert_eq!(order.order_number, "FS-00001");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, totals.total);
    assert_eq!(order.customer_name(), "Jane Doe");

    let item = order.items.first().unwrap();
    assert_eq!(item.product_name, "Whey Isolate");
    assert_eq!(item.quantity, 2);
    // The backend omits line subtotals; they are derived.
    assert_eq!(item.subtotal, Price::from_cents(9998));

    let stored = ctx.backend.state().orders.first().cloned().unwrap();
    assert_eq!(stored["total_amount"], "107.98");
    assert_eq!(stored["payment_method"], "credit_card");
    assert_eq!(stored["notes"], "Phone: 555-0100");
    assert_eq!(
        stored["shipping_address"],
        "Jane Doe\n1 Main St\nAustin, TX 73301\nUnited States"
    );
    assert_eq!(stored["billing_address"], stored["shipping_address"]);

    assert!(ctx.store.cart().is_empty());
    assert_eq!(
        ctx.store.orders().snapshot().last_placed.unwrap().order_number,
        "FS-00001"
    );

    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.cart_of("jdoe").unwrap(), json!({ "items": [] }));
}

#[tokio::test]
async fn test_empty_cart_is_rejected_without_request() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    let form = CheckoutForm {
        shipping: shipping_for(&ctx),
        billing: None,
    };
    let err = ctx.store.orders().place_order(&form).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(err.to_string(), "Your cart is empty.");
    assert_eq!(ctx.backend.count("POST", "/orders/"), 0);
}

#[tokio::test]
async fn test_incomplete_address_keeps_cart() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;
    fill_cart(&ctx).await;

    let form = CheckoutForm {
        shipping: Address {
            city: String::new(),
            zip_code: " ".to_string(),
            ..shipping_for(&ctx)
        },
        billing: None,
    };
    let err = ctx.store.orders().place_order(&form).await.unwrap_err();
    assert_eq!(err.to_string(), "Please fill in: city, ZIP code.");
    assert_eq!(ctx.backend.count("POST", "/orders/"), 0);
    assert_eq!(ctx.store.cart().item_count(), 2);
}

#[tokio::test]
async fn test_order_history_and_search() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    assert!(matches!(
        ctx.store.orders().latest_order().await.unwrap(),
        Lookup::NotFound
    ));

    fill_cart(&ctx).await;
    let form = CheckoutForm {
        shipping: shipping_for(&ctx),
        billing: None,
    };
    ctx.store.orders().place_order(&form).await.unwrap();
    ctx.store
        .cart()
        .add_item(CartLine::new("2", "Creatine Monohydrate", Price::from_cents(1950)));
    ctx.store.orders().place_order(&form).await.unwrap();

    let orders = ctx.store.orders();
    let history = orders.list_orders().await.unwrap();
    assert_eq!(history.len(), 2);
    let latest = orders.latest_order().await.unwrap().found().unwrap();
    assert_eq!(latest.order_number, "FS-00002");

    assert_eq!(orders.filter("fs-00002", None).len(), 1);
    assert_eq!(orders.filter("JANE", None).len(), 2);
    assert_eq!(orders.filter("", Some(&OrderStatus::Pending)).len(), 2);
    assert!(orders.filter("", Some(&OrderStatus::Shipped)).is_empty());
}

#[tokio::test]
async fn test_staff_updates_order_status() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;
    fill_cart(&ctx).await;
    let form = CheckoutForm {
        shipping: shipping_for(&ctx),
        billing: None,
    };
    let placed = ctx.store.orders().place_order(&form).await.unwrap();

    // A shopper may not change status.
    let err = ctx
        .store
        .orders()
        .update_order_status(placed.id, &OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    ctx.store.sign_out().await;
    ctx.sign_in(STAFF).await;

    let orders = ctx.store.orders();
    assert_eq!(orders.list_orders().await.unwrap().len(), 1);
    let updated = orders
        .update_order_status(placed.id, &OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);
    assert_eq!(
        orders.snapshot().orders.first().unwrap().status,
        OrderStatus::Shipped
    );
    assert_eq!(
        ctx.backend.state().orders.first().unwrap()["status"],
        "shipped"
    );
}
