//! Cart persistence and server synchronization.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use fitsupply_core::{CartLine, Price};
use fitsupply_integration_tests::{CUSTOMER, TestContext, eventually};
use serde_json::json;

fn whey() -> CartLine {
    CartLine::new("1", "Whey Isolate", Price::from_cents(4999))
}

fn creatine() -> CartLine {
    CartLine::new("2", "Creatine Monohydrate", Price::from_cents(1950))
}

#[tokio::test]
async fn test_anonymous_cart_is_persisted_but_never_uploaded() {
    let ctx = TestContext::new().await;

    ctx.store.cart().add_item(whey());
    ctx.store.cart().add_item(whey());
    tokio::time::sleep(Duration::from_millis(150)).await;
    ctx.store.shutdown().await;

    assert!(ctx.backend.requests_to("POST", "/cart/").is_empty());

    let restarted = ctx.reopen();
    let items = restarted.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().unwrap().qty, 2);
}

#[tokio::test]
async fn test_rapid_edits_coalesce_into_one_upload() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    let cart = ctx.store.cart();
    cart.add_item(whey());
    cart.add_item(creatine());
    cart.update_quantity("1", 3);

    assert!(eventually(|| ctx.backend.count("POST", "/cart/") == 1).await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctx.backend.count("POST", "/cart/"), 1);

    let saved = ctx.backend.cart_of("jdoe").unwrap();
    assert_eq!(
        saved,
        json!({
            "items": [
                { "productId": "1", "name": "Whey Isolate", "price": "49.99", "qty": 3 },
                { "productId": "2", "name": "Creatine Monohydrate", "price": "19.50", "qty": 1 }
            ]
        })
    );
}

#[tokio::test]
async fn test_sign_in_adopts_server_cart() {
    let ctx = TestContext::new().await;
    ctx.backend.set_cart(
        "jdoe",
        json!({
            "items": [
                { "product_id": "2", "name": "Creatine Monohydrate", "price": "19.50", "quantity": 2 },
                { "product_id": "2", "name": "Creatine Monohydrate", "price": "19.50", "quantity": 1 },
                { "product_id": "3", "name": "Shaker Bottle", "price": 9.99, "quantity": 0 }
            ]
        }),
    );

    ctx.store.cart().add_item(whey());
    ctx.sign_in(CUSTOMER).await;

    let items = ctx.store.cart().items();
    assert_eq!(items.len(), 1);
    let line = items.first().unwrap();
    assert_eq!(line.product_id, "2");
    assert_eq!(line.qty, 3);

    // Adopting the server copy is not an edit and is not uploaded back.
    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.count("POST", "/cart/"), 0);

    // The adopted cart is what a restart rehydrates.
    assert_eq!(ctx.reopen().cart().item_count(), 3);
}

#[tokio::test]
async fn test_shutdown_flushes_pending_upload() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    ctx.store.cart().add_item(creatine());
    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.count("POST", "/cart/"), 1);

    // The cancelled debounce never fires a second upload.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctx.backend.count("POST", "/cart/"), 1);

    // Nothing pending: shutdown sends nothing.
    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.count("POST", "/cart/"), 1);
}

#[tokio::test]
async fn test_clear_uploads_empty_cart() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    ctx.store.cart().add_item(whey());
    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.cart_of("jdoe").unwrap()["items"][0]["qty"], 1);

    ctx.store.cart().clear();
    ctx.store.shutdown().await;
    assert_eq!(ctx.backend.cart_of("jdoe").unwrap(), json!({ "items": [] }));
    assert!(ctx.reopen().cart().is_empty());
}

#[tokio::test]
async fn test_manual_pull_requires_session() {
    let ctx = TestContext::new().await;

    let err = ctx.store.cart().fetch_remote().await.unwrap_err();
    assert!(err.is_auth());
    assert!(ctx.backend.requests_to("GET", "/cart/").is_empty());
}
