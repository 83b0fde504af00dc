//! Session lifecycle against the mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use fitsupply_client::{ClientError, Registration, Route, SessionPhase};
use fitsupply_core::CartLine;
use fitsupply_integration_tests::{CUSTOMER, STAFF, TestContext, secret};
use secrecy::ExposeSecret;

fn registration(username: &str, password: &str, confirm: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: secret(password),
        password_confirm: secret(confirm),
        first_name: "New".to_string(),
        last_name: "Member".to_string(),
    }
}

#[tokio::test]
async fn test_sign_in_identifies_and_survives_restart() {
    let ctx = TestContext::new().await;

    let user = ctx.sign_in(CUSTOMER).await;
    assert_eq!(user.username, "jdoe");
    assert_eq!(user.display_name(), "Jane Doe");
    assert_eq!(ctx.store.auth().phase(), SessionPhase::Identified);
    assert!(ctx.store.auth().is_authenticated());

    let login = ctx.backend.requests_to("POST", "/token/");
    assert_eq!(login.len(), 1);
    assert!(login.first().unwrap().bearer.is_none());
    let profile = ctx.backend.requests_to("GET", "/user/");
    assert!(profile.first().unwrap().bearer.as_deref().unwrap().starts_with("access-jdoe-"));

    let restarted = ctx.reopen();
    assert_eq!(restarted.auth().phase(), SessionPhase::Authenticated);
    assert!(!restarted.auth().is_authenticated());
    assert_eq!(restarted.start_session().await, SessionPhase::Identified);
    assert_eq!(ctx.backend.count("GET", "/user/"), 2);
}

#[tokio::test]
async fn test_bad_credentials_surface_backend_message() {
    let ctx = TestContext::new().await;

    let err = ctx
        .store
        .sign_in("jdoe", &secret("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(
        err.to_string(),
        "No active account found with the given credentials"
    );

    let state = ctx.store.auth().snapshot();
    assert_eq!(state.phase(), SessionPhase::Anonymous);
    assert_eq!(
        state.error.as_deref(),
        Some("No active account found with the given credentials")
    );
    // The rejected request carried no token, so the session hook stays quiet.
    assert!(ctx.navigator.routes().is_empty());
    assert_eq!(ctx.backend.count("GET", "/user/"), 0);
}

#[tokio::test]
async fn test_rejected_token_tears_down_session() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;
    ctx.backend.revoke_tokens();

    let err = ctx.store.orders().list_orders().await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(ctx.navigator.routes(), vec![Route::Login]);
    assert!(ctx.store.auth().token().is_none());
    assert_eq!(ctx.store.auth().phase(), SessionPhase::Anonymous);

    // The stored token is gone too: a restart starts anonymous without
    // asking the backend.
    let restarted = ctx.reopen();
    assert_eq!(restarted.start_session().await, SessionPhase::Anonymous);
    assert_eq!(ctx.backend.count("GET", "/user/"), 1);
}

#[tokio::test]
async fn test_stale_stored_token_fails_silently() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;
    ctx.backend.revoke_tokens();

    let restarted = ctx.reopen();
    assert_eq!(restarted.start_session().await, SessionPhase::Anonymous);

    let state = restarted.auth().snapshot();
    assert!(state.token.is_none());
    assert!(state.error.is_none());
    assert_eq!(ctx.backend.count("GET", "/cart/"), 1);
}

#[tokio::test]
async fn test_register_then_sign_in() {
    let ctx = TestContext::new().await;

    let user = ctx
        .store
        .auth()
        .register_and_login(&registration("newbie", "pw-12345", "pw-12345"))
        .await
        .unwrap();
    assert_eq!(user.username, "newbie");
    assert_eq!(user.display_name(), "New Member");
    assert_eq!(ctx.store.auth().phase(), SessionPhase::Identified);
    assert_eq!(ctx.backend.count("POST", "/register/"), 1);
    assert_eq!(ctx.backend.count("POST", "/token/"), 1);
}

#[tokio::test]
async fn test_register_rejections() {
    let ctx = TestContext::new().await;

    let err = ctx
        .store
        .auth()
        .register(&registration("newbie", "pw-12345", "pw-54321"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Passwords do not match.");
    assert_eq!(ctx.backend.count("POST", "/register/"), 0);

    let err = ctx
        .store
        .auth()
        .register(&registration("jdoe", "pw-12345", "pw-12345"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("already exists"));
    assert_eq!(
        ctx.store.auth().snapshot().error.as_deref(),
        Some(err.to_string().as_str())
    );
}

#[tokio::test]
async fn test_sign_out_uploads_pending_cart() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    ctx.store
        .cart()
        .add_item(CartLine::new("1", "Whey Isolate", "49.99".parse().unwrap()));
    ctx.store.sign_out().await;

    let saved = ctx.backend.cart_of("jdoe").unwrap();
    assert_eq!(saved["items"][0]["productId"], "1");
    assert_eq!(saved["items"][0]["qty"], 1);
    assert_eq!(ctx.store.auth().phase(), SessionPhase::Anonymous);
    // Signing out keeps the local cart.
    assert_eq!(ctx.store.cart().item_count(), 1);
}

#[tokio::test]
async fn test_profile_for_replaced_session_is_discarded() {
    let ctx = TestContext::new().await;
    let auth = ctx.store.auth();
    auth.login(CUSTOMER.0, &secret(CUSTOMER.1)).await.unwrap();
    ctx.backend.delay("/user/", Duration::from_millis(300));

    let (stale, ()) = tokio::join!(auth.fetch_profile(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.logout();
        auth.login(STAFF.0, &secret(STAFF.1)).await.unwrap();
    });

    // The shopper's profile arrives after the staff login and is dropped.
    assert!(stale.is_err());
    assert!(auth.user().is_none());
    assert_eq!(auth.phase(), SessionPhase::Authenticated);
    let token = auth.token().unwrap();
    assert!(token.expose_secret().starts_with("access-admin-"));

    ctx.backend.delay("/user/", Duration::ZERO);
    let user = auth.fetch_profile().await.unwrap();
    assert_eq!(user.username, "admin");
    assert!(auth.is_authenticated());
}
