//! Staff dashboard widgets.

#![allow(clippy::unwrap_used)]

use fitsupply_client::ClientError;
use fitsupply_core::{LoadStatus, OrderStatus, Price};
use fitsupply_integration_tests::{CUSTOMER, STAFF, TestContext};

#[tokio::test]
async fn test_all_widgets_load_for_staff() {
    let ctx = TestContext::new().await;
    ctx.sign_in(STAFF).await;
    let dashboard = ctx.store.dashboard();

    let widgets = dashboard.fetch_all_widgets().await;
    let summary = widgets.summary.unwrap();
    assert_eq!(summary.total_sales, Price::from_cents(123_450));
    assert_eq!(summary.sales_change(), 23);
    assert_eq!(summary.orders_change(), 20);
    // Growth from a zero baseline reports 100%.
    assert_eq!(summary.customers_change(), 100);

    let recent = widgets.recent_orders.unwrap();
    assert_eq!(recent.first().unwrap().status, OrderStatus::Shipped);
    let chart = widgets.sales_chart.unwrap();
    assert_eq!(chart.len(), 2);
    assert_eq!(chart.last().unwrap().sales, Price::from_cents(9998));

    let state = dashboard.snapshot();
    assert_eq!(state.status, LoadStatus::Succeeded);
    assert!(state.error.is_none());
    assert_eq!(state.recent_orders.len(), 1);
    assert_eq!(state.sales_chart.len(), 2);
}

#[tokio::test]
async fn test_secondary_widget_failure_is_isolated() {
    let ctx = TestContext::new().await;
    ctx.sign_in(STAFF).await;
    ctx.backend.fail("/dashboard/sales-chart/");
    let dashboard = ctx.store.dashboard();

    let widgets = dashboard.fetch_all_widgets().await;
    assert!(widgets.summary.is_ok());
    assert!(widgets.recent_orders.is_ok());
    assert_eq!(widgets.sales_chart.unwrap_err().status(), Some(500));

    let state = dashboard.snapshot();
    assert_eq!(state.status, LoadStatus::Succeeded);
    assert!(state.error.is_none());
    assert!(state.sales_chart.is_empty());
}

#[tokio::test]
async fn test_recent_orders_failure_keeps_loaded_widgets() {
    let ctx = TestContext::new().await;
    ctx.sign_in(STAFF).await;
    let dashboard = ctx.store.dashboard();
    dashboard.fetch_all_widgets().await;
    let before = dashboard.snapshot();
    assert!(before.summary.is_some());
    assert_eq!(before.sales_chart.len(), 2);

    ctx.backend.fail("/dashboard/recent-orders/");
    let err = dashboard.fetch_recent_orders().await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let after = dashboard.snapshot();
    assert_eq!(after.status, LoadStatus::Succeeded);
    assert!(after.error.is_none());
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.sales_chart, before.sales_chart);
    assert_eq!(after.recent_orders, before.recent_orders);
}

#[tokio::test]
async fn test_summary_failure_marks_dashboard_failed() {
    let ctx = TestContext::new().await;
    ctx.sign_in(STAFF).await;
    ctx.backend.fail("/dashboard/summary/");
    let dashboard = ctx.store.dashboard();

    let err = dashboard.fetch_summary().await.unwrap_err();
    assert!(err.is_retryable());

    let state = dashboard.snapshot();
    assert_eq!(state.status, LoadStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("Internal server error."));
}

#[tokio::test]
async fn test_dashboard_requires_token() {
    let ctx = TestContext::new().await;
    let dashboard = ctx.store.dashboard();

    let err = dashboard.fetch_summary().await.unwrap_err();
    assert!(matches!(err, ClientError::MissingToken(_)));
    assert_eq!(
        dashboard.snapshot().error.as_deref(),
        Some("Authentication token not found.")
    );
    assert_eq!(ctx.backend.count("GET", "/dashboard/summary/"), 0);

    // ensure_loaded does not retry after a failure.
    dashboard.ensure_loaded().await.unwrap();
    assert_eq!(ctx.backend.count("GET", "/dashboard/summary/"), 0);
}

#[tokio::test]
async fn test_customer_is_forbidden_without_teardown() {
    let ctx = TestContext::new().await;
    ctx.sign_in(CUSTOMER).await;

    let widgets = ctx.store.dashboard().fetch_all_widgets().await;
    assert_eq!(widgets.summary.unwrap_err().status(), Some(403));
    assert!(ctx.navigator.routes().is_empty());
    assert!(ctx.store.auth().is_authenticated());
}
