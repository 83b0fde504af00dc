//! Admin dashboard container.
//!
//! Three independent widgets: summary KPIs, recent orders and the sales
//! chart. Only the summary drives the container's `status`/`error`; a
//! failing secondary widget is logged and leaves its previous data.

use std::sync::{Arc, RwLock};

use fitsupply_core::{DashboardSummary, LoadStatus, RecentOrder, SalesPoint};
use tracing::{instrument, warn};

use super::auth::AuthStore;
use super::{read, write};
use crate::api::ApiClient;
use crate::error::ClientError;

const TOKEN_NOT_FOUND: &str = "Authentication token not found.";

/// Snapshot of the dashboard container.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub summary: Option<DashboardSummary>,
    pub recent_orders: Vec<RecentOrder>,
    pub sales_chart: Vec<SalesPoint>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

/// Outcome of loading every widget at once.
#[derive(Debug)]
pub struct WidgetResults {
    pub summary: Result<DashboardSummary, ClientError>,
    pub recent_orders: Result<Vec<RecentOrder>, ClientError>,
    pub sales_chart: Result<Vec<SalesPoint>, ClientError>,
}

/// Dashboard container handle. Cheap to clone.
#[derive(Clone)]
pub struct DashboardStore {
    inner: Arc<DashboardStoreInner>,
}

struct DashboardStoreInner {
    api: ApiClient,
    auth: AuthStore,
    state: RwLock<DashboardState>,
}

impl DashboardStore {
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthStore) -> Self {
        Self {
            inner: Arc::new(DashboardStoreInner {
                api,
                auth,
                state: RwLock::new(DashboardState::default()),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        read(&self.inner.state).clone()
    }

    /// # Errors
    ///
    /// Fails without a request when no token is held.
    #[instrument(skip(self))]
    pub async fn fetch_summary(&self) -> Result<DashboardSummary, ClientError> {
        {
            let mut state = write(&self.inner.state);
            state.status = LoadStatus::Loading;
            state.error = None;
        }

        let result = match self.inner.auth.token() {
            Some(token) => {
                self.inner
                    .api
                    .get::<DashboardSummary>("/dashboard/summary/", &[], Some(&token))
                    .await
            }
            None => Err(ClientError::MissingToken(TOKEN_NOT_FOUND)),
        };

        let mut state = write(&self.inner.state);
        match result {
            Ok(summary) => {
                state.summary = Some(summary.clone());
                state.status = LoadStatus::Succeeded;
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load dashboard summary");
                state.status = LoadStatus::Failed;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Fails without a request when no token is held. Failures do not touch
    /// the container's status.
    #[instrument(skip(self))]
    pub async fn fetch_recent_orders(&self) -> Result<Vec<RecentOrder>, ClientError> {
        let orders = self
            .authed_list::<RecentOrder>("/dashboard/recent-orders/")
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load recent orders"))?;
        write(&self.inner.state).recent_orders.clone_from(&orders);
        Ok(orders)
    }

    /// # Errors
    ///
    /// Fails without a request when no token is held. Failures do not touch
    /// the container's status.
    #[instrument(skip(self))]
    pub async fn fetch_sales_chart(&self) -> Result<Vec<SalesPoint>, ClientError> {
        let points = self
            .authed_list::<SalesPoint>("/dashboard/sales-chart/")
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load sales chart"))?;
        write(&self.inner.state).sales_chart.clone_from(&points);
        Ok(points)
    }

    /// Load all three widgets concurrently.
    pub async fn fetch_all_widgets(&self) -> WidgetResults {
        let (summary, recent_orders, sales_chart) = tokio::join!(
            self.fetch_summary(),
            self.fetch_recent_orders(),
            self.fetch_sales_chart()
        );
        WidgetResults {
            summary,
            recent_orders,
            sales_chart,
        }
    }

    /// Fetch the summary only if it has never been requested.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, if a fetch was made.
    pub async fn ensure_loaded(&self) -> Result<(), ClientError> {
        let idle = read(&self.inner.state).status.should_auto_fetch();
        if idle {
            self.fetch_summary().await?;
        }
        Ok(())
    }

    async fn authed_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, ClientError> {
        let token = self
            .inner
            .auth
            .token()
            .ok_or(ClientError::MissingToken(TOKEN_NOT_FOUND))?;
        self.inner.api.get_list(path, &[], Some(&token)).await
    }
}

impl std::fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persist::Persistence;
    use crate::storage::MemoryStorage;

    fn store() -> DashboardStore {
        let config = crate::config::ClientConfig::for_backend(
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            std::env::temp_dir(),
        );
        let api = ApiClient::new(&config).unwrap();
        let auth = AuthStore::new(
            api.clone(),
            Persistence::new(Arc::new(MemoryStorage::new())),
            None,
        );
        DashboardStore::new(api, auth)
    }

    #[tokio::test]
    async fn test_summary_without_token_fails_container() {
        let dashboard = store();
        let err = dashboard.fetch_summary().await.unwrap_err();
        assert_eq!(err.to_string(), TOKEN_NOT_FOUND);
        let state = dashboard.snapshot();
        assert_eq!(state.status, LoadStatus::Failed);
        assert_eq!(state.error.as_deref(), Some(TOKEN_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_secondary_widgets_leave_status_alone() {
        let dashboard = store();
        assert!(dashboard.fetch_recent_orders().await.is_err());
        assert!(dashboard.fetch_sales_chart().await.is_err());
        let state = dashboard.snapshot();
        assert_eq!(state.status, LoadStatus::Idle);
        assert!(state.error.is_none());
    }
}
