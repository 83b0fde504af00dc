//! HTTP gateway to the FitSupply REST backend.
//!
//! # Architecture
//!
//! - One shared `reqwest::Client` behind a cheaply cloneable handle
//! - Bearer token passed per request, never stored in the gateway
//! - Every request carries a fresh `x-request-id`
//! - Failed responses are flattened into [`ClientError`] with a display message
//!
//! # Session teardown
//!
//! When a request that carried a token receives 401, the installed
//! [`UnauthorizedHook`] runs exactly once for that response. The hook is
//! synchronous and performs no I/O, so it cannot trigger another 401.

mod conversions;
pub mod wire;

pub use conversions::*;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, message_from_body};

use wire::ListResponse;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Callback invoked when an authenticated request is rejected with 401.
pub trait UnauthorizedHook: Send + Sync {
    fn on_unauthorized(&self);
}

/// FitSupply API client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base: Url,
    on_unauthorized: RwLock<Option<Arc<dyn UnauthorizedHook>>>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is unusable or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&format!("{}/", config.api_base()))
            .map_err(|e| ClientError::Config(format!("invalid API base: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("fitsupply-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base,
                on_unauthorized: RwLock::new(None),
            }),
        })
    }

    /// Install the 401 hook, replacing any previous one.
    pub fn set_unauthorized_hook(&self, hook: Arc<dyn UnauthorizedHook>) {
        *self
            .inner
            .on_unauthorized
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Resolve an endpoint path such as `/products/` against the API base.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the path cannot be joined.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .inner
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid endpoint {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let body = self
            .execute::<()>(Method::GET, path, query, token, None)
            .await?;
        decode(&body)
    }

    /// GET a collection that may be a bare array or a `{results}` page.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&SecretString>,
    ) -> Result<Vec<T>, ClientError> {
        let list: ListResponse<T> = self.get(path, query, token).await?;
        Ok(list.into_vec())
    }

    /// POST a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let text = self
            .execute(Method::POST, path, &[], token, Some(body))
            .await?;
        decode(&text)
    }

    /// POST a JSON body, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure or non-success status.
    pub async fn post_unit<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<(), ClientError> {
        self.execute(Method::POST, path, &[], token, Some(body))
            .await
            .map(|_| ())
    }

    /// PUT a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let text = self
            .execute(Method::PUT, path, &[], token, Some(body))
            .await?;
        decode(&text)
    }

    /// PATCH a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let text = self
            .execute(Method::PATCH, path, &[], token, Some(body))
            .await?;
        decode(&text)
    }

    /// DELETE a resource.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure or non-success status.
    pub async fn delete(&self, path: &str, token: Option<&SecretString>) -> Result<(), ClientError> {
        self.execute::<()>(Method::DELETE, path, &[], token, None)
            .await
            .map(|_| ())
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Send a request and return the body text of a success response.
    #[instrument(
        skip_all,
        fields(
            method = %method,
            path = %path,
            request_id = tracing::field::Empty,
            status = tracing::field::Empty,
        )
    )]
    async fn execute<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&SecretString>,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        let url = self.endpoint(path, query)?;
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed to send");
            ClientError::Network(e)
        })?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        let text = response.text().await?;

        if status.is_success() {
            debug!("Request succeeded");
            return Ok(text);
        }

        Err(self.parse_error(status, &text, token.is_some()))
    }

    /// Map a failed response to an error, firing the 401 hook if needed.
    fn parse_error(&self, status: StatusCode, body: &str, had_token: bool) -> ClientError {
        let message = message_from_body(status, body);
        warn!(status = status.as_u16(), message = %message, "Backend returned an error");

        match status {
            StatusCode::UNAUTHORIZED => {
                if had_token {
                    self.fire_unauthorized();
                }
                ClientError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Backend {
                status: status.as_u16(),
                message,
            },
        }
    }

    fn fire_unauthorized(&self) {
        // Clone the hook out so the lock is released before it runs.
        let hook = self
            .inner
            .on_unauthorized
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            warn!("Session rejected by backend, tearing down");
            hook.on_unauthorized();
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Decode a JSON success body. An empty body decodes as JSON `null`.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))
}
