//! Error taxonomy shared by the gateway and the state containers.
//!
//! Every variant's `Display` output is the human-readable message stored in
//! a container's `error` field, so backend payloads are flattened to a
//! single string before they are wrapped here.

use serde_json::Value;
use thiserror::Error;

use crate::storage::StorageError;

/// Fallback when an error payload carries no readable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Fallback when the payload is not an object, array or string.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Errors that can occur when talking to the FitSupply backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// No token is available for an endpoint that requires one.
    #[error("{0}")]
    MissingToken(&'static str),

    /// The backend answered 401.
    #[error("{0}")]
    Unauthorized(String),

    /// The backend answered 404.
    #[error("{0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Transport failure (connection refused, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response whose body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Client could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the caller has no valid session.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::MissingToken(_))
    }

    /// Whether retrying the same request later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Backend { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Flatten a backend error payload into one display string.
///
/// Resolution order: a bare string, then `detail`, then
/// `non_field_errors`, then every field's messages joined with spaces.
#[must_use]
pub fn flatten_error_payload(payload: &Value) -> String {
    match payload {
        Value::String(message) if !message.trim().is_empty() => message.clone(),
        Value::Object(map) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return detail.clone();
            }
            if let Some(non_field) = map.get("non_field_errors") {
                let joined = collect_messages(non_field).join(" ");
                if !joined.is_empty() {
                    return joined;
                }
            }
            let joined = map
                .values()
                .flat_map(collect_messages)
                .collect::<Vec<_>>()
                .join(" ");
            if joined.is_empty() {
                GENERIC_ERROR_MESSAGE.to_owned()
            } else {
                joined
            }
        }
        Value::Array(_) => {
            let joined = collect_messages(payload).join(" ");
            if joined.is_empty() {
                GENERIC_ERROR_MESSAGE.to_owned()
            } else {
                joined
            }
        }
        _ => UNKNOWN_ERROR_MESSAGE.to_owned(),
    }
}

/// Gather every string message nested in a field value.
fn collect_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(message) if !message.trim().is_empty() => vec![message.clone()],
        Value::Array(items) => items.iter().flat_map(collect_messages).collect(),
        Value::Object(map) => map.values().flat_map(collect_messages).collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Build the message for a failed response from its raw body.
///
/// JSON bodies are flattened; short plain-text bodies are used as-is;
/// anything else falls back to the status line.
pub(crate) fn message_from_body(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<Value>(body) {
        return flatten_error_payload(&payload);
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_owned();
    }
    status.canonical_reason().map_or_else(
        || format!("Request failed with status {}", status.as_u16()),
        |reason| format!("{reason} ({})", status.as_u16()),
    )
}
