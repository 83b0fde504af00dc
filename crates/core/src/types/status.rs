//! Status enums for request lifecycles and orders.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an asynchronous remote operation owned by a state container.
///
/// Every container starts in `Idle`. A fetch moves it to `Loading`, then to
/// exactly one of `Succeeded` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl LoadStatus {
    /// Whether a request is currently outstanding.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether an automatic fetch-on-open should fire.
    ///
    /// Only `Idle` qualifies; warm or failed data is left alone until the
    /// caller asks explicitly.
    #[must_use]
    pub const fn should_auto_fetch(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Order fulfilment status as reported by the backend.
///
/// Unknown values are preserved in `Other` so that a newer backend does not
/// break order listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivering,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// All statuses an admin may assign, in workflow order.
    pub const ASSIGNABLE: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivering,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivering" => Self::Delivering,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = String;

    /// Parse an admin-assignable status; free-form values are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from(s.to_owned()) {
            Self::Other(other) => Err(format!("invalid order status: {other}")),
            known => Ok(known),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_status_default_is_idle() {
        assert_eq!(LoadStatus::default(), LoadStatus::Idle);
        assert!(LoadStatus::Idle.should_auto_fetch());
        assert!(!LoadStatus::Succeeded.should_auto_fetch());
        assert!(!LoadStatus::Failed.should_auto_fetch());
    }

    #[test]
    fn test_order_status_roundtrip_known() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"shipped\"");
    }

    #[test]
    fn test_order_status_preserves_unknown() {
        let status: OrderStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, OrderStatus::Other("on_hold".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"on_hold\"");
    }

    #[test]
    fn test_order_status_from_str_rejects_unknown() {
        assert_eq!("Delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_label() {
        assert_eq!(OrderStatus::Delivering.label(), "Delivering");
    }
}
