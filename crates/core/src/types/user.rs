//! Authenticated user record.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The profile returned by the backend's `/user/` endpoint.
///
/// Never persisted locally: identity is always re-derived from a fresh
/// profile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

impl User {
    /// Best display name: explicit `name`, then "first last", then username.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_owned()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_profile() {
        let user: User = serde_json::from_str(r#"{"id":1,"username":"jdoe"}"#).unwrap();
        assert!(!user.is_staff);
        assert_eq!(user.display_name(), "jdoe");
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"username":"jdoe","first_name":"Jane","last_name":"Doe","is_staff":true}"#,
        )
        .unwrap();
        assert!(user.is_staff);
        assert_eq!(user.display_name(), "Jane Doe");
    }
}
