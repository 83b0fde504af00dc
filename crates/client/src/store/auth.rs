//! Session state: token, profile and the login / register flows.
//!
//! A session moves through three phases:
//!
//! - **Anonymous** - no token
//! - **Authenticated** - token held, profile not yet fetched
//! - **Identified** - token and profile both present
//!
//! `is_authenticated` is true only in the identified phase.

use std::sync::{Arc, RwLock};

use fitsupply_core::{LoadStatus, User};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{read, write};
use crate::api::wire::{RegisterRequest, TokenRequest, TokenResponse};
use crate::api::{ApiClient, UnauthorizedHook};
use crate::error::ClientError;
use crate::navigation::{Navigator, Route};
use crate::persist::Persistence;

const NO_ACCESS_TOKEN: &str = "No access token received from server";
const NO_PROFILE_TOKEN: &str = "No token found for fetching profile.";
const PASSWORD_MISMATCH: &str = "Passwords do not match.";

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticated,
    Identified,
}

/// Snapshot of the session container.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<SecretString>,
    pub is_authenticated: bool,
    pub status: LoadStatus,
    pub error: Option<String>,
}

impl AuthState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.user) {
            (None, _) => SessionPhase::Anonymous,
            (Some(_), None) => SessionPhase::Authenticated,
            (Some(_), Some(_)) => SessionPhase::Identified,
        }
    }

    /// Whether `token` is still the session's token.
    fn holds(&self, token: &SecretString) -> bool {
        self.token
            .as_ref()
            .is_some_and(|held| held.expose_secret() == token.expose_secret())
    }

    /// Drop every session field back to the anonymous defaults.
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a failure and drop the session.
    fn fail(&mut self, message: String) {
        self.token = None;
        self.user = None;
        self.is_authenticated = false;
        self.status = LoadStatus::Failed;
        self.error = Some(message);
    }
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    /// Client-side checks run before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` naming the first problem found.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.username.trim().is_empty() {
            return Err(ClientError::Validation("Username is required.".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ClientError::Validation(
                "A valid email address is required.".to_string(),
            ));
        }
        if self.password.expose_secret().is_empty() {
            return Err(ClientError::Validation("Password is required.".to_string()));
        }
        if self.password.expose_secret() != self.password_confirm.expose_secret() {
            return Err(ClientError::Validation(PASSWORD_MISMATCH.to_string()));
        }
        Ok(())
    }
}

/// Session container handle. Cheap to clone.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    api: ApiClient,
    persistence: Persistence,
    state: Arc<RwLock<AuthState>>,
}

impl AuthStore {
    /// Create the container, seeded with a rehydrated token.
    #[must_use]
    pub fn new(api: ApiClient, persistence: Persistence, token: Option<SecretString>) -> Self {
        let state = AuthState {
            token,
            ..AuthState::default()
        };
        Self {
            inner: Arc::new(AuthStoreInner {
                api,
                persistence,
                state: Arc::new(RwLock::new(state)),
            }),
        }
    }

    /// Build the hook that tears the session down on a 401.
    #[must_use]
    pub fn teardown_hook(&self, navigator: Arc<dyn Navigator>) -> SessionTeardown {
        SessionTeardown {
            state: Arc::clone(&self.inner.state),
            persistence: self.inner.persistence.clone(),
            navigator,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        read(&self.inner.state).clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        read(&self.inner.state).token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        read(&self.inner.state).user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        read(&self.inner.state).is_authenticated
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        read(&self.inner.state).phase()
    }

    /// Whether the identified user is staff.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        read(&self.inner.state)
            .user
            .as_ref()
            .is_some_and(|user| user.is_staff)
    }

    fn update<R>(&self, f: impl FnOnce(&mut AuthState) -> R) -> R {
        f(&mut write(&self.inner.state))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Exchange credentials for a token.
    ///
    /// Does not fetch the profile; the session is `Authenticated`, not yet
    /// `Identified`, after this succeeds.
    ///
    /// # Errors
    ///
    /// Returns the flattened backend error, or a fixed message when the
    /// response lacks an access token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), ClientError> {
        self.update(|state| {
            state.status = LoadStatus::Loading;
            state.error = None;
        });

        let body = TokenRequest {
            username,
            password: password.expose_secret(),
        };
        let result = self
            .inner
            .api
            .post::<TokenResponse, _>("/token/", &body, None)
            .await
            .and_then(|response| {
                response
                    .access
                    .filter(|access| !access.is_empty())
                    .map(SecretString::from)
                    .ok_or_else(|| ClientError::Validation(NO_ACCESS_TOKEN.to_string()))
            });

        match result {
            Ok(token) => {
                self.inner.persistence.save_token(&token);
                self.update(|state| {
                    state.token = Some(token);
                    state.user = None;
                    state.is_authenticated = false;
                    state.status = LoadStatus::Succeeded;
                    state.error = None;
                });
                info!("Login succeeded");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.inner.persistence.purge_token();
                self.update(|state| state.fail(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch the profile for the held token.
    ///
    /// # Errors
    ///
    /// Fails without a request when no token is held; otherwise returns the
    /// backend error. Any failure drops the session.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<User, ClientError> {
        let Some(token) = self.token() else {
            self.update(|state| state.fail(NO_PROFILE_TOKEN.to_string()));
            return Err(ClientError::MissingToken(NO_PROFILE_TOKEN));
        };

        self.update(|state| {
            state.status = LoadStatus::Loading;
            state.error = None;
        });

        match self.inner.api.get::<User>("/user/", &[], Some(&token)).await {
            Ok(user) => {
                debug!(user_id = %user.id, "Profile loaded");
                let applied = self.update(|state| {
                    // A logout, teardown or new login during the request wins.
                    if !state.holds(&token) {
                        return false;
                    }
                    state.user = Some(user.clone());
                    state.is_authenticated = true;
                    state.status = LoadStatus::Succeeded;
                    state.error = None;
                    true
                });
                if applied {
                    Ok(user)
                } else {
                    Err(ClientError::MissingToken(NO_PROFILE_TOKEN))
                }
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed");
                let current = self.update(|state| {
                    if !state.holds(&token) {
                        return false;
                    }
                    state.fail(e.to_string());
                    true
                });
                if current {
                    self.inner.persistence.purge_token();
                }
                Err(e)
            }
        }
    }

    /// Create an account. Does not sign in.
    ///
    /// Returns the created user when the backend echoes one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for local form problems (no request
    /// is sent), otherwise the flattened backend error.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &Registration) -> Result<Option<User>, ClientError> {
        if let Err(e) = form.validate() {
            self.update(|state| {
                state.status = LoadStatus::Failed;
                state.error = Some(e.to_string());
            });
            return Err(e);
        }

        self.update(|state| {
            state.status = LoadStatus::Loading;
            state.error = None;
        });

        let body = RegisterRequest {
            username: form.username.trim(),
            email: form.email.trim(),
            password: form.password.expose_secret(),
            password2: form.password_confirm.expose_secret(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
        };

        match self
            .inner
            .api
            .post::<Value, _>("/register/", &body, None)
            .await
        {
            Ok(payload) => {
                self.update(|state| {
                    state.status = LoadStatus::Succeeded;
                    state.error = None;
                });
                info!("Registration succeeded");
                Ok(registered_user(payload))
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.update(|state| {
                    state.status = LoadStatus::Failed;
                    state.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    /// Validate a rehydrated token by fetching the profile.
    ///
    /// Silent: a rejected token leaves an anonymous session with no error.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> SessionPhase {
        if self.token().is_none() {
            return SessionPhase::Anonymous;
        }
        match self.fetch_profile().await {
            Ok(_) => SessionPhase::Identified,
            Err(e) => {
                debug!(error = %e, "Stored session is no longer valid");
                self.inner.persistence.purge_token();
                self.update(AuthState::reset);
                SessionPhase::Anonymous
            }
        }
    }

    /// Drop the session locally. No request is sent.
    pub fn logout(&self) {
        self.inner.persistence.purge_token();
        self.update(AuthState::reset);
        info!("Logged out");
    }

    pub fn clear_error(&self) {
        self.update(|state| state.error = None);
    }

    /// Log in, then fetch the profile.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn login_and_identify(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, ClientError> {
        self.login(username, password).await?;
        self.fetch_profile().await
    }

    /// Register, then log in with the same credentials and fetch the profile.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn register_and_login(&self, form: &Registration) -> Result<User, ClientError> {
        self.register(form).await?;
        self.login_and_identify(form.username.trim(), &form.password)
            .await
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

/// Pull a user record out of a registration response, if one is present.
fn registered_user(payload: Value) -> Option<User> {
    let candidate = match payload {
        Value::Object(mut map) => map.remove("user").unwrap_or(Value::Object(map)),
        other => other,
    };
    serde_json::from_value(candidate).ok()
}

/// Clears the session after the backend rejects its token.
///
/// Runs synchronously inside the gateway and performs no network I/O.
pub struct SessionTeardown {
    state: Arc<RwLock<AuthState>>,
    persistence: Persistence,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedHook for SessionTeardown {
    fn on_unauthorized(&self) {
        write(&self.state).reset();
        self.persistence.purge_token();
        self.navigator.navigate(Route::Login);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::persist::TOKEN_KEY;
    use crate::storage::{MemoryStorage, Storage};

    fn registration(password: &str, confirm: &str) -> Registration {
        Registration {
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password: SecretString::from(password),
            password_confirm: SecretString::from(confirm),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    fn store(storage: &Arc<MemoryStorage>, token: Option<&str>) -> AuthStore {
        // Port 9 (discard) is never contacted by these tests.
        let config = crate::config::ClientConfig::for_backend(
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            std::env::temp_dir(),
        );
        let api = ApiClient::new(&config).unwrap();
        AuthStore::new(
            api,
            Persistence::new(storage.clone()),
            token.map(SecretString::from),
        )
    }

    #[test]
    fn test_phase_follows_token_and_user() {
        let mut state = AuthState::default();
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        state.token = Some(SecretString::from("t"));
        assert_eq!(state.phase(), SessionPhase::Authenticated);
        state.user = Some(serde_json::from_value(json!({"id": 1, "username": "a"})).unwrap());
        assert_eq!(state.phase(), SessionPhase::Identified);
    }

    #[test]
    fn test_holds_compares_token_values() {
        let mut state = AuthState::default();
        assert!(!state.holds(&SecretString::from("old")));
        state.token = Some(SecretString::from("new"));
        assert!(!state.holds(&SecretString::from("old")));
        assert!(state.holds(&SecretString::from("new")));
    }

    #[test]
    fn test_registration_validation() {
        assert!(registration("pw", "pw").validate().is_ok());
        let err = registration("pw", "other").validate().unwrap_err();
        assert_eq!(err.to_string(), PASSWORD_MISMATCH);
        let mut form = registration("pw", "pw");
        form.email = "nope".to_string();
        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn test_register_mismatch_sends_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let auth = store(&storage, None);
        let err = auth.register(&registration("a", "b")).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        let state = auth.snapshot();
        assert_eq!(state.status, LoadStatus::Failed);
        assert_eq!(state.error.as_deref(), Some(PASSWORD_MISMATCH));
    }

    #[tokio::test]
    async fn test_fetch_profile_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        let auth = store(&storage, None);
        let err = auth.fetch_profile().await.unwrap_err();
        assert_eq!(err.to_string(), NO_PROFILE_TOKEN);
        assert_eq!(auth.snapshot().error.as_deref(), Some(NO_PROFILE_TOKEN));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_is_anonymous() {
        let storage = Arc::new(MemoryStorage::new());
        let auth = store(&storage, None);
        assert_eq!(auth.bootstrap().await, SessionPhase::Anonymous);
        assert!(auth.snapshot().error.is_none());
    }

    #[test]
    fn test_logout_clears_state_and_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc").unwrap();
        let auth = store(&storage, Some("abc"));
        assert_eq!(auth.phase(), SessionPhase::Authenticated);
        auth.logout();
        assert_eq!(auth.phase(), SessionPhase::Anonymous);
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_teardown_hook_clears_and_redirects() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc").unwrap();
        let auth = store(&storage, Some("abc"));
        let nav = Arc::new(RecordingNavigator::new());
        let hook = auth.teardown_hook(nav.clone());

        hook.on_unauthorized();

        assert_eq!(auth.phase(), SessionPhase::Anonymous);
        assert!(auth.snapshot().error.is_none());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert_eq!(nav.routes(), vec![Route::Login]);
    }

    #[test]
    fn test_registered_user_shapes() {
        let nested = json!({"user": {"id": 5, "username": "jdoe"}, "access": "x"});
        assert_eq!(registered_user(nested).unwrap().username, "jdoe");
        let flat = json!({"id": 5, "username": "jdoe"});
        assert!(registered_user(flat).is_some());
        assert!(registered_user(json!({"message": "ok"})).is_none());
    }
}
