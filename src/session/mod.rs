//! Auth session manager: the single source of truth for "who is the user".
//!
//! Session state is a tagged variant published through a `watch` channel, so
//! any number of observers can follow `Anonymous / Loading / Authenticated`
//! transitions. Navigation is injected as a capability to keep the state
//! machine testable without a browser history.

pub mod token_store;

use tokio::sync::watch;
use tracing::warn;

use crate::api::users::{Credentials, PasswordChange, ProfilePatch, RegisterRequest, RegisteredUser};
use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::types::User;

pub use token_store::TokenStore;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Substrings (lowercased) in a login failure `detail` that mean the account
/// exists but the email is not yet verified.
const UNVERIFIED_TOKENS: [&str; 3] = [
    "email is not verified",
    "account not activated",
    "verify your email",
];

/// Machine-readable code for the same condition, for backends that send one.
const UNVERIFIED_CODE: &str = "email_not_verified";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    Anonymous,
    #[default]
    Loading,
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Side-effecting navigation, passed in by the caller. The debug CLI logs
/// the target; a UI would drive its router; tests record it.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that drops the redirect, for flows that don't need one.
pub struct NoNavigation;

impl Navigator for NoNavigation {
    fn navigate(&self, _path: &str) {}
}

#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// `no_redirect` was set: the created resource is returned so the caller
    /// can drive email verification. The session stays anonymous.
    Created(RegisteredUser),
    /// Registration rolled straight into a login.
    LoggedIn(User),
}

pub struct SessionManager {
    api: ApiClient,
    tokens: TokenStore,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create the manager and seed the API client with any persisted token.
    /// State starts as `Loading` until the first `check_logged_in` resolves.
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        if let Some(token) = tokens.load() {
            api.set_token(Some(token));
        }
        let (state, _) = watch::channel(SessionState::Loading);
        Self { api, tokens, state }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Subscribe to session state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Probe the current-user endpoint. Success authenticates the session;
    /// a 401 means anonymous (and the stale token is dropped); any other
    /// failure leaves the previous state intact and propagates.
    pub async fn check_logged_in(&self) -> Result<Option<User>> {
        match self.api.current_user().await {
            Ok(user) => {
                self.state.send_replace(SessionState::Authenticated(user.clone()));
                Ok(Some(user))
            }
            Err(err) if err.status() == Some(401) => {
                self.api.set_token(None);
                if let Err(e) = self.tokens.clear() {
                    warn!("failed to clear stale token: {}", e);
                }
                self.state.send_replace(SessionState::Anonymous);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Log in: mint a token, persist it, fetch the user, authenticate, and
    /// navigate to `redirect` (default `/`). An unverified account surfaces
    /// as `Error::EmailNotVerified` so the caller can switch to the
    /// verification flow instead of showing an error banner.
    pub async fn login(
        &self,
        credentials: &Credentials,
        navigator: &dyn Navigator,
        redirect: Option<&str>,
    ) -> Result<User> {
        let pair = self
            .api
            .create_token(credentials)
            .await
            .map_err(map_unverified)?;

        self.api.set_token(Some(pair.access.clone()));
        if let Err(e) = self.tokens.save(&pair.access) {
            warn!("failed to persist access token: {}", e);
        }

        let user = self.api.current_user().await?;
        self.state.send_replace(SessionState::Authenticated(user.clone()));
        navigator.navigate(redirect.unwrap_or("/"));
        Ok(user)
    }

    /// Register. With `no_redirect` the created resource is returned and the
    /// session stays anonymous; otherwise this behaves like a login.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        no_redirect: bool,
        navigator: &dyn Navigator,
    ) -> Result<RegisterOutcome> {
        let created = self.api.register(request).await?;
        if no_redirect {
            return Ok(RegisterOutcome::Created(created));
        }
        let credentials = Credentials {
            username: request.username.clone(),
            password: request.password.clone(),
        };
        let user = self.login(&credentials, navigator, None).await?;
        Ok(RegisterOutcome::LoggedIn(user))
    }

    /// Discard the token and user; the session goes anonymous.
    pub fn logout(&self) {
        self.api.set_token(None);
        if let Err(e) = self.tokens.clear() {
            warn!("failed to clear persisted token: {}", e);
        }
        self.state.send_replace(SessionState::Anonymous);
    }

    /// Update the profile and refresh the cached user on success.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<User> {
        let user = self.api.update_profile(patch).await?;
        self.state.send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Change the password. Mismatched or too-short new passwords are
    /// rejected locally before any network call.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        if change.new_password != change.re_new_password {
            return Err(Error::PasswordMismatch);
        }
        if change.new_password.len() < MIN_PASSWORD_LEN {
            return Err(Error::WeakPassword(MIN_PASSWORD_LEN));
        }
        self.api.set_password(change).await
    }

    /// Request a password reset email. The address is validated locally
    /// first; malformed addresses never reach the network.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        if !crate::activation::is_valid_email(email) {
            return Err(Error::InvalidEmail);
        }
        self.api.reset_password(email).await
    }
}

/// Map a login failure to `EmailNotVerified` when the backend says the
/// account exists but is not activated, either via a machine-readable code
/// or the known human-readable detail strings.
fn map_unverified(err: Error) -> Error {
    if let Some(api) = err.as_api() {
        if api.code() == Some(UNVERIFIED_CODE) {
            return Error::EmailNotVerified;
        }
        if let Some(detail) = api.detail() {
            let lowered = detail.to_lowercase();
            if UNVERIFIED_TOKENS.iter().any(|t| lowered.contains(t)) {
                return Error::EmailNotVerified;
            }
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn api_error(body: &str) -> Error {
        Error::Api(ApiError::from_body(401, body))
    }

    #[test]
    fn detail_substring_maps_to_email_not_verified() {
        for detail in [
            "Email is not verified",
            "Account not activated yet",
            "Please verify your email before logging in",
        ] {
            let err = api_error(&format!(r#"{{"detail":"{}"}}"#, detail));
            assert!(matches!(map_unverified(err), Error::EmailNotVerified));
        }
    }

    #[test]
    fn machine_readable_code_maps_too() {
        let err = api_error(r#"{"detail":"No","code":"email_not_verified"}"#);
        assert!(matches!(map_unverified(err), Error::EmailNotVerified));
    }

    #[test]
    fn other_failures_pass_through() {
        let err = api_error(r#"{"detail":"Invalid credentials"}"#);
        match map_unverified(err) {
            Error::Api(api) => assert_eq!(api.detail(), Some("Invalid credentials")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn state_helpers() {
        assert!(SessionState::Loading.is_loading());
        assert!(!SessionState::Anonymous.is_authenticated());
        assert!(SessionState::Anonymous.user().is_none());
    }

    #[tokio::test]
    async fn change_password_rejects_mismatch_locally() {
        let tmp = tempfile::tempdir().unwrap();
        let session = SessionManager::new(
            ApiClient::new("http://127.0.0.1:9"),
            TokenStore::new(tmp.path().join("token")),
        );
        let change = PasswordChange {
            current_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
            re_new_password: "different".to_string(),
        };
        assert!(matches!(
            session.change_password(&change).await,
            Err(Error::PasswordMismatch)
        ));
    }

    #[tokio::test]
    async fn change_password_rejects_short_password_locally() {
        let tmp = tempfile::tempdir().unwrap();
        let session = SessionManager::new(
            ApiClient::new("http://127.0.0.1:9"),
            TokenStore::new(tmp.path().join("token")),
        );
        let change = PasswordChange {
            current_password: "old-password".to_string(),
            new_password: "short".to_string(),
            re_new_password: "short".to_string(),
        };
        assert!(matches!(
            session.change_password(&change).await,
            Err(Error::WeakPassword(8))
        ));
    }

    #[tokio::test]
    async fn password_reset_rejects_malformed_email_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        // Unroutable API: the call would fail if it reached the network.
        let session = SessionManager::new(
            ApiClient::new("http://127.0.0.1:9"),
            TokenStore::new(tmp.path().join("token")),
        );
        assert!(matches!(
            session.request_password_reset("x@").await,
            Err(Error::InvalidEmail)
        ));
    }

    #[test]
    fn persisted_token_seeds_api_client() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokenStore::new(tmp.path().join("token"));
        store.save("persisted-token").unwrap();

        let api = ApiClient::new("http://127.0.0.1:9");
        let _session = SessionManager::new(api.clone(), store);
        assert_eq!(api.token().as_deref(), Some("persisted-token"));
    }

    #[test]
    fn logout_clears_token_and_goes_anonymous() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokenStore::new(tmp.path().join("token"));
        store.save("tok").unwrap();

        let api = ApiClient::new("http://127.0.0.1:9");
        let session = SessionManager::new(api.clone(), store.clone());
        session.logout();

        assert!(api.token().is_none());
        assert!(store.load().is_none());
        assert_eq!(session.state(), SessionState::Anonymous);
    }
}
