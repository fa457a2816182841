//! The single source of truth for who is signed in.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::record::AuthResponse;
use super::{
    Credentials,
    SessionError,
    SessionRecord,
    SignupDetails,
    persist,
};
use crate::api::{
    ApiClient,
    ApiError,
};
use crate::storage::KeyValueStore;

/// Holds the current [`SessionRecord`] and keeps storage in step with it.
///
/// Two states only: anonymous and authenticated. Every transition replaces
/// the whole record and then persists it (or removes the persisted entry).
#[derive(Debug)]
pub struct SessionHolder {
    /// Current record; also the change feed for subscribers
    record: watch::Sender<SessionRecord>,
    /// Persistence backend
    store: Arc<dyn KeyValueStore>,
    /// Key the record is stored under
    storage_key: String,
    /// Remote API for login/signup
    api: Arc<ApiClient>,
}

impl SessionHolder {
    /// Starts anonymous; call [`Self::rehydrate`] to pick up a stored session.
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        let (record, _) = watch::channel(SessionRecord::anonymous());
        Self { record, store, storage_key: storage_key.into(), api }
    }

    /// Replaces the in-memory record with the persisted one. Returns whether
    /// the restored session is authenticated.
    pub fn rehydrate(&self) -> bool {
        let restored = persist::load(self.store.as_ref(), &self.storage_key);
        let authenticated = restored.is_authenticated();
        self.record.send_replace(restored);
        tracing::debug!(authenticated, "Session rehydrated");
        authenticated
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    /// - [`SessionError::Invalid`] before any request when fields are missing
    /// - [`SessionError::Authentication`] on a non-2xx response
    /// - [`SessionError::Api`] on transport or malformed-response failures
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionRecord, SessionError> {
        credentials.validate().map_err(SessionError::Invalid)?;
        let response = self.authenticate("/auth/login", credentials).await?;
        tracing::info!("Logged in");
        Ok(self.establish(response))
    }

    /// `POST /auth/signup`. Same error contract as [`Self::login`].
    pub async fn signup(&self, details: &SignupDetails) -> Result<SessionRecord, SessionError> {
        details.validate().map_err(SessionError::Invalid)?;
        let response = self.authenticate("/auth/signup", details).await?;
        tracing::info!("Signed up");
        Ok(self.establish(response))
    }

    /// Drops the session locally. No request is made.
    pub fn logout(&self) {
        tracing::info!("Logged out");
        self.clear();
    }

    /// Resets to anonymous and removes the persisted record, e.g. after the
    /// API answered 401.
    pub fn clear(&self) {
        self.replace(SessionRecord::anonymous());
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.record.borrow().is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.record.borrow().token().map(str::to_owned)
    }

    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.record.borrow().user().cloned()
    }

    /// Snapshot of the current record.
    #[must_use]
    pub fn record(&self) -> SessionRecord {
        self.record.borrow().clone()
    }

    /// Token for an authenticated call.
    ///
    /// # Errors
    /// [`ApiError::NotAuthenticated`] while anonymous.
    pub fn require_token(&self) -> Result<String, ApiError> {
        self.token().ok_or(ApiError::NotAuthenticated)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionRecord> {
        self.record.subscribe()
    }

    /// Posts `body` to an auth endpoint, mapping HTTP failures to
    /// [`SessionError::Authentication`].
    async fn authenticate<B>(&self, path: &str, body: &B) -> Result<AuthResponse, SessionError>
    where
        B: serde::Serialize + Sync,
    {
        let response: AuthResponse = self.api.post(path, body, None).await.map_err(|e| match e {
            ApiError::Status { status, message } => {
                tracing::warn!(status, path, "Authentication rejected");
                SessionError::Authentication(message)
            }
            // Proxies answer auth failures with HTML pages.
            ApiError::Malformed { status, .. } if !(200..300).contains(&status) => {
                tracing::warn!(status, path, "Authentication rejected with a non-JSON body");
                SessionError::Authentication(format!("Request failed with status {status}"))
            }
            other => SessionError::Api(other),
        })?;

        // A null user would persist as a half record and vanish on reload.
        if response.user.is_null() {
            tracing::warn!(path, "Authentication response has no user");
            return Err(SessionError::Api(ApiError::Malformed {
                status: 200,
                snippet: "authentication response is missing the user".to_string(),
            }));
        }
        Ok(response)
    }

    /// Installs a freshly issued session.
    fn establish(&self, response: AuthResponse) -> SessionRecord {
        let record = SessionRecord::authenticated(response.token, response.user);
        self.replace(record.clone());
        record
    }

    /// Swaps the record and persists the new one. A storage failure is
    /// logged; the in-memory record stays authoritative.
    fn replace(&self, record: SessionRecord) {
        if let Err(e) = persist::save(self.store.as_ref(), &self.storage_key, &record) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
        self.record.send_replace(record);
    }
}
