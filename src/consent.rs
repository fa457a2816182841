//! Cookie consent: the visitor's choice, kept locally and mirrored to the
//! server on request.

use std::sync::Arc;

use serde::de::IgnoredAny;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{
    ApiClient,
    ApiError,
};
use crate::storage::{
    KeyValueStore,
    StorageError,
};

/// Endpoint for both directions of the sync.
const COOKIES_PATH: &str = "/cookies";

#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("Failed to store cookie preferences: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to sync cookie preferences: {0}")]
    Api(#[from] ApiError),
}

/// Per-category consent. Essential cookies cannot be declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiePreferences {
    /// Always true, whatever was stored or sent
    #[serde(default = "always", deserialize_with = "force_essential")]
    essential: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
    #[serde(default)]
    pub preferences: bool,
}

/// Serde default for the essential flag.
const fn always() -> bool {
    true
}

/// Discards whatever value was supplied for `essential`.
fn force_essential<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

impl Default for CookiePreferences {
    fn default() -> Self {
        Self::essential_only()
    }
}

impl CookiePreferences {
    #[must_use]
    pub const fn essential_only() -> Self {
        Self { essential: true, analytics: false, marketing: false, preferences: false }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self { essential: true, analytics: true, marketing: true, preferences: true }
    }

    #[must_use]
    pub const fn new(analytics: bool, marketing: bool, preferences: bool) -> Self {
        Self { essential: true, analytics, marketing, preferences }
    }

    #[must_use]
    pub const fn essential(&self) -> bool {
        self.essential
    }
}

/// The visitor's decision. Also the wire shape of `/cookies`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    /// Whether the visitor has answered the banner at all
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub preferences: CookiePreferences,
}

/// Owns the consent state and its two storage entries.
#[derive(Debug)]
pub struct ConsentManager {
    /// Current state and change feed
    state: watch::Sender<ConsentState>,
    /// Persistence backend
    store: Arc<dyn KeyValueStore>,
    /// Key of the acceptance flag
    consent_key: String,
    /// Key of the per-category preferences
    preferences_key: String,
    /// Remote API for server sync
    api: Arc<ApiClient>,
}

impl ConsentManager {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<dyn KeyValueStore>,
        consent_key: impl Into<String>,
        preferences_key: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(ConsentState::default());
        Self {
            state,
            store,
            consent_key: consent_key.into(),
            preferences_key: preferences_key.into(),
            api,
        }
    }

    /// Reads both entries from storage. Missing or unreadable entries fall
    /// back to "not yet answered, essential only".
    pub fn load(&self) -> ConsentState {
        let accepted = self.read_entry::<bool>(&self.consent_key).unwrap_or(false);
        let preferences =
            self.read_entry::<CookiePreferences>(&self.preferences_key).unwrap_or_default();
        let loaded = ConsentState { accepted, preferences };
        self.state.send_replace(loaded);
        loaded
    }

    #[must_use]
    pub fn state(&self) -> ConsentState {
        *self.state.borrow()
    }

    /// True until the visitor has made a choice.
    #[must_use]
    pub fn needs_banner(&self) -> bool {
        !self.state.borrow().accepted
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConsentState> {
        self.state.subscribe()
    }

    pub fn accept_all(&self) -> Result<ConsentState, ConsentError> {
        self.decide(CookiePreferences::all())
    }

    pub fn reject_optional(&self) -> Result<ConsentState, ConsentError> {
        self.decide(CookiePreferences::essential_only())
    }

    /// Stores a custom choice; `essential` stays on regardless.
    pub fn save_preferences(
        &self,
        preferences: CookiePreferences,
    ) -> Result<ConsentState, ConsentError> {
        self.decide(CookiePreferences::new(
            preferences.analytics,
            preferences.marketing,
            preferences.preferences,
        ))
    }

    /// `POST /cookies` with the current state.
    pub async fn push_to_server(&self, token: Option<&str>) -> Result<(), ConsentError> {
        let state = self.state();
        let _: serde_json::Value = self.api.post(COOKIES_PATH, &state, token).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to push cookie preferences");
            e
        })?;
        tracing::debug!("Cookie preferences pushed to server");
        Ok(())
    }

    /// `GET /cookies`. A stored server-side choice replaces the local one and
    /// is persisted; a `null` answer leaves local state untouched.
    pub async fn sync_from_server(
        &self,
        token: Option<&str>,
    ) -> Result<ConsentState, ConsentError> {
        let remote: Option<ConsentState> = self.api.get(COOKIES_PATH, token).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch cookie preferences");
            e
        })?;
        match remote {
            Some(remote) => {
                self.apply(remote)?;
                Ok(remote)
            }
            None => Ok(self.state()),
        }
    }

    /// Records an answer to the banner.
    fn decide(&self, preferences: CookiePreferences) -> Result<ConsentState, ConsentError> {
        let state = ConsentState { accepted: true, preferences };
        self.apply(state)?;
        tracing::info!(
            analytics = preferences.analytics,
            marketing = preferences.marketing,
            preferences = preferences.preferences,
            "Cookie consent recorded"
        );
        Ok(state)
    }

    /// Writes both storage entries, then updates memory.
    ///
    /// Memory only changes once both writes succeed. If the second write
    /// fails the acceptance flag is put back to its previous value.
    fn apply(&self, state: ConsentState) -> Result<(), ConsentError> {
        let accepted = serde_json::to_string(&state.accepted).map_err(StorageError::from)?;
        let preferences = serde_json::to_string(&state.preferences).map_err(StorageError::from)?;

        let previous = self.store.get(&self.consent_key)?;
        self.store.set(&self.consent_key, &accepted)?;
        if let Err(e) = self.store.set(&self.preferences_key, &preferences) {
            let restored = match &previous {
                Some(value) => self.store.set(&self.consent_key, value),
                None => self.store.remove(&self.consent_key),
            };
            if let Err(restore_error) = restored {
                tracing::warn!(error = %restore_error, "Failed to restore cookie consent flag");
            }
            return Err(e.into());
        }

        self.state.send_replace(state);
        Ok(())
    }

    /// Parses one storage entry, logging anything unusable.
    fn read_entry<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not read consent entry");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(key, error = %e, "Ignoring unreadable consent entry"))
            .ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{
        body_json,
        header,
        method,
        path,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::storage::MemoryStore;

    fn manager(base: &str, store: Arc<MemoryStore>) -> ConsentManager {
        let api = Arc::new(ApiClient::new(base, None).unwrap());
        ConsentManager::new(api, store, "cookieConsent", "cookiePreferences")
    }

    #[rstest]
    #[case::declined(r#"{"essential": false, "analytics": true}"#)]
    #[case::missing(r#"{"analytics": true}"#)]
    #[case::garbage_value(r#"{"essential": "no", "analytics": true}"#)]
    fn essential_is_always_true(#[case] text: &str) {
        let prefs: CookiePreferences = serde_json::from_str(text).unwrap();

        assert_that!(prefs.essential(), eq(true));
        assert_that!(prefs.analytics, eq(true));
        assert_that!(prefs.marketing, eq(false));
    }

    #[rstest]
    fn fresh_store_needs_banner() {
        let consent = manager("http://localhost:5000/api", Arc::new(MemoryStore::new()));

        let state = consent.load();

        assert_that!(state.accepted, eq(false));
        assert_that!(state.preferences, eq(CookiePreferences::essential_only()));
        assert_that!(consent.needs_banner(), eq(true));
    }

    #[rstest]
    fn accept_all_persists_both_entries() {
        let store = Arc::new(MemoryStore::new());
        let consent = manager("http://localhost:5000/api", store.clone());

        consent.accept_all().unwrap();

        assert_that!(store.get("cookieConsent").unwrap(), some(eq("true")));
        let reloaded = manager("http://localhost:5000/api", store).load();
        assert_that!(reloaded.preferences, eq(CookiePreferences::all()));
        assert_that!(reloaded.accepted, eq(true));
    }

    #[rstest]
    fn reject_optional_keeps_essential() {
        let consent = manager("http://localhost:5000/api", Arc::new(MemoryStore::new()));

        let state = consent.reject_optional().unwrap();

        assert_that!(state.accepted, eq(true));
        assert_that!(state.preferences, eq(CookiePreferences::essential_only()));
        assert_that!(consent.needs_banner(), eq(false));
    }

    /// Memory-backed store whose writes to one key always fail.
    #[derive(Debug)]
    struct FailingStore {
        inner: MemoryStore,
        broken_key: &'static str,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.broken_key {
                return Err(StorageError::Io {
                    path: key.into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[rstest]
    #[case::flag_write_fails("cookieConsent")]
    #[case::preferences_write_fails("cookiePreferences")]
    fn failed_write_leaves_state_and_storage_unchanged(#[case] broken_key: &'static str) {
        let store = Arc::new(FailingStore { inner: MemoryStore::new(), broken_key });
        let api = Arc::new(ApiClient::new("http://localhost:5000/api", None).unwrap());
        let consent = ConsentManager::new(api, store.clone(), "cookieConsent", "cookiePreferences");
        let mut updates = consent.subscribe();

        let result = consent.accept_all();

        assert!(matches!(result, Err(ConsentError::Storage(StorageError::Io { .. }))));
        assert_that!(consent.state(), eq(ConsentState::default()));
        assert_that!(consent.needs_banner(), eq(true));
        assert_that!(updates.has_changed().unwrap(), eq(false));
        assert_that!(store.get("cookieConsent").unwrap(), none());
        assert_that!(store.get("cookiePreferences").unwrap(), none());
    }

    #[rstest]
    fn unreadable_entries_fall_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set("cookieConsent", "maybe").unwrap();
        store.set("cookiePreferences", "[]").unwrap();

        let state = manager("http://localhost:5000/api", store).load();

        assert_that!(state, eq(ConsentState::default()));
    }

    #[tokio::test]
    async fn push_sends_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cookies"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({
                "accepted": true,
                "preferences": {"essential": true, "analytics": true, "marketing": false, "preferences": true}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        let consent = manager(&server.uri(), Arc::new(MemoryStore::new()));
        consent.save_preferences(CookiePreferences::new(true, false, true)).unwrap();

        consent.push_to_server(Some("tok")).await.unwrap();
    }

    #[tokio::test]
    async fn push_failure_keeps_local_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let store = Arc::new(MemoryStore::new());
        let consent = manager(&server.uri(), store.clone());
        consent.accept_all().unwrap();

        let result = consent.push_to_server(None).await;

        assert!(matches!(result, Err(ConsentError::Api(ApiError::Status { status: 503, .. }))));
        assert_that!(store.get("cookieConsent").unwrap(), some(eq("true")));
    }

    #[tokio::test]
    async fn sync_from_server_replaces_local_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cookies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accepted": true,
                "preferences": {"analytics": true}
            })))
            .mount(&server)
            .await;
        let store = Arc::new(MemoryStore::new());
        let consent = manager(&server.uri(), store.clone());

        let state = consent.sync_from_server(Some("tok")).await.unwrap();

        assert_that!(state.preferences, eq(CookiePreferences::new(true, false, false)));
        assert_that!(consent.state(), eq(state));
        assert_that!(store.get("cookieConsent").unwrap(), some(eq("true")));
    }

    #[tokio::test]
    async fn sync_from_server_null_keeps_local_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cookies"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;
        let consent = manager(&server.uri(), Arc::new(MemoryStore::new()));
        consent.reject_optional().unwrap();

        let state = consent.sync_from_server(None).await.unwrap();

        assert_that!(state.accepted, eq(true));
        assert_that!(state.preferences, eq(CookiePreferences::essential_only()));
    }
}
