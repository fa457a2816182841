//! Application-level wiring.
//!
//! [`AppContext`] is what a front end holds for the lifetime of the page:
//! one API client, one store, and the localizer/session/consent state built
//! on top of them.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{
    ApiClient,
    ApiError,
};
use crate::config::{
    ClientSettings,
    ConfigError,
    ConfigManager,
};
use crate::consent::ConsentManager;
use crate::content::{
    AdminService,
    BlogService,
    ContributionForm,
};
use crate::i18n::{
    HttpTranslationSource,
    I18nError,
    Localizer,
    TranslationSource,
};
use crate::session::SessionHolder;
use crate::storage::{
    FileStore,
    KeyValueStore,
    MemoryStore,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Localization setup failed: {0}")]
    I18n(#[from] I18nError),
}

#[derive(Debug)]
pub struct AppContext {
    /// Settings the context was built from
    settings: ClientSettings,
    /// Shared HTTP client
    api: Arc<ApiClient>,
    /// Local persistence shared by session and consent
    store: Arc<dyn KeyValueStore>,
    /// Translation resolver
    localizer: Arc<Localizer>,
    /// Authentication state
    session: Arc<SessionHolder>,
    /// Cookie banner state
    consent: ConsentManager,
    /// Blog endpoints
    blog: BlogService,
    /// Admin endpoints
    admin: AdminService,
}

impl AppContext {
    /// Builds everything from validated settings, fetching alternate
    /// translations over HTTP.
    ///
    /// The persisted session and consent choice are restored before this
    /// returns. No network request is made.
    pub fn new(settings: ClientSettings) -> Result<Self, AppError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let api = Arc::new(ApiClient::from_settings(&settings)?);
        let source = Arc::new(HttpTranslationSource::new(api.clone()));
        Self::assemble(settings, api, source)
    }

    /// Same as [`Self::new`] with the settings a [`ConfigManager`] holds.
    pub fn from_manager(manager: &ConfigManager) -> Result<Self, AppError> {
        Self::new(manager.get_settings().clone())
    }

    /// Builds the context with a caller-supplied translation source, e.g. a
    /// directory of bundles for offline use.
    pub fn with_translation_source(
        settings: ClientSettings,
        source: Arc<dyn TranslationSource>,
    ) -> Result<Self, AppError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let api = Arc::new(ApiClient::from_settings(&settings)?);
        Self::assemble(settings, api, source)
    }

    /// Shared construction once the client and source exist.
    fn assemble(
        settings: ClientSettings,
        api: Arc<ApiClient>,
        source: Arc<dyn TranslationSource>,
    ) -> Result<Self, AppError> {
        let store: Arc<dyn KeyValueStore> = match &settings.storage.path {
            Some(path) => Arc::new(FileStore::new(PathBuf::from(path))),
            None => Arc::new(MemoryStore::new()),
        };

        let localizer = Arc::new(Localizer::from_settings(&settings, source)?);

        let session = Arc::new(SessionHolder::new(
            api.clone(),
            store.clone(),
            settings.storage.session_key.clone(),
        ));
        session.rehydrate();

        let consent = ConsentManager::new(
            api.clone(),
            store.clone(),
            settings.storage.consent_key.clone(),
            settings.storage.preferences_key.clone(),
        );
        consent.load();

        let blog = BlogService::new(api.clone(), session.clone());
        let admin = AdminService::new(api.clone(), session.clone());

        tracing::info!(
            api = %api.base_url(),
            authenticated = session.is_authenticated(),
            "Application context ready"
        );
        Ok(Self { settings, api, store, localizer, session, consent, blog, admin })
    }

    /// Starts loading every alternate language in the background and
    /// returns immediately. The handle yields how many loads succeeded.
    pub fn start(&self) -> JoinHandle<usize> {
        let localizer = self.localizer.clone();
        tokio::spawn(async move { localizer.preload().await })
    }

    /// Drops the session when the server says it is no longer valid.
    /// Returns whether it did.
    pub fn handle_api_error(&self, error: &ApiError) -> bool {
        if !error.is_unauthorized() || !self.session.is_authenticated() {
            return false;
        }
        tracing::warn!(status = ?error.status(), "Session rejected by server, signing out");
        self.session.clear();
        true
    }

    /// Submits the contribution form with the current session token, if any.
    pub async fn submit_contribution(
        &self,
        form: &ContributionForm,
    ) -> Result<serde_json::Value, ApiError> {
        let token = self.session.token();
        form.submit(&self.api, token.as_deref()).await
    }

    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    #[must_use]
    pub const fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    #[must_use]
    pub const fn localizer(&self) -> &Arc<Localizer> {
        &self.localizer
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<SessionHolder> {
        &self.session
    }

    #[must_use]
    pub const fn consent(&self) -> &ConsentManager {
        &self.consent
    }

    #[must_use]
    pub const fn blog(&self) -> &BlogService {
        &self.blog
    }

    #[must_use]
    pub const fn admin(&self) -> &AdminService {
        &self.admin
    }
}
