//! Localized text resolution with lazy bundle loading.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{
    Mutex,
    watch,
};

use super::{
    I18nError,
    LanguageCode,
    TranslationBundle,
    TranslationCache,
    TranslationSource,
};
use crate::config::ClientSettings;

/// What a rendering front end needs to know to redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleState {
    /// Language used by [`Localizer::translate`]
    pub active: LanguageCode,
    /// Bumped every time a bundle finishes loading
    pub revision: u64,
}

/// Resolves translation keys for the active language.
///
/// The default-language bundle is always present and never needs a network
/// call. Other supported languages are fetched on first use, cached for the
/// lifetime of the `Localizer`, and fall back to default-language text (then
/// to the raw key) while missing.
#[derive(Debug)]
pub struct Localizer {
    /// Bundle shipped with the build
    default_bundle: Arc<TranslationBundle>,
    /// Languages that may be fetched, never including the default
    alternates: Vec<LanguageCode>,
    /// Bundles fetched so far
    cache: TranslationCache,
    /// Where alternate bundles come from
    source: Arc<dyn TranslationSource>,
    /// One gate per alternate so concurrent first loads share a single fetch
    load_gates: HashMap<LanguageCode, Mutex<()>>,
    /// Active language and load revision, observed by subscribers
    state: watch::Sender<LocaleState>,
}

impl Localizer {
    /// `alternates` are de-duplicated and the default language is dropped
    /// from them.
    #[must_use]
    pub fn new(
        default_bundle: TranslationBundle,
        alternates: Vec<LanguageCode>,
        source: Arc<dyn TranslationSource>,
    ) -> Self {
        let default_language = default_bundle.language().clone();

        let mut unique = Vec::with_capacity(alternates.len());
        for code in alternates {
            if code != default_language && !unique.contains(&code) {
                unique.push(code);
            }
        }
        let load_gates = unique.iter().map(|code| (code.clone(), Mutex::new(()))).collect();
        let (state, _) =
            watch::channel(LocaleState { active: default_language, revision: 0 });

        Self {
            default_bundle: Arc::new(default_bundle),
            alternates: unique,
            cache: TranslationCache::new(),
            source,
            load_gates,
            state,
        }
    }

    /// Builds the localizer described by `settings`: embedded or on-disk
    /// default bundle plus the configured alternates.
    ///
    /// # Errors
    /// Invalid language codes or an unreadable default bundle.
    pub fn from_settings(
        settings: &ClientSettings,
        source: Arc<dyn TranslationSource>,
    ) -> Result<Self, I18nError> {
        let default_language: LanguageCode = settings.default_language.parse()?;
        let default_bundle = match &settings.default_bundle_path {
            Some(path) => TranslationBundle::from_file(default_language, Path::new(path))?,
            None => TranslationBundle::embedded_default(default_language)?,
        };
        let alternates = settings
            .alternate_languages
            .iter()
            .map(|raw| raw.parse())
            .collect::<Result<Vec<LanguageCode>, _>>()?;

        tracing::debug!(
            default = %default_bundle.language(),
            keys = default_bundle.len(),
            alternates = ?alternates,
            "Localizer configured"
        );
        Ok(Self::new(default_bundle, alternates, source))
    }

    #[must_use]
    pub fn default_language(&self) -> &LanguageCode {
        self.default_bundle.language()
    }

    /// Default language first, then the alternates in configured order.
    #[must_use]
    pub fn supported_languages(&self) -> Vec<LanguageCode> {
        std::iter::once(self.default_language().clone())
            .chain(self.alternates.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn is_supported(&self, language: &LanguageCode) -> bool {
        language == self.default_language() || self.alternates.contains(language)
    }

    /// True when `language` resolves without a network call.
    #[must_use]
    pub fn is_loaded(&self, language: &LanguageCode) -> bool {
        language == self.default_language() || self.cache.contains(language)
    }

    #[must_use]
    pub fn active_language(&self) -> LanguageCode {
        self.state.borrow().active.clone()
    }

    /// Receiver that changes whenever the active language switches or a
    /// bundle finishes loading.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocaleState> {
        self.state.subscribe()
    }

    /// Best available text for `key` in `language`.
    ///
    /// Order: the language's own bundle (if loaded and the text is
    /// non-empty), then the default bundle, then `key` itself as a visible
    /// untranslated marker. Never fails.
    #[must_use]
    pub fn resolve(&self, key: &str, language: &LanguageCode) -> String {
        if language != self.default_language()
            && let Some(bundle) = self.cache.get(language)
            && let Some(text) = bundle.lookup(key)
        {
            return text.to_string();
        }

        self.default_bundle.lookup(key).unwrap_or(key).to_string()
    }

    /// [`Self::resolve`] against the active language.
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        self.resolve(key, &self.active_language())
    }

    /// Makes sure `language` is resolvable locally.
    ///
    /// Returns `true` immediately for the default language or a cached one.
    /// Otherwise fetches the bundle once; on failure the cache is left
    /// untouched so a later call can retry, and `false` is returned.
    /// Unsupported languages return `false` without a request.
    pub async fn ensure_loaded(&self, language: &LanguageCode) -> bool {
        if self.is_loaded(language) {
            return true;
        }
        let Some(gate) = self.load_gates.get(language) else {
            tracing::warn!(language = %language, "Refusing to load unsupported language");
            return false;
        };

        let _guard = gate.lock().await;
        // Another caller may have finished the load while we waited.
        if self.cache.contains(language) {
            return true;
        }

        tracing::debug!(language = %language, "Fetching translations");
        match self.source.fetch(language).await {
            Ok(bundle) => {
                let keys = bundle.len();
                self.cache.insert(bundle);
                self.state.send_modify(|state| state.revision += 1);
                tracing::info!(language = %language, keys, "Translations loaded");
                true
            }
            Err(e) => {
                tracing::warn!(language = %language, error = %e, "Failed to load translations");
                false
            }
        }
    }

    /// Loads `language` (if needed) and makes it active.
    ///
    /// The switch happens even when loading fails; lookups then fall back to
    /// the default language until a later load succeeds. Returns whether the
    /// bundle is available.
    ///
    /// # Errors
    /// `language` is not one of the supported languages; the active
    /// language is left unchanged.
    pub async fn set_active_language(&self, language: LanguageCode) -> Result<bool, I18nError> {
        if !self.is_supported(&language) {
            return Err(I18nError::UnsupportedLanguage(language));
        }

        let loaded = self.ensure_loaded(&language).await;
        self.state.send_if_modified(|state| {
            if state.active == language {
                return false;
            }
            tracing::info!(from = %state.active, to = %language, "Switching language");
            state.active = language;
            true
        });
        Ok(loaded)
    }

    /// Loads every alternate concurrently. Failures are logged by
    /// [`Self::ensure_loaded`] and otherwise ignored. Returns how many
    /// alternates are available afterwards.
    pub async fn preload(&self) -> usize {
        let loads = self.alternates.iter().map(|language| self.ensure_loaded(language));
        let loaded = futures::future::join_all(loads).await.into_iter().filter(|ok| *ok).count();

        tracing::debug!(loaded, total = self.alternates.len(), "Translation preload finished");
        loaded
    }
}
