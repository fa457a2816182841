//! Page-lifetime store of loaded bundles.

use std::collections::HashMap;
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

use super::{
    LanguageCode,
    TranslationBundle,
};

/// Loaded bundles keyed by language.
///
/// A language present here always maps to a complete bundle: entries are
/// inserted only after a full successful load, and always as a whole
/// `Arc<TranslationBundle>`. Readers holding an `Arc` keep a consistent view
/// even if a newer bundle replaces it.
#[derive(Debug, Default)]
pub struct TranslationCache {
    /// Language → bundle
    bundles: RwLock<HashMap<LanguageCode, Arc<TranslationBundle>>>,
}

impl TranslationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, language: &LanguageCode) -> Option<Arc<TranslationBundle>> {
        self.bundles.read().unwrap_or_else(PoisonError::into_inner).get(language).cloned()
    }

    #[must_use]
    pub fn contains(&self, language: &LanguageCode) -> bool {
        self.bundles.read().unwrap_or_else(PoisonError::into_inner).contains_key(language)
    }

    /// Stores `bundle` under its own language, replacing any previous one.
    pub fn insert(&self, bundle: TranslationBundle) {
        let language = bundle.language().clone();
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language, Arc::new(bundle));
    }

    /// Cached languages, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<LanguageCode> {
        let mut languages: Vec<_> =
            self.bundles.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        languages.sort();
        languages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use googletest::prelude::*;

    use super::*;

    fn bundle(language: &str, pairs: &[(&str, &str)]) -> TranslationBundle {
        let entries: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        TranslationBundle::new(language.parse().unwrap(), entries)
    }

    #[googletest::test]
    fn new_cache_is_empty() {
        let cache = TranslationCache::new();

        expect_that!(cache.is_empty(), eq(true));
        expect_that!(cache.get(&"hi".parse().unwrap()), none());
    }

    #[googletest::test]
    fn insert_is_keyed_by_bundle_language() {
        let cache = TranslationCache::new();
        cache.insert(bundle("ta", &[("home.title", "வரவேற்பு")]));
        cache.insert(bundle("hi", &[("home.title", "स्वागत")]));

        let hi = cache.get(&"hi".parse().unwrap()).unwrap();

        expect_that!(hi.lookup("home.title"), some(eq("स्वागत")));
        let languages = cache.languages();
        let codes: Vec<String> = languages.iter().map(ToString::to_string).collect();
        expect_that!(codes, elements_are![eq("hi"), eq("ta")]);
    }

    #[googletest::test]
    fn replacement_swaps_whole_bundle_and_keeps_old_readers_consistent() {
        let cache = TranslationCache::new();
        cache.insert(bundle("hi", &[("a", "old-a"), ("b", "old-b")]));
        let before = cache.get(&"hi".parse().unwrap()).unwrap();

        cache.insert(bundle("hi", &[("a", "new-a")]));
        let after = cache.get(&"hi".parse().unwrap()).unwrap();

        expect_that!(before.lookup("b"), some(eq("old-b")));
        expect_that!(after.lookup("a"), some(eq("new-a")));
        expect_that!(after.lookup("b"), none());
        expect_that!(cache.len(), eq(1));
    }
}
