//! Localized content resolution.
//!
//! A [`Localizer`] turns `(key, language)` into display text. The default
//! language is compiled in; alternates are fetched lazily through a
//! [`TranslationSource`] and kept in a [`TranslationCache`]. Missing text
//! degrades to the default language and finally to the key itself.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Bundle type and JSON flattening
mod bundle;
/// Loaded-bundle cache
mod cache;
/// Language tags
mod language;
/// Resolver
mod localizer;
/// Bundle sources
mod source;

pub use bundle::{
    KEY_SEPARATOR,
    TranslationBundle,
    flatten_json,
};
pub use cache::TranslationCache;
pub use language::LanguageCode;
pub use localizer::{
    LocaleState,
    Localizer,
};
pub use source::{
    DirectoryTranslationSource,
    HttpTranslationSource,
    TranslationSource,
};

#[derive(Error, Debug)]
pub enum I18nError {
    #[error("Invalid language code '{0}'. Use a tag such as \"en\", \"hi\" or \"pt-BR\"")]
    InvalidLanguageCode(String),

    #[error("Language '{0}' is not supported")]
    UnsupportedLanguage(LanguageCode),

    #[error("Translation bundle for '{0}' must be a JSON object")]
    NotAnObject(LanguageCode),

    #[error("Failed to parse translation bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read translation bundle {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch translations: {0}")]
    Fetch(#[from] ApiError),
}
