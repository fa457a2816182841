use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::i18n::LanguageCode;
use crate::types::{
    ValidationError,
    format_validation_errors,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Base URL of the remote API, e.g. `https://portal.example.org/api`.
    pub api_base_url: String,

    /// Language whose bundle ships with the crate and never needs a network call.
    pub default_language: String,

    /// Languages fetched on demand from `GET /translate/{code}`.
    pub alternate_languages: Vec<String>,

    /// Replaces the embedded default bundle with a JSON file on disk.
    pub default_bundle_path: Option<String>,

    /// Per-request timeout. `None` leaves the HTTP stack's default in place.
    pub request_timeout_secs: Option<u64>,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// File backing the key-value store. In-memory only when unset.
    pub path: Option<String>,

    pub session_key: String,
    pub consent_key: String,
    pub preferences_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            session_key: "session".to_string(),
            consent_key: "cookieConsent".to_string(),
            preferences_key: "cookiePreferences".to_string(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            default_language: "en".to_string(),
            alternate_languages: vec!["hi".to_string()],
            default_bundle_path: None,
            request_timeout_secs: None,
            storage: StorageConfig::default(),
        }
    }
}

impl ClientSettings {
    /// # Errors
    /// - Base URL is not an absolute http(s) URL
    /// - Invalid, duplicated or default-shadowing language codes
    /// - Empty or colliding storage keys
    /// - Zero timeout
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match url::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "apiBaseUrl",
                format!("Unsupported scheme '{}'. Use http or https", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "apiBaseUrl",
                format!("Invalid URL '{}': {e}", self.api_base_url),
            )),
        }

        let default_language = match self.default_language.parse::<LanguageCode>() {
            Ok(code) => Some(code),
            Err(e) => {
                errors.push(ValidationError::new("defaultLanguage", e.to_string()));
                None
            }
        };

        let mut seen = HashSet::new();
        for (index, raw) in self.alternate_languages.iter().enumerate() {
            let field = format!("alternateLanguages[{index}]");
            let code = match raw.parse::<LanguageCode>() {
                Ok(code) => code,
                Err(e) => {
                    errors.push(ValidationError::new(field, e.to_string()));
                    continue;
                }
            };
            if default_language.as_ref() == Some(&code) {
                errors.push(ValidationError::new(
                    field,
                    format!("'{code}' is the default language and cannot also be an alternate"),
                ));
            } else if !seen.insert(code.clone()) {
                errors.push(ValidationError::new(field, format!("'{code}' is listed twice")));
            }
        }

        if let Some(path) = &self.default_bundle_path
            && path.is_empty()
        {
            errors.push(ValidationError::new(
                "defaultBundlePath",
                "The path cannot be empty. Remove the field to use the embedded bundle",
            ));
        }

        if self.request_timeout_secs == Some(0) {
            errors.push(ValidationError::new(
                "requestTimeoutSecs",
                "The timeout must be at least 1 second, or removed to use the default",
            ));
        }

        self.storage.validate_into(&mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl StorageConfig {
    /// Appends storage-related problems to `errors`.
    fn validate_into(&self, errors: &mut Vec<ValidationError>) {
        if let Some(path) = &self.path
            && path.is_empty()
        {
            errors.push(ValidationError::new(
                "storage.path",
                "The path cannot be empty. Remove the field to keep state in memory",
            ));
        }

        let keys = [
            ("storage.sessionKey", &self.session_key),
            ("storage.consentKey", &self.consent_key),
            ("storage.preferencesKey", &self.preferences_key),
        ];
        let mut seen = HashSet::new();
        for (field, key) in keys {
            if key.is_empty() {
                errors.push(ValidationError::new(field, "The storage key cannot be empty"));
            } else if !seen.insert(key.as_str()) {
                errors.push(ValidationError::new(
                    field,
                    format!("The storage key '{key}' is already used by another entry"),
                ));
            }
        }
    }
}
