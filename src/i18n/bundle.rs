//! Translation bundles.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use super::{
    I18nError,
    LanguageCode,
};

/// Default-language text compiled into the crate.
const EMBEDDED_DEFAULT_BUNDLE: &str = include_str!("../../locales/en.json");

/// Separator used when flattening nested translation objects.
pub const KEY_SEPARATOR: &str = ".";

/// The complete key → text map for one language.
///
/// Keys are dotted paths (`home.title`). A bundle is only ever built whole;
/// there is no way to add or remove a single entry after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationBundle {
    /// Language the texts are written in
    language: LanguageCode,
    /// Flattened key map (e.g., "home.title" -> "Welcome")
    entries: HashMap<String, String>,
}

impl TranslationBundle {
    #[must_use]
    pub const fn new(language: LanguageCode, entries: HashMap<String, String>) -> Self {
        Self { language, entries }
    }

    /// Builds a bundle from a JSON object, flattening nested objects.
    ///
    /// # Errors
    /// The value is not a JSON object.
    pub fn from_json(language: LanguageCode, json: &Value) -> Result<Self, I18nError> {
        if !json.is_object() {
            return Err(I18nError::NotAnObject(language));
        }
        let entries = flatten_json(json, KEY_SEPARATOR, None);
        Ok(Self { language, entries })
    }

    pub fn from_json_str(language: LanguageCode, text: &str) -> Result<Self, I18nError> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_json(language, &json)
    }

    /// Reads a bundle file from disk.
    pub fn from_file(language: LanguageCode, path: &Path) -> Result<Self, I18nError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| I18nError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(language, &text)
    }

    /// The default-language bundle shipped inside the crate.
    pub fn embedded_default(language: LanguageCode) -> Result<Self, I18nError> {
        Self::from_json_str(language, EMBEDDED_DEFAULT_BUNDLE)
    }

    #[must_use]
    pub const fn language(&self) -> &LanguageCode {
        &self.language
    }

    /// Text for `key`, treating an empty string as untranslated.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str).filter(|text| !text.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flatten nested JSON object into separator-joined key map.
///
/// Arrays use `[index]` suffixes, non-string scalars are stringified and
/// `null` leaves the key out (treated as untranslated).
///
/// # Examples
/// ```
/// use serde_json::json;
/// use portal_client::i18n::flatten_json;
///
/// let json = json!({
///     "home": {
///         "title": "Welcome",
///         "subtitle": "Hello"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened.get("home.title"), Some(&"Welcome".to_string()));
/// assert_eq!(flattened.get("home.subtitle"), Some(&"Hello".to_string()));
/// ```
#[must_use]
pub fn flatten_json(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
) -> HashMap<String, String> {
    let mut result = HashMap::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

/// Recursive worker for [`flatten_json`].
fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, String>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        Value::Null => {}
        Value::Bool(_) | Value::Number(_) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;

    fn code(raw: &str) -> LanguageCode {
        raw.parse().unwrap()
    }

    #[googletest::test]
    fn test_flatten_json_simple() {
        let json = json!({
            "hello": "Hello",
            "goodbye": "Goodbye"
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("hello"), some(eq(&"Hello".to_string())));
        expect_that!(result.get("goodbye"), some(eq(&"Goodbye".to_string())));
        expect_that!(result.len(), eq(2));
    }

    #[googletest::test]
    fn test_flatten_json_nested() {
        let json = json!({
            "home": {
                "title": "Welcome",
                "cta": "Join"
            },
            "errors": {
                "network": "Offline"
            }
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("home.title"), some(eq(&"Welcome".to_string())));
        expect_that!(result.get("home.cta"), some(eq(&"Join".to_string())));
        expect_that!(result.get("errors.network"), some(eq(&"Offline".to_string())));
        expect_that!(result.len(), eq(3));
    }

    #[googletest::test]
    fn test_flatten_json_keeps_already_dotted_keys() {
        let json = json!({ "home.title": "स्वागत", "nav": { "home": "होम" } });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("home.title"), some(eq(&"स्वागत".to_string())));
        expect_that!(result.get("nav.home"), some(eq(&"होम".to_string())));
    }

    #[googletest::test]
    fn test_flatten_json_arrays_scalars_and_null() {
        let json = json!({
            "steps": ["One", "Two"],
            "count": 3,
            "enabled": true,
            "pending": null
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("steps[0]"), some(eq(&"One".to_string())));
        expect_that!(result.get("steps[1]"), some(eq(&"Two".to_string())));
        expect_that!(result.get("count"), some(eq(&"3".to_string())));
        expect_that!(result.get("enabled"), some(eq(&"true".to_string())));
        expect_that!(result.get("pending"), none());
    }

    #[googletest::test]
    fn lookup_treats_empty_text_as_untranslated() {
        let bundle =
            TranslationBundle::from_json(code("hi"), &json!({"a": "", "b": "बी"})).unwrap();

        expect_that!(bundle.lookup("a"), none());
        expect_that!(bundle.lookup("b"), some(eq("बी")));
        expect_that!(bundle.lookup("missing"), none());
        expect_that!(bundle.len(), eq(2));
    }

    #[googletest::test]
    fn from_json_rejects_non_objects() {
        let result = TranslationBundle::from_json(code("hi"), &json!(["a"]));

        expect_that!(matches!(result, Err(I18nError::NotAnObject(_))), eq(true));
    }

    #[googletest::test]
    fn from_json_str_reports_parse_errors() {
        let result = TranslationBundle::from_json_str(code("hi"), "{ nope");

        expect_that!(matches!(result, Err(I18nError::Parse(_))), eq(true));
    }

    #[googletest::test]
    fn embedded_default_bundle_parses() {
        let bundle = TranslationBundle::embedded_default(code("en")).unwrap();

        expect_that!(bundle.language().as_str(), eq("en"));
        expect_that!(bundle.lookup("home.title"), some(eq("Welcome")));
        expect_that!(bundle.lookup("contribute.steps.interests"), some(eq("Research interests")));
        expect_that!(bundle.keys().all(|key| bundle.lookup(key).is_some()), eq(true));
    }

    #[googletest::test]
    fn from_file_reads_bundle() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hi.json");
        std::fs::write(&path, r#"{"home": {"title": "स्वागत"}}"#).unwrap();

        let bundle = TranslationBundle::from_file(code("hi"), &path).unwrap();

        expect_that!(bundle.lookup("home.title"), some(eq("स्वागत")));
    }

    #[googletest::test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();

        let result = TranslationBundle::from_file(code("hi"), &dir.path().join("hi.json"));

        expect_that!(matches!(result, Err(I18nError::Io { .. })), eq(true));
    }
}
