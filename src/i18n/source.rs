//! Where non-default bundles come from.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{
    I18nError,
    LanguageCode,
    TranslationBundle,
};
use crate::api::ApiClient;

/// Fetches one complete bundle per call.
///
/// Implementations must either return the whole bundle or an error; a
/// partially read bundle is never returned.
#[async_trait]
pub trait TranslationSource: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, language: &LanguageCode) -> Result<TranslationBundle, I18nError>;
}

/// Envelope returned by `GET /translate/{code}`.
#[derive(Debug, Deserialize)]
struct TranslationsResponse {
    /// Flat or nested key → text object
    translations: Value,
}

/// Loads bundles from the remote API.
#[derive(Debug, Clone)]
pub struct HttpTranslationSource {
    /// Shared API client
    api: Arc<ApiClient>,
}

impl HttpTranslationSource {
    #[must_use]
    pub const fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TranslationSource for HttpTranslationSource {
    async fn fetch(&self, language: &LanguageCode) -> Result<TranslationBundle, I18nError> {
        let response: TranslationsResponse =
            self.api.get(&format!("/translate/{language}"), None).await?;
        TranslationBundle::from_json(language.clone(), &response.translations)
    }
}

/// Loads `<dir>/<code>.json` from disk, for offline builds and fixtures.
///
/// Accepts either the API envelope (`{"translations": {...}}`) or a bare
/// object.
#[derive(Debug, Clone)]
pub struct DirectoryTranslationSource {
    /// Directory holding one file per language
    dir: PathBuf,
}

impl DirectoryTranslationSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TranslationSource for DirectoryTranslationSource {
    async fn fetch(&self, language: &LanguageCode) -> Result<TranslationBundle, I18nError> {
        let path = self.dir.join(format!("{language}.json"));
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| I18nError::Io { path: path.clone(), source })?;

        let json: Value = serde_json::from_str(&text)?;
        let body = match json {
            Value::Object(mut map) if map.get("translations").is_some_and(Value::is_object) => {
                map.remove("translations").unwrap_or_default()
            }
            other => other,
        };
        TranslationBundle::from_json(language.clone(), &body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{
        method,
        path,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    fn hi() -> LanguageCode {
        "hi".parse().unwrap()
    }

    #[tokio::test]
    async fn http_source_flattens_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate/hi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": { "home.title": "स्वागत", "nav": { "blog": "ब्लॉग" } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        let source = HttpTranslationSource::new(Arc::new(ApiClient::new(&server.uri(), None).unwrap()));

        let bundle = source.fetch(&hi()).await.unwrap();

        assert_that!(bundle.lookup("home.title"), some(eq("स्वागत")));
        assert_that!(bundle.lookup("nav.blog"), some(eq("ब्लॉग")));
    }

    #[tokio::test]
    async fn http_source_non_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate/hi"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Unknown language"})))
            .mount(&server)
            .await;
        let source = HttpTranslationSource::new(Arc::new(ApiClient::new(&server.uri(), None).unwrap()));

        let result = source.fetch(&hi()).await;

        match result {
            Err(I18nError::Fetch(err)) => assert_that!(err.status(), some(eq(404))),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_source_missing_envelope_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate/hi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"home.title": "x"})))
            .mount(&server)
            .await;
        let source = HttpTranslationSource::new(Arc::new(ApiClient::new(&server.uri(), None).unwrap()));

        assert!(source.fetch(&hi()).await.is_err());
    }

    #[tokio::test]
    async fn directory_source_accepts_envelope_and_bare_object() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hi.json"), r#"{"translations": {"home.title": "स्वागत"}}"#)
            .unwrap();
        std::fs::write(dir.path().join("ta.json"), r#"{"home": {"title": "வரவேற்பு"}}"#).unwrap();
        let source = DirectoryTranslationSource::new(dir.path());

        let hindi = source.fetch(&hi()).await.unwrap();
        let tamil = source.fetch(&"ta".parse().unwrap()).await.unwrap();

        assert_that!(hindi.lookup("home.title"), some(eq("स्वागत")));
        assert_that!(tamil.lookup("home.title"), some(eq("வரவேற்பு")));
    }

    #[test]
    fn directory_source_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let source = DirectoryTranslationSource::new(dir.path());

        let result = tokio_test::block_on(async { source.fetch(&hi()).await });

        assert!(matches!(result, Err(I18nError::Io { .. })));
    }
}
