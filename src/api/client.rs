//! HTTP/JSON client for the remote portal API.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{
    Method,
    RequestBuilder,
    StatusCode,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ApiError;
use crate::config::ClientSettings;

/// Characters of an unexpected body kept for diagnostics.
const SNIPPET_LEN: usize = 120;

/// Thin wrapper around `reqwest::Client` bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Shared connection pool
    http: reqwest::Client,
    /// Base URL; endpoint paths are appended to it verbatim
    base_url: Url,
}

/// Standard `User-Agent` sent with every request.
#[must_use]
pub fn user_agent() -> String {
    format!("portal-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ApiClient {
    /// # Errors
    /// Invalid base URL or a TLS backend that fails to initialise.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        let mut builder = reqwest::Client::builder().user_agent(user_agent());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ApiError> {
        Self::new(&settings.api_base_url, settings.request_timeout_secs.map(Duration::from_secs))
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL, keeping any path prefix the base
    /// already has (`https://host/api` + `/auth/login` → `https://host/api/auth/login`).
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::GET, self.endpoint(path)?);
        self.send(request, token).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, token: Option<&str>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::POST, self.endpoint(path)?).json(body);
        self.send(request, token).await
    }

    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::PATCH, self.endpoint(path)?).json(body);
        self.send(request, token).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::DELETE, self.endpoint(path)?);
        self.send(request, token).await
    }

    /// Sends the request and classifies the response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        tracing::debug!(
            url = %self.base_url,
            status = status.as_u16(),
            bytes = body.len(),
            "API response received"
        );

        decode_body(status, content_type.as_deref(), &body)
    }
}

/// Error payload shape used by the server.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    /// Human readable message
    message: Option<String>,
    /// Older endpoints use `error` instead of `message`
    error: Option<String>,
}

/// Turns a raw response into a typed value or an [`ApiError`].
///
/// The body is sniffed before parsing so an HTML error page is reported as
/// [`ApiError::Malformed`] rather than as a confusing JSON syntax error.
fn decode_body<T: DeserializeOwned>(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<T, ApiError> {
    let code = status.as_u16();

    if looks_like_html(content_type, body) {
        tracing::warn!(status = code, "Received HTML where JSON was expected");
        return Err(ApiError::Malformed { status: code, snippet: snippet(body) });
    }

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|err| err.message.or(err.error))
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {code}"));
        return Err(ApiError::Status { status: code, message });
    }

    let json = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(json).map_err(|e| {
        tracing::warn!(status = code, error = %e, "Failed to decode API response");
        ApiError::Malformed { status: code, snippet: snippet(body) }
    })
}

/// Content sniffing: an HTML content type, or a body that opens with a tag.
fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    let declared_html =
        content_type.is_some_and(|value| value.to_ascii_lowercase().contains("text/html"));
    declared_html || body.trim_start().starts_with('<')
}

/// First few characters of a body, for error messages.
fn snippet(body: &str) -> String {
    body.trim().chars().take(SNIPPET_LEN).collect()
}
