//! Settings file loading.

use std::path::Path;

use super::{
    ClientSettings,
    ConfigError,
};

/// Name of the settings file looked up in the root directory.
pub(super) const CONFIG_FILE_NAME: &str = ".portal-client.json";

/// Environment variable overriding `apiBaseUrl` at deploy time.
pub(super) const BASE_URL_ENV: &str = "PORTAL_API_BASE_URL";

/// Reads `.portal-client.json` from `root`.
///
/// # Returns
/// - `Ok(Some(settings))`: the file exists and parsed
/// - `Ok(None)`: no file in `root`
/// - `Err(ConfigError)`: read or parse failure
pub(super) fn load_from_dir(root: &Path) -> Result<Option<ClientSettings>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: ClientSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}

/// Applies the deployment override for the base URL, if one is set.
pub(super) fn apply_env_overrides(
    settings: &mut ClientSettings,
    base_url_override: Option<String>,
) {
    if let Some(base_url) = base_url_override.filter(|value| !value.trim().is_empty()) {
        tracing::debug!(base_url = %base_url, "Using API base URL from {BASE_URL_ENV}");
        settings.api_base_url = base_url.trim().to_string();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn test_load_from_dir_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"defaultLanguage": "hi", "alternateLanguages": ["en"]}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(result.is_ok());
        let settings = result.unwrap();
        assert!(settings.is_some());
        assert_eq!(settings.unwrap().default_language, "hi");
    }

    #[rstest]
    fn test_load_from_dir_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn test_load_from_dir_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "invalid json").unwrap();

        let result = load_from_dir(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    #[case::set(Some("https://prod.example.org/api ".to_string()), "https://prod.example.org/api")]
    #[case::blank(Some("  ".to_string()), "http://localhost:5000/api")]
    #[case::unset(None, "http://localhost:5000/api")]
    fn test_apply_env_overrides(#[case] value: Option<String>, #[case] expected: &str) {
        let mut settings = ClientSettings::default();

        apply_env_overrides(&mut settings, value);

        assert_eq!(settings.api_base_url, expected);
    }
}
