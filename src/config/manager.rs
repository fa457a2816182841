//! Settings management.

use std::path::PathBuf;

use super::{
    ClientSettings,
    ConfigError,
    loader,
};

/// Holds the validated settings for the running client.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Current settings
    current_settings: ClientSettings,

    /// Directory the settings were loaded from
    config_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: ClientSettings::default(), config_root: None }
    }

    /// Loads settings from `config_root` (or defaults), applies the
    /// `PORTAL_API_BASE_URL` override and validates the result.
    ///
    /// # Errors
    /// - File read failure
    /// - JSON parse failure
    /// - Validation failure
    pub fn load_settings(&mut self, config_root: Option<PathBuf>) -> Result<(), ConfigError> {
        self.load_settings_with_override(config_root, std::env::var(loader::BASE_URL_ENV).ok())
    }

    /// Same as [`Self::load_settings`] with an explicit base URL override
    /// instead of reading the environment.
    pub fn load_settings_with_override(
        &mut self,
        config_root: Option<PathBuf>,
        base_url_override: Option<String>,
    ) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings from: {:?}", config_root);

        let mut settings = if let Some(root) = &config_root {
            loader::load_from_dir(root)?.map_or_else(ClientSettings::default, |loaded| {
                tracing::debug!("Loaded settings file: {:?}", loaded);
                loaded
            })
        } else {
            ClientSettings::default()
        };
        loader::apply_env_overrides(&mut settings, base_url_override);

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.config_root = config_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// Replaces the settings after validating them.
    pub fn update_settings(&mut self, new_settings: ClientSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &ClientSettings {
        &self.current_settings
    }

    #[must_use]
    pub const fn config_root(&self) -> Option<&PathBuf> {
        self.config_root.as_ref()
    }
}
