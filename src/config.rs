//! Client settings: file loading, environment override and validation.

/// Settings file loader
mod loader;
/// Settings manager
mod manager;
/// Settings types
mod types;

pub use manager::ConfigManager;
pub use types::{
    ClientSettings,
    ConfigError,
    StorageConfig,
};
