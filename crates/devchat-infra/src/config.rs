//! Configuration loader for devchat.
//!
//! Reads `config.toml` (by default `{config_dir}/devchat/config.toml`) and
//! deserializes it into [`AppConfig`]. Every field has a default, so a
//! partial file only overrides what it names.

use std::path::{Path, PathBuf};

use devchat_types::config::AppConfig;
use devchat_types::error::ConfigError;

/// Default location of the config file, when a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("devchat").join("config.toml"))
}

/// Load configuration from `path`, falling back to defaults.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match parse_config(path, &content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            AppConfig::default()
        }
    }
}

/// Load configuration from `path`, reporting every failure.
///
/// Used for a config file named explicitly on the command line, where a
/// missing or broken file should stop start-up.
pub async fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str::<AppConfig>(content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
