//! Daemon configuration schema.
//!
//! The configuration is a TOML file (by default
//! `$HOME/.config/dockhand/config.toml`) merged with environment variables
//! of the form `DOCKHAND__SECTION__KEY`. Each sub-module represents one
//! section.

pub mod auth;
pub mod docker;
pub mod logging;
pub mod plugin;
pub mod server;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::docker::DockerConfig;
pub use self::logging::LoggingConfig;
pub use self::plugin::PluginConfig;
pub use self::server::ServerConfig;

use crate::error::AppError;

/// File name of the daemon configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// RPC listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// API credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Docker Engine connection.
    #[serde(default)]
    pub docker: DockerConfig,
    /// Application driver settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file plus `DOCKHAND__*` overrides.
    ///
    /// A missing file is an error: the daemon refuses to start without
    /// credentials written by `init`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("DOCKHAND")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        if !loaded.auth.is_configured() {
            return Err(AppError::configuration(
                "api_key and api_secret must both be set; run `init` first",
            ));
        }

        Ok(loaded)
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(path, rendered)?;

        tracing::debug!(path = %path.display(), "Wrote config file");
        Ok(())
    }

    /// Directory searched for manifest overrides.
    pub fn manifest_dir(&self) -> PathBuf {
        self.plugins
            .manifest_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("manifests"))
    }

    /// File the proxy list is stored in.
    pub fn proxies_path(&self) -> PathBuf {
        self.plugins
            .proxies_file
            .clone()
            .unwrap_or_else(|| config_dir().join(PROXIES_FILE_NAME))
    }
}

/// File name of the proxy list inside the config directory.
pub const PROXIES_FILE_NAME: &str = "proxies.toml";

/// The per-user configuration directory, `$HOME/.config/dockhand`.
pub fn config_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("dockhand")
}

/// Path of the configuration file, honouring `DOCKHAND_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var_os("DOCKHAND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join(CONFIG_FILE_NAME))
}
