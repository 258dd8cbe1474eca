//! Plugin manifests: static metadata describing a driver's RPC surface to
//! front-ends.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// Metadata a driver publishes through `CoreRPC.GetManifests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub version: f32,
    /// RPC methods a front-end may call.
    #[serde(default)]
    pub exposed_methods: Vec<String>,
    /// Method name → options the method accepts.
    #[serde(default)]
    pub method_options: BTreeMap<String, Vec<MethodOption>>,
    /// Option names a front-end should display after install.
    #[serde(default)]
    pub show_options: Vec<String>,
    /// Human-readable application name.
    pub name: String,
    /// RPC service name the driver registers under.
    pub rpc_name: String,
    /// Format string for the application's web URL.
    #[serde(default)]
    pub web_url_format: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
}

/// One option accepted by a manifest method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodOption {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(rename = "type")]
    pub option_type: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub allow_deletion: bool,
}

impl Manifest {
    /// Parses a manifest from TOML text.
    pub fn from_toml(text: &str) -> AppResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Loads the manifest for plugin `name`.
///
/// `<override_dir>/<name>.toml` wins when it exists and parses. A missing or
/// unreadable override falls back to `builtin`; a broken built-in manifest is
/// an error and the plugin must not be constructed.
pub fn load_manifest(name: &str, builtin: &str, override_dir: Option<&Path>) -> AppResult<Manifest> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{name}.toml"));
        if path.is_file() {
            debug!(plugin = %name, path = %path.display(), "Custom manifest found");
            match std::fs::read_to_string(&path)
                .map_err(AppError::from)
                .and_then(|text| Manifest::from_toml(&text))
            {
                Ok(manifest) => return Ok(manifest),
                Err(e) => {
                    warn!(
                        plugin = %name,
                        path = %path.display(),
                        error = %e,
                        "Could not load custom manifest, using built-in"
                    );
                }
            }
        }
    }

    debug!(plugin = %name, "Using built-in manifest");
    Manifest::from_toml(builtin).map_err(|e| {
        AppError::plugin(format!("Built-in manifest for '{name}' is invalid: {}", e.message))
    })
}
