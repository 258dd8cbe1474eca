//! Docker Engine connection configuration.

use serde::{Deserialize, Serialize};

/// How the daemon reaches the Docker Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Engine endpoint: `unix:///path/to/socket` or `tcp://host:port`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Connect over TLS using the certificate paths below.
    #[serde(default)]
    pub tls: bool,
    /// Ignore `endpoint` and use `DOCKER_HOST` and friends.
    #[serde(default)]
    pub from_env: bool,
    /// CA certificate, required for TLS.
    #[serde(default)]
    pub ca_path: String,
    /// Client certificate, required for TLS.
    #[serde(default)]
    pub cert_path: String,
    /// Client key, required for TLS.
    #[serde(default)]
    pub key_path: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            tls: false,
            from_env: false,
            ca_path: String::new(),
            cert_path: String::new(),
            key_path: String::new(),
        }
    }
}

fn default_endpoint() -> String {
    "unix:///var/run/docker.sock".to_string()
}
