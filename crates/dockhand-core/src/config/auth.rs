//! API credential configuration.

use serde::{Deserialize, Serialize};

/// Credentials every RPC request must present via HTTP Basic auth.
///
/// The API key is the Basic-auth username and the API secret the password.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// API key issued by the provider.
    #[serde(default)]
    pub api_key: String,
    /// API secret issued by the provider.
    #[serde(default)]
    pub api_secret: String,
}

impl AuthConfig {
    /// Whether both halves of the credential pair are set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
