//! Install options shared by every driver, and the defaults filled in
//! before an install runs.

use std::path::Path;

use rand::Rng;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// User and username applied when the caller supplies none.
pub const DEFAULT_USER: &str = "dockhand";

/// Length of generated passwords.
pub const PASSWORD_LENGTH: usize = 14;

/// Attempts made by [`free_port`] before giving up.
pub const FREE_PORT_ATTEMPTS: usize = 10;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Options every installable driver accepts.
///
/// Empty strings mean "not supplied" and are left out when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub web_port: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_as_user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_folder: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_folder: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub media_folder: String,
}

impl BaseOptions {
    /// Fills every unset field with its default.
    ///
    /// Folders default to locations under `<home_root>/<run_as_user>`; the
    /// config folder is per plugin. A missing web port is allocated with
    /// [`free_port`].
    pub async fn set_defaults(&mut self, plugin: &str, home_root: &Path) -> AppResult<()> {
        if self.run_as_user.is_empty() {
            debug!(plugin = %plugin, "No run_as_user received, using default");
            self.run_as_user = DEFAULT_USER.to_string();
        }
        validate_user(&self.run_as_user)?;

        let home = home_root.join(&self.run_as_user);

        if self.password.is_empty() {
            debug!(plugin = %plugin, "No password supplied, generating one");
            self.password = random_letters(PASSWORD_LENGTH);
        }

        if self.config_folder.is_empty() {
            self.config_folder = path_string(&home.join("config").join(plugin));
        }

        if self.data_folder.is_empty() {
            self.data_folder = path_string(&home.join("data"));
        }

        if self.media_folder.is_empty() {
            self.media_folder = path_string(&home.join("media"));
        }

        if self.username.is_empty() {
            self.username = DEFAULT_USER.to_string();
        }

        if self.web_port.is_empty() {
            self.web_port = free_port().await?;
        }

        Ok(())
    }

    /// The standard `data`, `config` and `media` bind mounts.
    pub fn default_bindings(&self) -> Vec<String> {
        vec![
            format!("{}:/data", self.data_folder),
            format!("{}:/config", self.config_folder),
            format!("{}:/media", self.media_folder),
        ]
    }
}

/// Driver-specific options embedding [`BaseOptions`].
pub trait PluginOptions:
    Serialize + DeserializeOwned + Clone + Send + Sync + std::fmt::Debug + 'static
{
    fn base(&self) -> &BaseOptions;
    fn base_mut(&mut self) -> &mut BaseOptions;
}

impl PluginOptions for BaseOptions {
    fn base(&self) -> &BaseOptions {
        self
    }

    fn base_mut(&mut self) -> &mut BaseOptions {
        self
    }
}

/// `n` random ASCII letters from the OS CSPRNG.
pub fn random_letters(n: usize) -> String {
    (0..n)
        .map(|_| LETTERS[OsRng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// Picks a random port in `1024..51024` that nothing on localhost is
/// listening on.
pub async fn free_port() -> AppResult<String> {
    for _ in 0..FREE_PORT_ATTEMPTS {
        let port: u16 = rand::thread_rng().gen_range(1024..51024);
        if port_is_free(port).await {
            debug!(port, "Claimed free port");
            return Ok(port.to_string());
        }
    }
    Err(AppError::container("Could not find free port"))
}

/// A port is free when a TCP connect to `127.0.0.1:<port>` fails.
pub async fn port_is_free(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_err()
}

fn validate_user(user: &str) -> AppResult<()> {
    if user == "." || user == ".." || user.contains('/') || user.contains('\\') {
        return Err(AppError::validation(format!(
            "Invalid run_as_user '{user}'"
        )));
    }
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use dockhand_core::error::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_defaults_fill_empty_fields() {
        let mut opts = BaseOptions {
            run_as_user: "bob".to_string(),
            ..Default::default()
        };
        opts.set_defaults("deluge", Path::new("/srv/home"))
            .await
            .expect("defaults");

        assert_eq!(opts.password.len(), PASSWORD_LENGTH);
        assert!(opts.password.chars().all(|c| c.is_ascii_alphabetic()));
        assert_eq!(opts.config_folder, "/srv/home/bob/config/deluge");
        assert_eq!(opts.data_folder, "/srv/home/bob/data");
        assert_eq!(opts.media_folder, "/srv/home/bob/media");
        assert_eq!(opts.username, DEFAULT_USER);
        let port: u16 = opts.web_port.parse().expect("numeric port");
        assert!((1024..51024).contains(&port));
    }

    #[tokio::test]
    async fn test_supplied_values_kept() {
        let mut opts = BaseOptions {
            password: "hunter2".to_string(),
            web_port: "8080".to_string(),
            data_folder: "/mnt/data".to_string(),
            ..Default::default()
        };
        opts.set_defaults("deluge", Path::new("/home"))
            .await
            .expect("defaults");

        assert_eq!(opts.run_as_user, DEFAULT_USER);
        assert_eq!(opts.password, "hunter2");
        assert_eq!(opts.web_port, "8080");
        assert_eq!(opts.data_folder, "/mnt/data");
    }

    #[tokio::test]
    async fn test_traversal_user_rejected() {
        let mut opts = BaseOptions {
            run_as_user: "../root".to_string(),
            ..Default::default()
        };
        let err = opts
            .set_defaults("deluge", Path::new("/home"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_bound_port_is_not_free() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        assert!(!port_is_free(port).await);
    }

    #[test]
    fn test_default_bindings() {
        let opts = BaseOptions {
            config_folder: "/h/config/x".to_string(),
            data_folder: "/h/data".to_string(),
            media_folder: "/h/media".to_string(),
            ..Default::default()
        };
        assert_eq!(
            opts.default_bindings(),
            vec!["/h/data:/data", "/h/config/x:/config", "/h/media:/media"]
        );
    }

    #[test]
    fn test_empty_fields_not_serialized() {
        let opts = BaseOptions {
            run_as_user: "bob".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&opts).expect("json");
        assert_eq!(value, serde_json::json!({"run_as_user": "bob"}));
    }

    #[test]
    fn test_random_letters_differ() {
        assert_ne!(random_letters(PASSWORD_LENGTH), random_letters(PASSWORD_LENGTH));
    }
}
