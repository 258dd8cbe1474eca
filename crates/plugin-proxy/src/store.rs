//! TOML-backed proxy list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// One proxied route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    /// Public URL the front proxy answers on. Unique within the list.
    #[serde(default)]
    pub source: String,
    /// URL requests are forwarded to.
    #[serde(default)]
    pub target: String,
    /// Controller-side reference for the route.
    #[serde(default)]
    pub external_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProxyFile {
    #[serde(default)]
    proxies: Vec<Proxy>,
}

/// The proxy list on disk.
///
/// Every operation reads the file fresh, so edits made by hand between
/// calls are honoured. A missing file is an empty list. Read-modify-write
/// cycles are serialized by an internal lock.
#[derive(Debug)]
pub struct ProxyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProxyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All routes in insertion order.
    pub async fn list(&self) -> AppResult<Vec<Proxy>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Appends `proxy` unless its source is already routed, and returns the
    /// resulting list. An existing route is left untouched.
    pub async fn add(&self, proxy: Proxy) -> AppResult<Vec<Proxy>> {
        if proxy.source.is_empty() || proxy.target.is_empty() {
            return Err(AppError::validation("Proxy source and target are required"));
        }

        let _guard = self.lock.lock().await;
        let mut proxies = self.read().await?;

        if proxies.iter().any(|p| p.source == proxy.source) {
            debug!(source = %proxy.source, "Source already proxied, not adding again");
            return Ok(proxies);
        }

        info!(source = %proxy.source, target = %proxy.target, "Adding proxy");
        proxies.push(proxy);
        self.write(&proxies).await?;
        Ok(proxies)
    }

    /// Drops the route for `source`, if any, and returns the resulting list.
    pub async fn remove(&self, source: &str) -> AppResult<Vec<Proxy>> {
        if source.is_empty() {
            return Err(AppError::validation("Proxy source is required"));
        }

        let _guard = self.lock.lock().await;
        let mut proxies = self.read().await?;

        let before = proxies.len();
        proxies.retain(|p| p.source != source);
        if proxies.len() == before {
            debug!(source = %source, "No proxy to remove");
            return Ok(proxies);
        }

        info!(source = %source, "Removing proxy");
        self.write(&proxies).await?;
        Ok(proxies)
    }

    async fn read(&self) -> AppResult<Vec<Proxy>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(toml::from_str::<ProxyFile>(&raw)?.proxies),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, proxies: &[Proxy]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = ProxyFile {
            proxies: proxies.to_vec(),
        };
        tokio::fs::write(&self.path, toml::to_string_pretty(&file)?).await?;

        debug!(path = %self.path.display(), count = proxies.len(), "Wrote proxy list");
        Ok(())
    }
}
