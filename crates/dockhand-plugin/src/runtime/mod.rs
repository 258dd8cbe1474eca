//! Container runtime boundary.
//!
//! Drivers never talk to the Docker Engine directly; they go through a
//! [`ContainerRuntime`] so the daemon can run against a real engine
//! ([`docker::DockerRuntime`]) or an in-memory one in tests.

pub mod docker;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use dockhand_core::result::AppResult;

pub use bollard::models::{ContainerState, ContainerStateStatusEnum};

/// Grace period given to a container between SIGTERM and SIGKILL on stop.
pub const STOP_GRACE: Duration = Duration::from_secs(10);

/// Everything needed to create one application container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name, unique on the host.
    pub name: String,
    /// Image reference, optionally with a `:tag`.
    pub image: String,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Bind mounts in `host:container` form.
    pub binds: Vec<String>,
    /// Docker network mode, e.g. `host`. `None` uses the engine default.
    pub network_mode: Option<String>,
}

impl ContainerSpec {
    /// A spec for `image` named `name`, with no env, binds or network mode.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Environment in the `KEY=value` form the engine expects, sorted by key.
    pub fn env_list(&self) -> Vec<String> {
        let mut env: Vec<String> = self.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        env.sort();
        env
    }
}

/// The Docker Engine operations drivers rely on.
///
/// Every call may fail and may block for an unbounded time; callers apply
/// no timeout.
#[async_trait]
pub trait ContainerRuntime: Send + Sync + std::fmt::Debug {
    /// Pulls `image` (with an optional `:tag`, `latest` otherwise).
    async fn pull_image(&self, image: &str) -> AppResult<()>;

    /// Creates a container and returns its id.
    async fn create_container(&self, spec: &ContainerSpec) -> AppResult<String>;

    /// Starts an existing container.
    async fn start_container(&self, container_id: &str) -> AppResult<()>;

    /// Stops a running container, killing it after `grace`.
    async fn stop_container(&self, container_id: &str, grace: Duration) -> AppResult<()>;

    /// Force-removes a container, running or not.
    async fn remove_container(&self, container_id: &str) -> AppResult<()>;

    /// Returns the container's current state.
    async fn inspect_container(&self, container_id: &str) -> AppResult<ContainerState>;

    /// Whether a container with this id exists.
    async fn container_exists(&self, container_id: &str) -> AppResult<bool>;
}

/// Splits `repo[:tag]` into its parts, defaulting the tag to `latest`.
///
/// A colon inside a registry host (`host:5000/repo`) is not a tag separator.
pub fn split_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, tag),
        _ => (image, "latest"),
    }
}
