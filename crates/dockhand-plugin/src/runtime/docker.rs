//! [`ContainerRuntime`] backed by the Docker Engine API via `bollard`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use futures::TryStreamExt;
use tracing::{debug, info};

use dockhand_core::config::DockerConfig;
use dockhand_core::error::{AppError, ErrorKind};
use dockhand_core::result::AppResult;

use super::{ContainerRuntime, ContainerSpec, ContainerState, split_image_tag};

/// Maps a Docker Engine error into the application error space.
///
/// A 404 from the engine becomes `NotFound`; everything else is a
/// `Container` error carrying the engine's message.
pub fn docker_error(context: &str, err: bollard::errors::Error) -> AppError {
    let kind = match &err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => ErrorKind::NotFound,
        _ => ErrorKind::Container,
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

/// Client timeout handed to bollard on every connect path.
///
/// Engine calls are never cut short: a hung call keeps its job `Busy`.
/// tokio treats a deadline past the end of its clock as "never".
pub const NO_TIMEOUT: Duration = Duration::from_secs(u64::MAX);

/// Docker Engine client.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Wraps an already-connected client.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connects according to the `[docker]` configuration section.
    ///
    /// `from_env` honours `DOCKER_HOST` and friends; `tls` requires all three
    /// certificate paths; otherwise `endpoint` selects a unix socket or a
    /// plain HTTP address by its scheme.
    pub fn connect(config: &DockerConfig) -> AppResult<Self> {
        let timeout = NO_TIMEOUT.as_secs();
        let version = bollard::API_DEFAULT_VERSION;

        let docker = if config.from_env {
            info!("Connecting to Docker using environment settings");
            Docker::connect_with_defaults().map(|docker| docker.with_timeout(NO_TIMEOUT))
        } else if config.tls {
            if config.ca_path.is_empty() || config.cert_path.is_empty() || config.key_path.is_empty()
            {
                return Err(AppError::configuration(
                    "Docker TLS requires ca_path, cert_path and key_path",
                ));
            }
            info!(endpoint = %config.endpoint, "Connecting to Docker over TLS");
            Docker::connect_with_ssl(
                &config.endpoint,
                Path::new(&config.key_path),
                Path::new(&config.cert_path),
                Path::new(&config.ca_path),
                timeout,
                version,
            )
        } else if let Some(socket) = config.endpoint.strip_prefix("unix://") {
            info!(socket = %socket, "Connecting to Docker over unix socket");
            Docker::connect_with_unix(socket, timeout, version)
        } else {
            info!(endpoint = %config.endpoint, "Connecting to Docker over HTTP");
            Docker::connect_with_http(&config.endpoint, timeout, version)
        };

        let docker = docker.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Could not connect to Docker: {e}"),
                e,
            )
        })?;

        Ok(Self::new(docker))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pull_image(&self, image: &str) -> AppResult<()> {
        let (repo, tag) = split_image_tag(image);
        debug!(image = %repo, tag = %tag, "Pulling docker image");

        let options = CreateImageOptions {
            from_image: repo,
            tag,
            ..Default::default()
        };
        self.docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| docker_error(&format!("Failed to pull image '{image}'"), e))?;

        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> AppResult<String> {
        let host_config = HostConfig {
            binds: if spec.binds.is_empty() {
                None
            } else {
                Some(spec.binds.clone())
            },
            network_mode: spec.network_mode.clone(),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_list()),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        debug!(name = %spec.name, image = %spec.image, "Creating docker container");
        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| docker_error(&format!("Failed to create container '{}'", spec.name), e))?;

        Ok(response.id)
    }

    async fn start_container(&self, container_id: &str) -> AppResult<()> {
        debug!(container_id = %container_id, "Starting docker container");
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| docker_error(&format!("Failed to start container '{container_id}'"), e))
    }

    async fn stop_container(&self, container_id: &str, grace: Duration) -> AppResult<()> {
        debug!(container_id = %container_id, "Stopping docker container");
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.docker
            .stop_container(container_id, Some(options))
            .await
            .map_err(|e| docker_error(&format!("Failed to stop container '{container_id}'"), e))
    }

    async fn remove_container(&self, container_id: &str) -> AppResult<()> {
        debug!(container_id = %container_id, "Removing docker container");
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.docker
            .remove_container(container_id, Some(options))
            .await
            .map_err(|e| docker_error(&format!("Failed to remove container '{container_id}'"), e))
    }

    async fn inspect_container(&self, container_id: &str) -> AppResult<ContainerState> {
        let response = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| {
                docker_error(&format!("Failed to inspect container '{container_id}'"), e)
            })?;

        Ok(response.state.unwrap_or_default())
    }

    async fn container_exists(&self, container_id: &str) -> AppResult<bool> {
        let mut filters = HashMap::new();
        filters.insert("id".to_string(), vec![container_id.to_string()]);

        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| docker_error("Failed to list containers", e))?;

        Ok(!containers.is_empty())
    }
}
