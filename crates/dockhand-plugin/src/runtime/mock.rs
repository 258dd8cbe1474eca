//! In-memory [`ContainerRuntime`] for tests.
//!
//! Records every call, keeps containers in a map, can hold image pulls open
//! until released, and can be told to fail a given operation.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

use super::{ContainerRuntime, ContainerSpec, ContainerState, ContainerStateStatusEnum};

/// A container as the mock engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockContainer {
    pub id: String,
    pub spec: ContainerSpec,
    pub running: bool,
}

#[derive(Debug, Default)]
struct MockState {
    containers: HashMap<String, MockContainer>,
    pulled: Vec<String>,
    calls: Vec<String>,
    failures: HashMap<String, String>,
    panics: HashSet<String>,
    next_id: u64,
}

/// In-memory container engine.
#[derive(Debug)]
pub struct MockRuntime {
    state: Mutex<MockState>,
    pulls_paused: watch::Sender<bool>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    /// An empty engine with pulls flowing.
    pub fn new() -> Self {
        let (pulls_paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(MockState::default()),
            pulls_paused,
        }
    }

    /// Makes subsequent `pull_image` calls wait until [`resume_pulls`](Self::resume_pulls).
    pub fn pause_pulls(&self) {
        self.pulls_paused.send_replace(true);
    }

    /// Releases every waiting and future `pull_image` call.
    pub fn resume_pulls(&self) {
        self.pulls_paused.send_replace(false);
    }

    /// Makes every later call of `operation` (e.g. `"pull_image"`) fail
    /// with a `Container` error carrying `message`.
    pub async fn fail_on(&self, operation: &str, message: &str) {
        let mut state = self.state.lock().await;
        state
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    /// Makes every later call of `operation` panic, as a buggy engine
    /// client would.
    pub async fn panic_on(&self, operation: &str) {
        self.state.lock().await.panics.insert(operation.to_string());
    }

    /// Adds a container directly, bypassing `create_container`.
    pub async fn insert_container(&self, spec: ContainerSpec, running: bool) -> String {
        let mut state = self.state.lock().await;
        let id = next_container_id(&mut state);
        state.containers.insert(
            id.clone(),
            MockContainer {
                id: id.clone(),
                spec,
                running,
            },
        );
        id
    }

    /// Snapshot of a container by id.
    pub async fn container(&self, container_id: &str) -> Option<MockContainer> {
        self.state.lock().await.containers.get(container_id).cloned()
    }

    /// Number of containers currently known.
    pub async fn container_count(&self) -> usize {
        self.state.lock().await.containers.len()
    }

    /// Images pulled so far, in order.
    pub async fn pulled_images(&self) -> Vec<String> {
        self.state.lock().await.pulled.clone()
    }

    /// Every call made so far, as `operation:argument`.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    async fn record(&self, operation: &str, argument: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("{operation}:{argument}"));
        if state.panics.contains(operation) {
            panic!("mock engine panicked in {operation}");
        }
        match state.failures.get(operation) {
            Some(message) => Err(AppError::container(message.clone())),
            None => Ok(()),
        }
    }
}

fn next_container_id(state: &mut MockState) -> String {
    state.next_id += 1;
    format!("{:064x}", state.next_id)
}

fn missing(container_id: &str) -> AppError {
    AppError::not_found(format!("No such container: {container_id}"))
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn pull_image(&self, image: &str) -> AppResult<()> {
        let mut paused = self.pulls_paused.subscribe();
        paused
            .wait_for(|paused| !*paused)
            .await
            .map_err(|_| AppError::internal("mock pull gate closed"))?;

        self.record("pull_image", image).await?;
        self.state.lock().await.pulled.push(image.to_string());
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> AppResult<String> {
        self.record("create_container", &spec.name).await?;

        let mut state = self.state.lock().await;
        if state.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(AppError::conflict(format!(
                "Container name '{}' is already in use",
                spec.name
            )));
        }
        let id = next_container_id(&mut state);
        state.containers.insert(
            id.clone(),
            MockContainer {
                id: id.clone(),
                spec: spec.clone(),
                running: false,
            },
        );
        Ok(id)
    }

    async fn start_container(&self, container_id: &str) -> AppResult<()> {
        self.record("start_container", container_id).await?;
        let mut state = self.state.lock().await;
        let container = state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| missing(container_id))?;
        container.running = true;
        Ok(())
    }

    async fn stop_container(&self, container_id: &str, _grace: Duration) -> AppResult<()> {
        self.record("stop_container", container_id).await?;
        let mut state = self.state.lock().await;
        let container = state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| missing(container_id))?;
        container.running = false;
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> AppResult<()> {
        self.record("remove_container", container_id).await?;
        let mut state = self.state.lock().await;
        state
            .containers
            .remove(container_id)
            .map(|_| ())
            .ok_or_else(|| missing(container_id))
    }

    async fn inspect_container(&self, container_id: &str) -> AppResult<ContainerState> {
        self.record("inspect_container", container_id).await?;
        let state = self.state.lock().await;
        let container = state
            .containers
            .get(container_id)
            .ok_or_else(|| missing(container_id))?;

        let status = if container.running {
            ContainerStateStatusEnum::RUNNING
        } else {
            ContainerStateStatusEnum::EXITED
        };
        Ok(ContainerState {
            status: Some(status),
            running: Some(container.running),
            ..Default::default()
        })
    }

    async fn container_exists(&self, container_id: &str) -> AppResult<bool> {
        self.record("container_exists", container_id).await?;
        Ok(self.state.lock().await.containers.contains_key(container_id))
    }
}
