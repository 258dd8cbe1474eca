//! # dockhand-plugin
//!
//! The capability contract every application driver satisfies:
//!
//! - [`BasePlugin`]: identity, manifest, and RPC registration
//! - [`InstallablePlugin`]: container lifecycle addressed by container id
//! - [`Installer`]: the driver-specific install step
//!
//! plus the shared [`DispatchTable`] plugins register into, the generic
//! [`InstallableService`] adapter that turns any installer into the standard
//! RPC surface, the built-in `Jobs` service, and the [`ContainerRuntime`]
//! boundary to the Docker Engine.

pub mod adapter;
pub mod context;
pub mod dispatch;
pub mod jobs;
pub mod manifest;
pub mod options;
pub mod runtime;
pub mod traits;

pub use adapter::InstallableService;
pub use context::PluginContext;
pub use dispatch::{DispatchTable, RpcHandler};
pub use jobs::JobsPlugin;
pub use manifest::{Manifest, MethodOption};
pub use options::{BaseOptions, PluginOptions};
pub use runtime::{ContainerRuntime, ContainerSpec, ContainerState};
pub use traits::{BasePlugin, InstallablePlugin, Installer};
