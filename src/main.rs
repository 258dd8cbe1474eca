//! Dockhand daemon: installs and manages containerized applications for a
//! remote controller over authenticated JSON-RPC.
//!
//! Main entry point that wires all crates together and starts the server.

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use dockhand_core::config::{self, AppConfig};
use dockhand_core::error::AppError;
use dockhand_jobs::JobStore;
use dockhand_plugin::runtime::docker::DockerRuntime;
use dockhand_plugin::{ContainerRuntime, JobsPlugin, PluginContext};
use dockhand_rpc::{AppState, RpcEngineBuilder, build_router, serve};
use plugin_deluge::DelugePlugin;
use plugin_proxy::ProxyPlugin;
use plugin_stats::StatsPlugin;

#[derive(Parser, Debug)]
#[command(name = "dockhand-server")]
#[command(about = "Container application daemon controlled over JSON-RPC")]
#[command(version)]
struct Cli {
    /// Port the RPC listener binds to
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Docker endpoint, e.g. unix:///var/run/docker.sock or tcp://host:2376
    #[arg(long, global = true)]
    docker_endpoint: Option<String>,

    /// Connect to Docker over TLS
    #[arg(long, global = true)]
    docker_tls: bool,

    /// Take Docker settings from DOCKER_HOST and friends
    #[arg(long, global = true)]
    docker_env: bool,

    /// CA certificate for Docker TLS
    #[arg(long, global = true)]
    docker_ca_path: Option<String>,

    /// Client certificate for Docker TLS
    #[arg(long, global = true)]
    docker_cert_path: Option<String>,

    /// Client key for Docker TLS
    #[arg(long, global = true)]
    docker_key_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration file holding the API credentials
    Init {
        /// API key issued by the controller
        api_key: String,
        /// API secret issued by the controller
        api_secret: String,
    },
    /// Start the daemon
    Start,
}

impl Cli {
    /// Applies command-line overrides on top of loaded configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(endpoint) = &self.docker_endpoint {
            config.docker.endpoint = endpoint.clone();
        }
        if self.docker_tls {
            config.docker.tls = true;
        }
        if self.docker_env {
            config.docker.from_env = true;
        }
        if let Some(path) = &self.docker_ca_path {
            config.docker.ca_path = path.clone();
        }
        if let Some(path) = &self.docker_cert_path {
            config.docker.cert_path = path.clone();
        }
        if let Some(path) = &self.docker_key_path {
            config.docker.key_path = path.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let path = config::config_path();

    let result = match &cli.command {
        Command::Init {
            api_key,
            api_secret,
        } => init(&cli, &path, api_key, api_secret),
        Command::Start => match load_configuration(&cli, &path) {
            Ok(config) => {
                init_logging(&config);
                run(config).await
            }
            Err(e) => {
                eprintln!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        tracing::error!("Dockhand error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Writes a fresh configuration file with the given credentials.
fn init(cli: &Cli, path: &Path, api_key: &str, api_secret: &str) -> Result<(), AppError> {
    let mut config = AppConfig::default();
    config.auth.api_key = api_key.to_string();
    config.auth.api_secret = api_secret.to_string();
    cli.apply(&mut config);

    if !config.auth.is_configured() {
        return Err(AppError::validation("API key and secret must not be empty"));
    }

    config.write(path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

/// Load configuration from file and environment, then apply flags
fn load_configuration(cli: &Cli, path: &Path) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(path).map_err(|e| {
        AppError::configuration(format!(
            "{} (run `dockhand-server init <api_key> <api_secret>` first)",
            e.message
        ))
    })?;
    cli.apply(&mut config);
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Dockhand v{}", dockhand_core::VERSION);

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerRuntime::connect(&config.docker)?);
    let jobs = Arc::new(JobStore::new());
    let ctx = PluginContext::from_config(&config, runtime, Arc::clone(&jobs));

    let mut engine = RpcEngineBuilder::new(dockhand_core::VERSION);

    match DelugePlugin::new(&ctx) {
        Ok(plugin) => engine.activate(Arc::new(plugin))?,
        Err(e) => tracing::info!(plugin = "deluge", error = %e, "Skipping plugin that failed to load"),
    }
    engine.activate(Arc::new(StatsPlugin::new()))?;
    engine.activate(Arc::new(JobsPlugin::new(jobs)))?;
    engine.activate(Arc::new(ProxyPlugin::new(config.proxies_path())))?;

    tracing::info!(plugins = engine.plugin_count(), "Plugins activated");
    let engine = engine.build()?;

    let app = build_router(AppState::new(engine, config.auth.clone()));
    serve(&config.server, app, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
