use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::application::ControlPlane;

pub mod logging;
pub mod server;
pub mod services;

pub struct Application {
    pub router: Router,
    pub bind_address: String,
    pub socket_addr: SocketAddr,
    pub control_plane: Arc<ControlPlane>,
    /// Flushes file logging on drop
    pub log_guard: Option<WorkerGuard>,
}

pub fn setup() -> Result<Application> {
    // 1. Load Configuration
    let config = load_config();

    // 2. Setup Logging
    let log_guard = logging::setup(&config);

    // 3. Setup Services & Background Tasks
    let registry = services::setup(&config)?;

    // 4. Setup Server (router & bind address)
    server::setup(config, registry, log_guard)
}

fn load_config() -> crate::config::Config {
    use crate::config::Config;

    // Determine config directory
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| ".".to_string())
    });
    let config_base = format!("{}/config", config_dir);

    eprintln!(
        "Config directory: {}, config base: {}",
        config_dir, config_base
    );

    // Load configuration
    match Config::from_file(&config_base) {
        Ok(cfg) => {
            eprintln!("Configuration loaded successfully from {}", config_base);
            cfg
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}, using defaults", e);
            Config::default()
        }
    }
}
