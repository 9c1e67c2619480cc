use tracing_appender::non_blocking::WorkerGuard;

use crate::logging;

pub fn setup(config: &crate::config::Config) -> Option<WorkerGuard> {
    let guard = logging::init(&config.logging);

    tracing::info!("Starting farm agent control server...");
    tracing::info!("Server Version: {}", env!("CARGO_PKG_VERSION"));

    if config.logging.enabled {
        tracing::info!(
            "File logging enabled: directory={}, prefix={}, rotation={}",
            config.logging.directory,
            config.logging.file_prefix,
            config.logging.rotation
        );
    }

    guard
}
