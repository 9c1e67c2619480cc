use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::inbound::http::{create_router, AppState};
use crate::bootstrap::{services::ServiceRegistry, Application};

pub fn setup(
    config: crate::config::Config,
    registry: ServiceRegistry,
    log_guard: Option<WorkerGuard>,
) -> Result<Application> {
    let server_address = config.server_address();
    tracing::info!("Server will listen on: {}", server_address);

    let app_state = AppState {
        trigger: registry.trigger,
        hub: registry.hub,
        liquidator: registry.liquidator,
        state_board: registry.state_board,
        state_sections: Arc::new(registry.state_sections),
        outbound_buffer: config.broadcast.outbound_buffer,
    };

    // Build API router
    let app = create_router(app_state);
    tracing::info!("API router built");

    // Parse bind address
    let socket_addr: SocketAddr = server_address
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", server_address, e))?;

    Ok(Application {
        router: app,
        bind_address: server_address,
        socket_addr,
        control_plane: registry.control_plane,
        log_guard,
    })
}
