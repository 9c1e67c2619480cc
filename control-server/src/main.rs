use anyhow::{Context, Result};
use farm_agent_control::bootstrap;
use std::net::SocketAddr;
use std::sync::Arc;

use farm_agent_control::application::ControlPlane;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Bootstrap the application (config, logging, timers, API router)
    let app = bootstrap::setup()?;
    let control_plane = app.control_plane.clone();

    let listener = tokio::net::TcpListener::bind(app.socket_addr)
        .await
        .with_context(|| format!("Failed to bind {}", app.bind_address))?;
    tracing::info!("HTTP server listening on http://{}", app.bind_address);

    let server = axum::serve(
        listener,
        app.router
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_on_signal(control_plane.clone()));

    if let Err(e) = server.await {
        tracing::error!("HTTP server exited with error: {}", e);
    }

    // No-op after a signal-driven shutdown
    control_plane.shutdown().await;
    tracing::info!("Server stopped");

    drop(app.log_guard);
    Ok(())
}

/// Resolves once the control plane has been shut down after SIGINT/SIGTERM,
/// so that open observer connections are already closed when axum drains.
async fn shutdown_on_signal(control_plane: Arc<ControlPlane>) {
    shutdown_signal().await;
    control_plane.shutdown().await;
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
}
