use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::infrastructure::Scheduler;
use crate::application::{BroadcastHub, Liquidator};
use crate::ports::{ProcessSupervisor, RemoteCall};

/// Owns the timers and outbound clients and tears them down in order
pub struct ControlPlane {
    scheduler: Arc<Scheduler>,
    hub: Arc<BroadcastHub>,
    liquidator: Arc<Liquidator>,
    supervisor: Arc<dyn ProcessSupervisor>,
    remote: Arc<dyn RemoteCall>,
    broadcast_period: Duration,
    liquidation_enabled: bool,
    shut_down: AtomicBool,
}

impl ControlPlane {
    pub fn new(
        scheduler: Arc<Scheduler>,
        hub: Arc<BroadcastHub>,
        liquidator: Arc<Liquidator>,
        supervisor: Arc<dyn ProcessSupervisor>,
        remote: Arc<dyn RemoteCall>,
        broadcast_period: Duration,
        liquidation_enabled: bool,
    ) -> Self {
        Self {
            scheduler,
            hub,
            liquidator,
            supervisor,
            remote,
            broadcast_period,
            liquidation_enabled,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Register the broadcast tick and, when enabled, the sell loop
    pub fn start(&self) {
        self.hub.start(&self.scheduler, self.broadcast_period);

        if self.liquidation_enabled {
            self.liquidator.schedule(&self.scheduler);
        } else {
            tracing::info!("Automatic selling disabled");
        }
    }

    /// Stop timers, close observers, then release the outbound clients.
    ///
    /// Returns `false` without side effects when already shut down.
    pub async fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already performed");
            return false;
        }

        tracing::info!("Shutting down control plane...");

        let cancelled = self.scheduler.cancel_all();
        tracing::info!(cancelled, "Scheduled tasks stopped");

        self.hub.shutdown();
        self.supervisor.disconnect().await;
        self.remote.disconnect().await;

        tracing::info!("Control plane shut down");
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn liquidator(&self) -> &Arc<Liquidator> {
        &self.liquidator
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}
