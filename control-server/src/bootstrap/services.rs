use anyhow::{ensure, Result};
use std::sync::Arc;

use crate::adapters::infrastructure::{Scheduler, StateBoard};
use crate::adapters::outbound::{HttpRemoteCall, Pm2Supervisor};
use crate::application::liquidator::WAREHOUSE_SECTION;
use crate::application::state_aggregator::{CONNECTION_SECTION, USER_SECTION};
use crate::application::{
    ActionDispatcher, BroadcastHub, ControlPlane, Liquidator, LiquidatorSettings,
    ManagedProcess, StateAggregator, TriggerService,
};
use crate::config::Config;
use crate::domain::models::TIMESTAMP_KEY;
use crate::domain::services::TriggerDebouncer;
use crate::ports::{ProcessSupervisor, RemoteCall, StateProvider};

pub struct ServiceRegistry {
    pub control_plane: Arc<ControlPlane>,
    pub trigger: Arc<TriggerService>,
    pub hub: Arc<BroadcastHub>,
    pub liquidator: Arc<Liquidator>,
    pub state_board: Arc<StateBoard>,
    /// Sections agents may publish to the state board
    pub state_sections: Vec<String>,
}

/// Snapshot keys that are not backed by the state board
const RESERVED_SECTIONS: [&str; 2] = [TIMESTAMP_KEY, WAREHOUSE_SECTION];

/// Sections published through the state board: identity, connection, then
/// the configured agent sections in order. Reserved keys are skipped.
fn board_sections(config: &Config) -> Vec<String> {
    let mut sections = vec![USER_SECTION.to_string(), CONNECTION_SECTION.to_string()];
    for section in &config.state.sections {
        if RESERVED_SECTIONS.contains(&section.as_str()) {
            tracing::warn!(section = %section, "Ignoring reserved state section");
            continue;
        }
        if !sections.contains(section) {
            sections.push(section.clone());
        }
    }
    sections
}

pub fn setup(config: &Config) -> Result<ServiceRegistry> {
    ensure!(
        config.liquidation.id_min <= config.liquidation.id_max,
        "liquidation.id_min ({}) must not exceed liquidation.id_max ({})",
        config.liquidation.id_min,
        config.liquidation.id_max
    );

    // Outbound clients
    let remote: Arc<dyn RemoteCall> = Arc::new(HttpRemoteCall::new(&config.remote));
    tracing::info!(
        "Remote call client: {} (timeout {}ms)",
        config.remote.base_url,
        config.remote.timeout_ms
    );
    let supervisor: Arc<dyn ProcessSupervisor> = Arc::new(Pm2Supervisor::new(&config.supervisor));
    tracing::info!("Process supervisor: {}", config.supervisor.pm2_bin);

    // State sources
    let state_board = Arc::new(StateBoard::new());
    let state_sections = board_sections(config);
    let liquidator = Arc::new(Liquidator::new(
        remote.clone(),
        LiquidatorSettings::from(&config.liquidation),
    ));

    let mut providers: Vec<Arc<dyn StateProvider>> = state_sections
        .iter()
        .map(|section| state_board.section_provider(section))
        .collect();
    providers.push(liquidator.clone());

    let aggregator = Arc::new(StateAggregator::new(providers));
    tracing::info!(
        "State aggregator sections: {}",
        aggregator.sections().collect::<Vec<_>>().join(", ")
    );

    let hub = Arc::new(BroadcastHub::new(aggregator));

    // Trigger path
    let process = ManagedProcess::from(&config.trigger);
    tracing::info!(
        "Managed process: {} ({}), debounce {}s",
        process.name,
        process.script,
        config.trigger.debounce_secs
    );
    let trigger = Arc::new(TriggerService::new(
        TriggerDebouncer::new(config.trigger.debounce_window()),
        ActionDispatcher::new(supervisor.clone(), process),
    ));

    // Timers
    let control_plane = Arc::new(ControlPlane::new(
        Arc::new(Scheduler::new()),
        hub.clone(),
        liquidator.clone(),
        supervisor,
        remote,
        config.broadcast.interval(),
        config.liquidation.enabled,
    ));
    control_plane.start();

    Ok(ServiceRegistry {
        control_plane,
        trigger,
        hub,
        liquidator,
        state_board,
        state_sections,
    })
}
