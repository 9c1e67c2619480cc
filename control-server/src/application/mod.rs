pub mod action_dispatcher;
pub mod broadcast_hub;
pub mod control_plane;
pub mod liquidator;
pub mod state_aggregator;
pub mod trigger_service;

pub use action_dispatcher::{ActionDispatcher, ManagedProcess};
pub use broadcast_hub::{BroadcastHub, ObserverId, TickReport};
pub use control_plane::ControlPlane;
pub use liquidator::{Liquidator, LiquidatorSettings};
pub use state_aggregator::StateAggregator;
pub use trigger_service::{TriggerError, TriggerService};
