use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::models::{Identity, Snapshot};
use crate::ports::StateProvider;

/// Section carrying the account identity
pub const USER_SECTION: &str = "user";
/// Section carrying the peer connection status
pub const CONNECTION_SECTION: &str = "connection";

/// Builds one [`Snapshot`] from all registered providers
pub struct StateAggregator {
    providers: Vec<Arc<dyn StateProvider>>,
}

impl StateAggregator {
    pub fn new(providers: Vec<Arc<dyn StateProvider>>) -> Self {
        Self { providers }
    }

    /// Read every provider exactly once.
    ///
    /// A provider that fails contributes `null` for its section.
    pub fn snapshot(&self) -> Snapshot {
        let mut user = None;
        let mut connection = None;
        let mut sections = BTreeMap::new();

        for provider in &self.providers {
            let section = provider.section();
            let state = match provider.current_state() {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::debug!(section, error = %e, "State provider unavailable");
                    None
                }
            };

            match section {
                USER_SECTION => user = state.and_then(parse_identity),
                CONNECTION_SECTION => connection = state,
                _ => {
                    sections.insert(section.to_string(), state);
                }
            }
        }

        Snapshot::new(Utc::now(), user, connection, sections)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|provider| provider.section())
    }
}

fn parse_identity(value: Value) -> Option<Identity> {
    match serde_json::from_value(value) {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!(error = %e, "User state does not match the identity shape");
            None
        }
    }
}
