use serde::Serialize;
use tokio::time::Instant;

/// Debouncer verdict for one trigger payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    /// An identical payload was accepted at `since`
    Suppressed { since: Instant },
    Rejected,
}

/// What the dispatcher did with the managed process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DispatchOutcome {
    Start {
        target: String,
        /// Launch command with the payload redacted
        command: String,
    },
    Restart {
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },
}

impl DispatchOutcome {
    pub fn target(&self) -> &str {
        match self {
            Self::Start { target, .. } | Self::Restart { target, .. } => target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Dispatched(DispatchOutcome),
    Debounced,
}
