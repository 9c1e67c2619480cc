use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::{RemoteCallError, SupervisorError, TransportError};
use crate::domain::models::{ProcessInfo, StartSpec};

/// Request/response access to the game peer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Invoke `service.method` with an encoded request; returns the encoded reply
    async fn query(
        &self,
        service: &str,
        method: &str,
        request: Vec<u8>,
    ) -> Result<Vec<u8>, RemoteCallError>;

    /// Release the client; later queries fail with `Disconnected`
    async fn disconnect(&self);
}

/// Lifecycle control of named long-running processes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    async fn list(&self) -> Result<Vec<ProcessInfo>, SupervisorError>;
    async fn start(&self, spec: &StartSpec) -> Result<(), SupervisorError>;
    async fn restart(&self, name: &str) -> Result<(), SupervisorError>;
    async fn disconnect(&self);
}

/// Read access to one section of the agent state
pub trait StateProvider: Send + Sync {
    /// Key of this section in the snapshot
    fn section(&self) -> &str;

    /// Current sub-state. Must not block.
    fn current_state(&self) -> anyhow::Result<Value>;
}

/// Outbound side of one observer connection
#[cfg_attr(test, mockall::automock)]
pub trait ObserverTransport: Send + Sync {
    /// Queue one text frame without waiting
    fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Ask the connection to close; further sends fail with `Closed`
    fn close(&self);
}
