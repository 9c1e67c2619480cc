//! Error taxonomy for the control plane
//!
//! Each failure class maps to one handling policy: validation errors are
//! answered locally, remote call errors abort the current sell cycle,
//! supervisor errors are returned to the trigger caller, and transport
//! errors only ever affect the observer they came from.

use farm_agent_bridge::BridgeError;
use thiserror::Error;

/// Malformed or empty trigger input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid code parameter")]
    EmptyCode,

    #[error("Invalid request: {0}")]
    Malformed(String),
}

/// Failure of one request/response exchange with the game peer
#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("{call} failed: {message}")]
    Transport { call: String, message: String },

    #[error("{call} returned HTTP {status}")]
    Status { call: String, status: u16 },

    #[error("{call} timed out")]
    Timeout { call: String },

    #[error("remote call client is disconnected")]
    Disconnected,
}

/// Failure of a process supervisor operation
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run supervisor command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("unexpected supervisor output: {0}")]
    InvalidOutput(String),

    #[error("process supervisor is disconnected")]
    Disconnected,
}

/// Push failure on an observer transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("observer transport is closed")]
    Closed,

    #[error("observer outbound queue is full")]
    Full,
}

/// Aborts a sell cycle
#[derive(Debug, Error)]
pub enum LiquidationError {
    #[error(transparent)]
    Remote(#[from] RemoteCallError),

    #[error("inventory payload: {0}")]
    Codec(#[from] BridgeError),
}
