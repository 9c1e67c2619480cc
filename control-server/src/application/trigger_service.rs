use std::sync::Arc;
use thiserror::Error;

use crate::application::ActionDispatcher;
use crate::domain::errors::{SupervisorError, ValidationError};
use crate::domain::models::{Decision, TriggerOutcome};
use crate::domain::services::{redact, TriggerDebouncer};

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Debounce, then dispatch
pub struct TriggerService {
    debouncer: TriggerDebouncer,
    dispatcher: ActionDispatcher,
}

impl TriggerService {
    pub fn new(debouncer: TriggerDebouncer, dispatcher: ActionDispatcher) -> Self {
        Self {
            debouncer,
            dispatcher,
        }
    }

    /// Handle one external trigger.
    ///
    /// A forwarded payload stays in the debounce window even when the
    /// dispatch fails, so a retry inside the window is reported as debounced.
    pub async fn handle(&self, payload: &str) -> Result<TriggerOutcome, TriggerError> {
        match self.debouncer.accept(payload) {
            Decision::Rejected => Err(ValidationError::EmptyCode.into()),
            Decision::Suppressed { since } => {
                tracing::info!(
                    code = %redact(payload),
                    accepted_secs_ago = since.elapsed().as_secs(),
                    "Duplicate trigger debounced"
                );
                Ok(TriggerOutcome::Debounced)
            }
            Decision::Forward => {
                tracing::info!(code = %redact(payload), "Trigger accepted");
                let outcome = self.dispatcher.dispatch(payload).await.map_err(|e| {
                    tracing::error!(code = %redact(payload), "Trigger dispatch failed: {}", e);
                    e
                })?;
                Ok(TriggerOutcome::Dispatched(outcome))
            }
        }
    }
}
