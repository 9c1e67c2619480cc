use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::models::Decision;

#[derive(Debug, Clone)]
struct DebounceState {
    payload: String,
    accepted_at: Instant,
}

/// Suppresses repeats of the last accepted trigger payload.
///
/// Only the most recently accepted payload is remembered, so a different
/// payload always goes through and resets the window.
#[derive(Debug)]
pub struct TriggerDebouncer {
    window: Duration,
    last: Mutex<Option<DebounceState>>,
}

impl TriggerDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    pub fn accept(&self, payload: &str) -> Decision {
        self.accept_at(payload, Instant::now())
    }

    pub fn accept_at(&self, payload: &str, now: Instant) -> Decision {
        if payload.is_empty() {
            return Decision::Rejected;
        }

        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(state) = last.as_ref() {
            if state.payload == payload && now.duration_since(state.accepted_at) < self.window {
                return Decision::Suppressed {
                    since: state.accepted_at,
                };
            }
        }

        *last = Some(DebounceState {
            payload: payload.to_string(),
            accepted_at: now,
        });
        Decision::Forward
    }

}
