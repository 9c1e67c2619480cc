//! Observer registry and periodic snapshot fan-out

use chrono::{DateTime, Utc};
use farm_agent_bridge::ControlMessage;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::adapters::infrastructure::{Scheduler, TaskHandle};
use crate::application::StateAggregator;
use crate::domain::errors::TransportError;
use crate::ports::ObserverTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Observer lifecycle. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Connecting,
    Open,
    Closed,
}

struct Observer {
    transport: Box<dyn ObserverTransport>,
    state: ObserverState,
    remote_addr: Option<SocketAddr>,
    connected_at: DateTime<Utc>,
}

impl Observer {
    fn new(transport: Box<dyn ObserverTransport>, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            transport,
            state: ObserverState::Connecting,
            remote_addr,
            connected_at: Utc::now(),
        }
    }

    fn open(&mut self) {
        if self.state == ObserverState::Connecting {
            self.state = ObserverState::Open;
        }
    }

    fn close(&mut self) {
        if self.state != ObserverState::Closed {
            self.state = ObserverState::Closed;
            self.transport.close();
        }
    }
}

/// Result of one broadcast pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub delivered: usize,
    /// Observers whose queue was full; they stay connected
    pub dropped: usize,
    pub evicted: usize,
}

pub struct BroadcastHub {
    aggregator: Arc<StateAggregator>,
    observers: Mutex<HashMap<ObserverId, Observer>>,
    tick_task: Mutex<Option<TaskHandle>>,
    shut_down: AtomicBool,
}

impl BroadcastHub {
    pub fn new(aggregator: Arc<StateAggregator>) -> Self {
        Self {
            aggregator,
            observers: Mutex::new(HashMap::new()),
            tick_task: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, HashMap<ObserverId, Observer>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register the periodic tick. The first broadcast happens one period
    /// after start.
    pub fn start(self: &Arc<Self>, scheduler: &Scheduler, period: Duration) -> bool {
        let hub = Arc::downgrade(self);
        let handle = scheduler.every("broadcast", period, period, move || {
            let hub = hub.clone();
            async move {
                if let Some(hub) = hub.upgrade() {
                    hub.tick();
                }
            }
        });

        match handle {
            Some(handle) => {
                tracing::info!(period_ms = period.as_millis() as u64, "Broadcast tick started");
                *self
                    .tick_task
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Register a new observer. Returns `None` once the hub is shut down.
    pub fn on_connect(
        &self,
        transport: Box<dyn ObserverTransport>,
        remote_addr: Option<SocketAddr>,
    ) -> Option<ObserverId> {
        let mut observers = self.lock_observers();
        if self.shut_down.load(Ordering::SeqCst) {
            transport.close();
            return None;
        }

        let id = ObserverId::new();
        let mut observer = Observer::new(transport, remote_addr);
        observer.open();
        observers.insert(id, observer);

        tracing::info!(
            observer = %id,
            remote_addr = ?remote_addr,
            observers = observers.len(),
            "Observer connected"
        );
        Some(id)
    }

    /// Handle one inbound text frame. Pings are answered with a pong;
    /// anything else is ignored.
    pub fn on_message(&self, id: ObserverId, raw: &str) {
        let Some(ControlMessage::Ping) = ControlMessage::parse(raw) else {
            tracing::debug!(observer = %id, "Ignoring unrecognised observer message");
            return;
        };

        let reply = match ControlMessage::pong_now().to_json() {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Failed to serialize pong: {}", e);
                return;
            }
        };

        let mut observers = self.lock_observers();
        let Some(observer) = observers.get(&id) else {
            return;
        };
        match observer.transport.send(&reply) {
            Ok(()) => {}
            Err(TransportError::Full) => {
                tracing::debug!(observer = %id, "Outbound queue full, pong dropped");
            }
            Err(TransportError::Closed) => {
                if let Some(mut observer) = observers.remove(&id) {
                    observer.close();
                    tracing::debug!(observer = %id, "Observer evicted after failed pong");
                }
            }
        }
    }

    /// Remove an observer. Safe to call for ids that are already gone.
    pub fn on_disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.lock_observers();
        match observers.remove(&id) {
            Some(mut observer) => {
                observer.close();
                tracing::info!(
                    observer = %id,
                    remote_addr = ?observer.remote_addr,
                    connected_secs = (Utc::now() - observer.connected_at).num_seconds(),
                    observers = observers.len(),
                    "Observer disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Push one snapshot to every open observer.
    ///
    /// With no observers nothing is built or serialized. Observers whose
    /// transport is closed are removed after the pass.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        if self.shut_down.load(Ordering::SeqCst) {
            return report;
        }

        let mut observers = self.lock_observers();
        if observers.is_empty() {
            return report;
        }

        let frame = match self.aggregator.snapshot().to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to serialize snapshot: {}", e);
                return report;
            }
        };

        let mut dead = Vec::new();
        for (id, observer) in observers.iter() {
            if observer.state != ObserverState::Open {
                dead.push(*id);
                continue;
            }
            match observer.transport.send(&frame) {
                Ok(()) => report.delivered += 1,
                Err(TransportError::Full) => {
                    report.dropped += 1;
                    tracing::debug!(observer = %id, "Outbound queue full, snapshot dropped");
                }
                Err(TransportError::Closed) => dead.push(*id),
            }
        }

        for id in dead {
            if let Some(mut observer) = observers.remove(&id) {
                observer.close();
                report.evicted += 1;
                tracing::debug!(observer = %id, "Observer evicted after failed send");
            }
        }

        report
    }

    /// Stop ticking and close every observer. Returns `false` when the hub
    /// was already shut down.
    pub fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Some(task) = self
            .tick_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.cancel();
        }

        let mut observers = self.lock_observers();
        let closed = observers.len();
        for (_, mut observer) in observers.drain() {
            observer.close();
        }
        tracing::info!(closed, "Broadcast hub shut down");
        true
    }

    pub fn observer_count(&self) -> usize {
        self.lock_observers().len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}
