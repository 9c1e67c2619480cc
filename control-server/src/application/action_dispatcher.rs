use std::sync::Arc;

use crate::config::TriggerConfig;
use crate::domain::errors::SupervisorError;
use crate::domain::models::{DispatchOutcome, StartSpec};
use crate::domain::services::redact;
use crate::ports::ProcessSupervisor;

/// The supervised process a trigger acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedProcess {
    pub name: String,
    pub script: String,
    pub arg_flag: String,
    pub cwd: Option<String>,
}

impl From<&TriggerConfig> for ManagedProcess {
    fn from(config: &TriggerConfig) -> Self {
        Self {
            name: config.process_name.clone(),
            script: config.script.clone(),
            arg_flag: config.arg_flag.clone(),
            cwd: config.cwd.clone(),
        }
    }
}

/// Restarts the managed process when the supervisor knows it, starts it otherwise
pub struct ActionDispatcher {
    supervisor: Arc<dyn ProcessSupervisor>,
    process: ManagedProcess,
}

impl ActionDispatcher {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, process: ManagedProcess) -> Self {
        Self {
            supervisor,
            process,
        }
    }

    pub async fn dispatch(&self, payload: &str) -> Result<DispatchOutcome, SupervisorError> {
        let processes = self.supervisor.list().await?;
        let target = &self.process.name;

        if let Some(existing) = processes.iter().find(|p| &p.name == target) {
            tracing::info!(process = %target, pid = ?existing.pid, "Restarting managed process");
            self.supervisor.restart(target).await?;
            return Ok(DispatchOutcome::Restart {
                target: target.clone(),
                pid: existing.pid,
            });
        }

        let spec = StartSpec {
            name: target.clone(),
            command: self.process.script.clone(),
            args: vec![self.process.arg_flag.clone(), payload.to_string()],
            cwd: self.process.cwd.clone(),
        };
        let command = format!(
            "{} {} {}",
            self.process.script,
            self.process.arg_flag,
            redact(payload)
        );

        tracing::info!(process = %target, command = %command, "Starting managed process");
        self.supervisor.start(&spec).await?;
        Ok(DispatchOutcome::Start {
            target: target.clone(),
            command,
        })
    }
}
