//! Process supervisor backed by the pm2 command line

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;

use crate::config::SupervisorConfig;
use crate::domain::errors::SupervisorError;
use crate::domain::models::{ProcessInfo, StartSpec};
use crate::ports::ProcessSupervisor;

pub struct Pm2Supervisor {
    pm2_bin: String,
    closed: AtomicBool,
}

/// Subset of one `pm2 jlist` entry
#[derive(Debug, Deserialize)]
struct JlistEntry {
    name: String,
    #[serde(default)]
    pid: Option<u32>,
}

impl Pm2Supervisor {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            pm2_bin: config.pm2_bin.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// Run pm2 with `args`. `shown` names the command in errors and logs
    /// so that launch arguments never leak.
    async fn run(&self, args: &[String], shown: &str) -> Result<String, SupervisorError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SupervisorError::Disconnected);
        }

        tracing::debug!(command = %shown, "Running supervisor command");
        let output = Command::new(&self.pm2_bin)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(SupervisorError::CommandFailed {
                command: shown.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `pm2 jlist` output. Stopped processes report pid 0, which maps to `None`.
pub(crate) fn parse_jlist(stdout: &str) -> Result<Vec<ProcessInfo>, SupervisorError> {
    // pm2 may print banner lines (which can themselves start with '[') before the array
    let entries = stdout
        .match_indices('[')
        .find_map(|(start, _)| {
            serde_json::from_str::<Vec<JlistEntry>>(stdout[start..].trim_end()).ok()
        })
        .ok_or_else(|| SupervisorError::InvalidOutput("no process list in pm2 output".into()))?;

    Ok(entries
        .into_iter()
        .map(|entry| ProcessInfo {
            name: entry.name,
            pid: entry.pid.filter(|pid| *pid != 0),
        })
        .collect())
}

/// `start <script> --name <name> [--cwd <dir>] [-- <args>...]`
pub(crate) fn start_args(spec: &StartSpec) -> Vec<String> {
    let mut args = vec![
        "start".to_string(),
        spec.command.clone(),
        "--name".to_string(),
        spec.name.clone(),
    ];
    if let Some(cwd) = &spec.cwd {
        args.push("--cwd".to_string());
        args.push(cwd.clone());
    }
    if !spec.args.is_empty() {
        args.push("--".to_string());
        args.extend(spec.args.iter().cloned());
    }
    args
}

#[async_trait]
impl ProcessSupervisor for Pm2Supervisor {
    async fn list(&self) -> Result<Vec<ProcessInfo>, SupervisorError> {
        let stdout = self.run(&["jlist".to_string()], "pm2 jlist").await?;
        parse_jlist(&stdout)
    }

    async fn start(&self, spec: &StartSpec) -> Result<(), SupervisorError> {
        let shown = format!("pm2 start {} --name {}", spec.command, spec.name);
        self.run(&start_args(spec), &shown).await.map(|_| ())
    }

    async fn restart(&self, name: &str) -> Result<(), SupervisorError> {
        let shown = format!("pm2 restart {}", name);
        self.run(&["restart".to_string(), name.to_string()], &shown)
            .await
            .map(|_| ())
    }

    async fn disconnect(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("Process supervisor released");
        }
    }
}
