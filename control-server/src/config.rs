use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use farm_agent_bridge::{FRUIT_ID_MAX, FRUIT_ID_MIN, SELL_BATCH_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub liquidation: LiquidationConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
        }
    }
}

/// Snapshot fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Tick period in milliseconds
    #[serde(default = "default_broadcast_interval_ms")]
    pub interval_ms: u64,
    /// Frames queued per observer before ticks are dropped for it
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_broadcast_interval_ms() -> u64 {
    1000
}
fn default_outbound_buffer() -> usize {
    16
}

impl BroadcastConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_broadcast_interval_ms(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// Automatic inventory liquidation (sell loop)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inclusive lower bound of eligible item ids
    #[serde(default = "default_id_min")]
    pub id_min: i64,
    /// Inclusive upper bound of eligible item ids
    #[serde(default = "default_id_max")]
    pub id_max: i64,
    /// Maximum entries per Sell call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between consecutive Sell calls
    #[serde(default = "default_batch_pacing_ms")]
    pub batch_pacing_ms: u64,
    /// Delay before the first cycle after startup
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// Period between cycles
    #[serde(default = "default_sell_interval_secs")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_id_min() -> i64 {
    FRUIT_ID_MIN
}
fn default_id_max() -> i64 {
    FRUIT_ID_MAX
}
fn default_batch_size() -> usize {
    SELL_BATCH_SIZE
}
fn default_batch_pacing_ms() -> u64 {
    300
}
fn default_warmup_secs() -> u64 {
    10
}
fn default_sell_interval_secs() -> u64 {
    60
}

impl LiquidationConfig {
    /// Batch size clamped to at least one entry
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id_min: default_id_min(),
            id_max: default_id_max(),
            batch_size: default_batch_size(),
            batch_pacing_ms: default_batch_pacing_ms(),
            warmup_secs: default_warmup_secs(),
            interval_secs: default_sell_interval_secs(),
        }
    }
}

/// Remote peer RPC gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_remote_base_url() -> String {
    "http://127.0.0.1:3003".to_string()
}
fn default_remote_timeout_ms() -> u64 {
    5000
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_base_url(),
            timeout_ms: default_remote_timeout_ms(),
        }
    }
}

/// Restart trigger and the managed process it controls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Identical codes inside this window are ignored
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
    /// Supervisor name of the managed process
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Entry script started when the process is absent
    #[serde(default = "default_script")]
    pub script: String,
    /// Flag placed before the code in the launch arguments
    #[serde(default = "default_arg_flag")]
    pub arg_flag: String,
    /// Working directory for the started process (defaults to the current dir)
    #[serde(default)]
    pub cwd: Option<String>,
}

fn default_debounce_secs() -> u64 {
    30
}
fn default_process_name() -> String {
    "farm-bot".to_string()
}
fn default_script() -> String {
    "client.js".to_string()
}
fn default_arg_flag() -> String {
    "--code".to_string()
}

impl TriggerConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            process_name: default_process_name(),
            script: default_script(),
            arg_flag: default_arg_flag(),
            cwd: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// pm2 executable (name on PATH or absolute path)
    #[serde(default = "default_pm2_bin")]
    pub pm2_bin: String,
}

fn default_pm2_bin() -> String {
    "pm2".to_string()
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            pm2_bin: default_pm2_bin(),
        }
    }
}

/// Opaque snapshot sections published by agent modules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

fn default_sections() -> Vec<String> {
    vec!["farm".to_string(), "friend".to_string(), "task".to_string()]
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory for log files (relative to working directory or absolute path)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// Prefix for log file names
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    /// Maximum age of log files in days (0 = unlimited)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "farm-agent-control".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}
fn default_max_files() -> u32 {
    30
}
fn default_max_age_days() -> u32 {
    90
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            max_files: default_max_files(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl Config {
    /// Load config from layered TOML files
    ///
    /// Loads configuration files in the following order (later files override earlier):
    /// 1. {base_name}.toml (required, e.g., config.toml)
    /// 2. {base_name}.{ENV}.toml (optional, only if CONFIG_ENV is set)
    /// 3. {base_name}.local.toml (optional, for personal overrides, git-ignored)
    pub fn from_file<P: AsRef<Path>>(base_name: P) -> Result<Self> {
        let base_path = base_name.as_ref();
        let base_str = base_path.to_str().context("Invalid base path")?;

        let mut builder =
            config::Config::builder().add_source(config::File::with_name(base_str));

        if let Ok(env) = std::env::var("CONFIG_ENV") {
            let env_config = format!("{}.{}", base_str, env);
            builder = builder.add_source(config::File::with_name(&env_config).required(false));
        }

        let local_config = format!("{}.local", base_str);
        builder = builder.add_source(config::File::with_name(&local_config).required(false));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            broadcast: BroadcastConfig::default(),
            liquidation: LiquidationConfig::default(),
            remote: RemoteConfig::default(),
            trigger: TriggerConfig::default(),
            supervisor: SupervisorConfig::default(),
            state: StateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3002);
        assert_eq!(config.broadcast.interval(), Duration::from_millis(1000));
        assert_eq!(config.liquidation.id_min, 3001);
        assert_eq!(config.liquidation.id_max, 49999);
        assert_eq!(config.liquidation.batch_size, 15);
        assert_eq!(config.liquidation.batch_pacing(), Duration::from_millis(300));
        assert_eq!(config.liquidation.warmup(), Duration::from_secs(10));
        assert_eq!(config.liquidation.interval(), Duration::from_secs(60));
        assert_eq!(config.trigger.debounce_window(), Duration::from_secs(30));
        assert_eq!(config.trigger.process_name, "farm-bot");
    }

    #[test]
    fn test_server_address() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:3002");
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let liquidation = LiquidationConfig {
            batch_size: 0,
            ..LiquidationConfig::default()
        };
        assert_eq!(liquidation.effective_batch_size(), 1);
    }

    #[test]
    fn test_toml_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[liquidation]"));
        assert!(toml_str.contains("[trigger]"));
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000

[liquidation]
batch_size = 5
interval_secs = 120

[trigger]
process_name = "agent"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server_address(), "127.0.0.1:9000");
        assert_eq!(config.liquidation.batch_size, 5);
        assert_eq!(config.liquidation.interval_secs, 120);
        assert_eq!(config.liquidation.id_min, 3001);
        assert_eq!(config.trigger.process_name, "agent");
        assert_eq!(config.trigger.arg_flag, "--code");
        assert_eq!(config.state.sections, vec!["farm", "friend", "task"]);
    }

    #[test]
    #[serial]
    fn test_layered_files_override_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("config");

        let mut base_file = std::fs::File::create(dir.path().join("config.toml")).unwrap();
        writeln!(base_file, "[server]\nhost = \"0.0.0.0\"\nport = 4000").unwrap();

        let mut env_file = std::fs::File::create(dir.path().join("config.test.toml")).unwrap();
        writeln!(env_file, "[broadcast]\ninterval_ms = 250").unwrap();

        let mut local_file = std::fs::File::create(dir.path().join("config.local.toml")).unwrap();
        writeln!(local_file, "[server]\nhost = \"127.0.0.1\"\nport = 4001").unwrap();

        std::env::set_var("CONFIG_ENV", "test");
        let config = Config::from_file(&base);
        std::env::remove_var("CONFIG_ENV");

        let config = config.unwrap();
        assert_eq!(config.server_address(), "127.0.0.1:4001");
        assert_eq!(config.broadcast.interval_ms, 250);
    }

    #[test]
    #[serial]
    fn test_missing_base_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_file(dir.path().join("config")).is_err());
    }
}
