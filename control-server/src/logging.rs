use crate::config::LoggingConfig;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console logging and, when enabled, rolling file output.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the process.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    // Default to info level for all modules; can be overridden via RUST_LOG env var
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if !config.enabled {
        subscriber.init();
        return None;
    }

    use tracing_appender::rolling;

    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!("Failed to create log directory {}: {}", config.directory, e);
    }

    cleanup_old_logs(config);

    let file_appender = match config.rotation.as_str() {
        "hourly" => rolling::hourly(&config.directory, &config.file_prefix),
        "never" => rolling::never(&config.directory, &config.file_prefix),
        _ => rolling::daily(&config.directory, &config.file_prefix),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    subscriber
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

/// Clean up old log files based on retention policy.
///
/// Returns the number of deleted files.
pub fn cleanup_old_logs(logging_config: &LoggingConfig) -> usize {
    if logging_config.max_files == 0 && logging_config.max_age_days == 0 {
        return 0;
    }

    let log_dir = Path::new(&logging_config.directory);
    if !log_dir.exists() {
        return 0;
    }

    let mut log_files = match list_log_files(log_dir, &logging_config.file_prefix) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Failed to read log directory: {}", e);
            return 0;
        }
    };

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let now = SystemTime::now();
    let max_age = Duration::from_secs(u64::from(logging_config.max_age_days) * 24 * 60 * 60);
    let mut deleted_count = 0;

    for (idx, (path, modified)) in log_files.iter().enumerate() {
        let over_count =
            logging_config.max_files > 0 && idx >= logging_config.max_files as usize;
        let over_age = logging_config.max_age_days > 0
            && now
                .duration_since(*modified)
                .map(|age| age > max_age)
                .unwrap_or(false);

        if !(over_count || over_age) {
            continue;
        }

        match std::fs::remove_file(path) {
            Ok(_) => deleted_count += 1,
            Err(e) => eprintln!("Failed to delete log file {:?}: {}", path, e),
        }
    }

    if deleted_count > 0 {
        eprintln!("Cleaned up {} old log file(s)", deleted_count);
    }

    deleted_count
}

fn list_log_files(dir: &Path, prefix: &str) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    let files = std::fs::read_dir(dir)?
        .filter_map(|entry_res| {
            let entry = entry_res.ok()?;
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }

            let file_name = entry.file_name();
            if !file_name.to_str()?.starts_with(prefix) {
                return None;
            }

            Some((entry.path(), metadata.modified().ok()?))
        })
        .collect();
    Ok(files)
}
