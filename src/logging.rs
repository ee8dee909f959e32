use crate::{config::Config, util::ensure_dir};
use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Once;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

static INSTALL: Once = Once::new();

/// Installs the global subscriber: stdout (plain or JSON) plus an optional
/// daily-rolling file under `paths.logs_dir`.
///
/// Only the first call does anything; later calls return `None`. Keep the
/// returned guard alive for the life of the process so buffered file output
/// is flushed. Failures here degrade logging and are never returned.
pub fn configure(cfg: &Config, level_override: Option<&str>) -> Option<WorkerGuard> {
    let mut guard = None;
    // Concurrent first callers block until the winner has installed.
    INSTALL.call_once(|| guard = install(cfg, level_override));
    guard
}

fn install(cfg: &Config, level_override: Option<&str>) -> Option<WorkerGuard> {
    let level = level_override.unwrap_or(cfg.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let mut file_error = None;
    let (file_layer, guard) = if cfg.logging.write_to_file {
        match file_appender(cfg, Path::new(&cfg.paths.logs_dir)) {
            Ok(appender) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed();
                (Some(layer), Some(guard))
            }
            Err(err) => {
                file_error = Some(err);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = installed {
        // Another subscriber already owns the process; leave it in place.
        eprintln!("logging not configured: {err}");
        return None;
    }
    if let Some(err) = file_error {
        warn!("file logging disabled: {err:#}");
    }
    guard
}

fn file_appender(cfg: &Config, dir: &Path) -> Result<RollingFileAppender> {
    ensure_dir(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&cfg.logging.file_prefix)
        .filename_suffix("log")
        .max_log_files(cfg.logging.retention_days.max(1))
        .build(dir)
        .map_err(|e| anyhow!("creating log appender in {}: {e}", dir.display()))
}
