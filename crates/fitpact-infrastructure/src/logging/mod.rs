//! Logging setup.
//!
//! - Human-readable colored output on stdout in debug builds
//! - One-line JSON log files with daily rotation in every build
//! - `log`-crate records forwarded into `tracing`

use log::LevelFilter;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static LOGGER_READY: OnceLock<()> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Default log directory under the platform's local data dir.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fitpact")
        .join("logs")
}

/// Initialize the logging system. Safe to call more than once; only the
/// first call takes effect.
pub fn init_logger(log_dir: PathBuf) -> anyhow::Result<()> {
    if LOGGER_READY.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(&log_dir)?;

    // Forward log-crate records (sqlx, reqwest) to tracing
    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let file_appender = rolling::daily(&log_dir, "fitpact.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_file(true)
        .with_line_number(true);

    let subscriber = Registry::default().with(env_filter).with(file_layer);

    if cfg!(debug_assertions) {
        let stdout_layer = fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .boxed();
        tracing::subscriber::set_global_default(subscriber.with(stdout_layer))?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let _ = LOGGER_READY.set(());
    Ok(())
}
