use crate::error::AppResult;
use crate::modules::config::get_data_dir;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "proxy.log";

pub fn get_log_dir() -> AppResult<PathBuf> {
    let log_dir = get_data_dir()?.join("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }
    Ok(log_dir)
}

/// `RUST_LOG`-style directives, falling back to INFO when unset, blank or unparsable.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    let Some(directives) = directives.map(str::trim).filter(|d| !d.is_empty()) else {
        return EnvFilter::new(DEFAULT_FILTER);
    };
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid {}: {}", EnvFilter::DEFAULT_ENV, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Initialize console logging plus a daily rolling file under the data dir.
///
/// The returned guard flushes the file writer on drop; hold it until shutdown.
/// `None` means file logging is unavailable and only the console is active.
pub fn init_logger() -> Option<WorkerGuard> {
    // Capture log macro logs
    let _ = tracing_log::LogTracer::init();

    let filter_layer = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    let (file_layer, guard) = match get_log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            (None, None)
        }
    };

    let file_enabled = file_layer.is_some();

    // try_init so a second call is harmless
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if file_enabled {
        info!("Logger initialized (console + {})", LOG_FILE_PREFIX);
    } else {
        info!("Logger initialized (console only)");
    }
    guard
}
