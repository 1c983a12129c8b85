//! Logging setup for the TrackPro backend.
//!
//! All crates log through `tracing`; this module installs the subscriber once at
//! startup. Output always goes to stdout and optionally to a daily rolling file
//! and (on Linux) to journald.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trackpro_config::LoggingConfig;

const DEFAULT_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "trackpro.log";

/// Initialize logging with defaults (INFO for the `trackpro` targets).
pub fn init() -> Option<WorkerGuard> {
    init_with_config(None)
}

/// Initialize logging from the `[logging]` config section.
///
/// `RUST_LOG` overrides the configured level when set. The returned guard must be
/// kept alive for the lifetime of the process when file logging is enabled,
/// otherwise buffered lines are lost on exit.
pub fn init_with_config(config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let level = config
        .and_then(|c| c.level.as_deref())
        .unwrap_or(DEFAULT_LEVEL);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,trackpro={level},tower_http=info")));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match config.and_then(|c| c.directory.as_deref()) {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);

    #[cfg(target_os = "linux")]
    let result = {
        let journald = config
            .filter(|c| c.journald)
            .and_then(|_| tracing_journald::layer().ok());
        registry.with(journald).try_init()
    };
    #[cfg(not(target_os = "linux"))]
    let result = registry.try_init();

    // try_init fails when a subscriber is already installed (tests, embedding)
    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}
