//! Logging setup for the Beacon service.
//!
//! Every crate logs through the `tracing` macros; this module installs the
//! subscriber once at startup. Output always goes to stdout and, when a log
//! file is configured, additionally to that file without ANSI colours.

use std::path::Path;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` directives take precedence over `level`. When `file` is given
/// the returned guard must be held for as long as logs should be flushed.
/// Calling this twice is harmless: the second call leaves the first
/// subscriber in place. A log file that cannot be opened is reported and
/// logging continues on stdout only.
pub fn init_with_level(level: Level, file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let mut file_error = None;
    let (file_layer, guard) = match file.map(|path| (path, file_writer(path))) {
        Some((_, Ok((writer, guard)))) => (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        ),
        Some((path, Err(e))) => {
            file_error = Some(format!("{}: {}", path.display(), e));
            (None, None)
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    if let Some(e) = file_error {
        warn!("Cannot open log file {}, logging to stdout only", e);
    }
    guard
}

#[derive(Debug, thiserror::Error)]
enum LogFileError {
    #[error("path has no file name")]
    NoFileName,
    #[error(transparent)]
    Init(#[from] InitError),
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), LogFileError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(LogFileError::NoFileName)?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Parses a level name, falling back to INFO.
pub fn parse_level(name: &str) -> Level {
    name.parse::<Level>().unwrap_or_else(|_| {
        warn!("Unknown log level '{}', using info", name);
        Level::INFO
    })
}
