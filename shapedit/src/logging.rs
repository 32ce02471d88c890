//! Logging setup for the library and CLI.
//!
//! Events go to a log file (truncated at startup) because the terminal
//! editor owns stdout. Batch commands may additionally mirror them to
//! stderr. The level is taken from `RUST_LOG`, defaulting to `info`.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive; dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Log file only.
    File,
    /// Log file plus stderr.
    FileAndStderr,
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if the log file cannot be created or a subscriber is already set.
pub fn init_logging(log_file: &Path, target: LogTarget) -> Result<LoggingGuard, io::Error> {
    let (dir, name) = split_log_path(log_file)?;
    fs::create_dir_all(dir)?;
    fs::write(log_file, "")?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = (target == LogTarget::FileAndStderr).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn split_log_path(log_file: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let name = log_file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Log path has no file name: {}", log_file.display()),
        )
    })?;
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, name))
}
