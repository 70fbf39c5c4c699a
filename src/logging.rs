//! Tracing setup for the binary
//!
//! Logs go to stderr so stdout stays reserved for the report, or to a file
//! through a non-blocking writer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Log destination and format
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub file: Option<PathBuf>,
    pub json: bool,
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// until the program exits.
pub fn init(options: &LogOptions) -> anyhow::Result<Option<WorkerGuard>> {
    let (writer, guard) = match &options.file {
        Some(path) => {
            let (directory, file_name) = split_log_path(path)
                .with_context(|| format!("invalid log file path {:?}", path))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if options.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(options.file.is_none())
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter(&options.level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    Ok(guard)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Directory and file name of a log path; a bare file name lives in `.`
fn split_log_path(path: &Path) -> Option<(PathBuf, OsString)> {
    let file_name = path.file_name()?.to_os_string();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((directory, file_name))
}
