//! Tracing subscriber initialization.
//!
//! The simulator writes its trace to a file so JSON frames on stdout stay
//! clean. Follow it with `tail -f` in a separate terminal; raise the level
//! with `RUST_LOG=recyclist=debug` to see relayout and refix decisions.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Why the trace file could not be set up.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("cannot create log directory {path:?}: {source}")]
    DirectoryCreation {
        /// Directory that was being created.
        path: PathBuf,
        /// I/O error from the filesystem.
        #[source]
        source: std::io::Error,
    },

    /// The log path does not end in a UTF-8 file name.
    #[error("log path {0:?} does not name a file")]
    InvalidPath(PathBuf),

    /// The log path has no directory part.
    #[error("log path {0:?} has no directory")]
    NoParentDirectory(PathBuf),

    /// Another global subscriber was installed first.
    #[error("a global tracing subscriber is already installed")]
    SubscriberAlreadySet,
}

/// Filter from `RUST_LOG`, or `fallback` when unset or unparseable.
pub fn env_filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a global fmt subscriber appending to `log_path`, creating its
/// directory first. The filter comes from `RUST_LOG`, else `default_filter`
/// (normally [`DEFAULT_FILTER`]).
///
/// # Errors
///
/// Fails when the path has no file name, the directory cannot be created,
/// or a global subscriber is already installed.
pub fn init(log_path: &Path, default_filter: &str) -> Result<(), LoggingError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(default_filter))
        .with_writer(file_appender)
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
