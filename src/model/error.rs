//! Error types for recyclist.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`RecyclerError`] - Failures raised by the list engine itself
//! - [`AppError`] - Top-level error of the simulator binary, wrapping list,
//!   configuration, logging and I/O failures
//!
//! # Error Recovery Strategy
//!
//! Dependency and item-type errors indicate integration bugs: they are never
//! recovered locally and end the operation that hit them. `LayoutUnavailable`
//! is recoverable, but only after a relayout has produced geometry for the
//! index; blind retries will fail the same way.
//!
//! Drift between estimated and measured geometry is **not** an error. It is
//! corrected internally by relayout and refix.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Failures raised by the list engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecyclerError {
    /// A required collaborator (data provider or layout provider) was not supplied.
    ///
    /// **When this occurs**: building a list without one of its providers.
    ///
    /// **Recovery**: none, fix the integration.
    #[error("Missing dependency: {0} must be provided before the list can be built")]
    MissingDependency(&'static str),

    /// An index was queried beyond the computed geometry.
    ///
    /// **Recovery**: trigger a relayout that covers the index first. Callers
    /// must not treat this as transient.
    ///
    /// # Examples
    ///
    /// ```
    /// use recyclist::model::error::RecyclerError;
    ///
    /// let err = RecyclerError::LayoutUnavailable { index: 12, laid_out: 10 };
    /// assert!(err.to_string().contains("index 12"));
    /// ```
    #[error("No layout available for index {index} (only {laid_out} laid out)")]
    LayoutUnavailable {
        /// Requested index.
        index: usize,
        /// Number of entries that currently have geometry.
        laid_out: usize,
    },

    /// The layout type provider resolved an index to no type at all.
    ///
    /// **Recovery**: none, the provider violates its contract.
    #[error("Item type resolved to nothing for index {index}")]
    InvalidItemType {
        /// Index whose type could not be resolved.
        index: usize,
    },

    /// A removed API was used. The message names the replacement.
    #[error("{api} is no longer supported, use {replacement} instead")]
    DeprecatedApiUsage {
        /// Name of the removed API.
        api: &'static str,
        /// What to use instead.
        replacement: &'static str,
    },

    /// The scroll container reported a zero-sized viewport.
    ///
    /// Nothing can be windowed inside an unbounded container. Suppressible
    /// with `suppress_bounded_size_exception`, in which case the list stays
    /// empty until a real size arrives.
    #[error(
        "Viewport measured {width}x{height}; the list needs a bounded, non-zero size \
         (set suppress_bounded_size_exception to wait for one)"
    )]
    UnboundedSize {
        /// Reported width.
        width: f64,
        /// Reported height.
        height: f64,
    },
}

/// Top-level error of the simulator binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The list engine failed.
    #[error("List error: {0}")]
    List(#[from] RecyclerError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
