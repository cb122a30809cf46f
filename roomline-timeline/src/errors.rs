//! # Timeline Error Types
//!
//! Errors raised by reconciliation, configuration loading and upstream
//! subscription.

use thiserror::Error;

use crate::models::DiffKind;

/// Result type alias for reconciliation steps
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// A diff that does not fit the current materialized sequence.
///
/// Both variants mean the upstream diff stream and the local copy have
/// drifted apart. They are logged and skipped, never surfaced to consumers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The operation's index exceeds the bounds of the current sequence
    #[error("{op} at index {index} is out of range for a timeline of {len} items")]
    IndexOutOfRange {
        op: DiffKind,
        index: usize,
        len: usize,
    },

    /// A pop arrived against an empty sequence
    #[error("{op} on an empty timeline")]
    EmptyCollection { op: DiffKind },
}

impl ReconcileError {
    /// Create a new out-of-range error
    #[must_use]
    pub const fn out_of_range(op: DiffKind, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { op, index, len }
    }

    /// Operation that was rejected
    #[must_use]
    pub const fn op(&self) -> DiffKind {
        match self {
            Self::IndexOutOfRange { op, .. } | Self::EmptyCollection { op } => *op,
        }
    }
}

/// Failures of the upstream timeline subscription.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The sync layer could not open a timeline subscription
    #[error("Timeline subscription failed: {reason}")]
    SubscriptionFailed { reason: String },

    /// Loading the source data failed
    #[error("Timeline source unavailable: {source}")]
    Unavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SourceError {
    /// Create a new subscription failure
    pub fn subscription_failed<T: Into<String>>(reason: T) -> Self {
        Self::SubscriptionFailed {
            reason: reason.into(),
        }
    }

    /// Wrap an external error
    pub fn unavailable<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unavailable {
            source: Box::new(error),
        }
    }
}

/// Errors produced while resolving [`crate::config::TimelineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents could not be parsed in the detected format
    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The file extension is not one of yaml, yml, json or toml
    #[error("Unsupported configuration format. Use 'yaml', 'json' or 'toml'.")]
    UnsupportedFormat,

    /// An environment override could not be parsed
    #[error("Invalid {var} value: {message}")]
    InvalidEnv { var: &'static str, message: String },

    /// The resolved configuration failed validation
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ConfigError {
    pub(crate) fn parse<E: std::fmt::Display>(format: &'static str, error: &E) -> Self {
        Self::Parse {
            format,
            message: error.to_string(),
        }
    }
}
