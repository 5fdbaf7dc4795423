//! Error handling for printpanel.
//!
//! Provides error types for the two layers that can fail:
//! - Driver errors (device command/query failures)
//! - Refresh errors (status fan-out failures, split into transient and
//!   structural cases)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Driver command/query error.
///
/// Raised by [`crate::Driver`] implementations. `Busy` is the retryable
/// "device busy" condition; this crate's callers log it and drop the
/// triggering action rather than retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Device is busy and cannot accept the command right now
    #[error("Machine busy")]
    Busy,

    /// No machine is attached or the connection has been lost
    #[error("Machine not connected")]
    NotConnected,

    /// Command or query timed out
    #[error("Driver operation timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Transport-level I/O failure
    #[error("Driver I/O error: {reason}")]
    Io {
        /// A message describing the I/O failure.
        reason: String,
    },
}

impl DriverError {
    /// Check whether this is the retryable "device busy" condition
    pub fn is_busy(&self) -> bool {
        matches!(self, DriverError::Busy)
    }
}

/// Status refresh error.
///
/// Distinguishes a transient read miss from a structural inconsistency in
/// machine/tool state. Only the structural case is treated as a disconnect
/// and tears the owning session down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Single missed read; the refresh loop logs it and continues
    #[error("Transient status refresh failure: {reason}")]
    Transient {
        /// A message describing the missed read.
        reason: String,
    },

    /// Structurally invalid machine/tool state, treated as an unexpected
    /// disconnect
    #[error("Machine state integrity failure: {reason}")]
    Integrity {
        /// A message describing the structural inconsistency.
        reason: String,
    },
}

impl RefreshError {
    /// Create a transient refresh error from a message
    pub fn transient(reason: impl Into<String>) -> Self {
        RefreshError::Transient {
            reason: reason.into(),
        }
    }

    /// Create an integrity refresh error from a message
    pub fn integrity(reason: impl Into<String>) -> Self {
        RefreshError::Integrity {
            reason: reason.into(),
        }
    }

    /// Check whether this failure must end the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RefreshError::Integrity { .. })
    }
}

impl From<DriverError> for RefreshError {
    /// Classify a driver failure observed during a status read.
    ///
    /// `NotConnected` is the genuine connectivity case; everything else is
    /// a transient read miss that the refresh loop may skip.
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NotConnected => RefreshError::integrity(err.to_string()),
            other => RefreshError::transient(other.to_string()),
        }
    }
}

/// Main error type for printpanel
///
/// A unified error type that can represent any error from both layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Driver error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Refresh error
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
