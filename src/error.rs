//! Error handling for the radiochain library
//!
//! This module provides a unified error type for tap design and pipeline
//! operations. Configuration mistakes are reported as values rather than
//! panics, since reconfiguration often originates from live user input.

use thiserror::Error;

/// A specialized Result type for radiochain operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for radiochain operations
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Band-pass cutoffs given in the wrong order
    #[error("Invalid cutoffs: low cutoff {low} Hz is above high cutoff {high} Hz")]
    InvalidCutoffs { low: f32, high: f32 },

    /// A scalar design or pipeline parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Lifecycle operation on a pipeline that was never initialised
    #[error("Pipeline is not initialized")]
    NotInitialized,

    /// A processing worker thread panicked
    #[error("Worker '{0}' panicked")]
    WorkerPanicked(String),

    /// A processing worker thread could not be spawned
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    /// The other end of a stream is gone
    #[error("Stream closed")]
    StreamClosed,
}

impl Error {
    /// Create an invalid parameter error with a custom message
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

/// Check that a frequency-like parameter is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("{} must be positive, got {}", name, value)))
    }
}

/// Check that a parameter is finite.
pub(crate) fn ensure_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!("{} must be finite, got {}", name, value)))
    }
}
