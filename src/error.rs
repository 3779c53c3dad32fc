//! Custom error types for squeeze.
//!
//! This module defines all error types used throughout the application,
//! following Rust best practices with `thiserror` for library errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compressing a file.
#[derive(Error, Debug)]
pub enum SqueezeError {
    /// Failed to read the input file.
    #[error("failed to read input file '{path}': {source}")]
    InputFileRead {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to the output file.
    #[error("failed to write to output file '{path}': {source}")]
    OutputFileWrite {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to serialize a request body.
    #[error("failed to serialize request: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Endpoint returned an error status.
    #[error("endpoint returned error status {status}: {body}")]
    EndpointError {
        /// HTTP status code returned.
        status: u16,
        /// Response body content.
        body: String,
    },

    /// Invalid response from the model service.
    #[error("invalid API response: {message}")]
    InvalidResponse {
        /// Description of what was invalid.
        message: String,
    },
}

impl SqueezeError {
    /// Whether this error is fatal at startup (as opposed to a per-chunk
    /// failure that the pipeline absorbs).
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::InputFileRead { .. } | Self::OutputFileWrite { .. } | Self::InvalidConfig(_)
        )
    }
}

/// Result type alias for squeeze operations.
pub type Result<T> = std::result::Result<T, SqueezeError>;
