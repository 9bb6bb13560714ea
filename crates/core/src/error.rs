//! Error types for the core crate

use miette::Diagnostic;
use thiserror::Error;

/// Error type for core operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(verbatim::core::config),
        help("Check the VERBATIM_* environment variables")
    )]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
