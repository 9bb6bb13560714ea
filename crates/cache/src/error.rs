//! Error types for the cache crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Boxed error type produced by a wrapped compute function
pub type ComputeError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The request's source content could not be read for hashing
    #[error("Cache key derivation failed: cannot read {}", path.display())]
    #[diagnostic(
        code(verbatim::cache::key_derivation),
        help("Check that the source file exists and is readable")
    )]
    KeyDerivation {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path to the unreadable content
        path: Box<Path>,
    },

    /// The cache backend could not be reached or answered with a protocol error
    #[error("Cache store unavailable: {message}")]
    #[diagnostic(
        code(verbatim::cache::store_unavailable),
        help("Callers fall open to direct computation; check backend connectivity")
    )]
    StoreUnavailable {
        /// Description of the backend failure
        message: String,
    },

    /// A value could not be serialized or deserialized
    #[error("Serialization error: {message}")]
    #[diagnostic(code(verbatim::cache::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// Cipher construction failed (bad key material or an empty ring)
    #[error("Cipher error")]
    #[diagnostic(code(verbatim::cache::cipher))]
    Cipher {
        /// The underlying cipher error
        #[source]
        #[diagnostic_source]
        source: verbatim_cipher::Error,
    },

    /// The wrapped compute function failed; propagated verbatim, never cached
    #[error("Compute function failed")]
    #[diagnostic(code(verbatim::cache::compute))]
    Compute {
        /// The compute function's own error
        #[source]
        source: ComputeError,
    },
}

impl Error {
    /// Create a key-derivation error with path context
    #[must_use]
    pub fn key_derivation(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::KeyDerivation {
            source,
            path: path.as_ref().into(),
        }
    }

    /// Create a store-unavailable error
    #[must_use]
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: msg.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Wrap a compute-function failure
    #[must_use]
    pub fn compute(source: ComputeError) -> Self {
        Self::Compute { source }
    }
}

impl From<verbatim_cipher::Error> for Error {
    fn from(source: verbatim_cipher::Error) -> Self {
        Self::Cipher { source }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
