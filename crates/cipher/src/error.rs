//! Error types for the cipher crate

use miette::Diagnostic;
use thiserror::Error;

/// Error type for cipher operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Key material could not be parsed into a usable key
    #[error("Invalid cipher key: {reason}")]
    #[diagnostic(
        code(verbatim::cipher::invalid_key),
        help("Keys must be base64-encoded 32-byte values")
    )]
    InvalidKey {
        /// Why the key material was rejected
        reason: String,
    },

    /// A cipher ring was constructed with no keys
    #[error("Cipher ring requires at least one key")]
    #[diagnostic(
        code(verbatim::cipher::empty_ring),
        help("Supply at least one key, newest first")
    )]
    EmptyRing,

    /// The token is structurally invalid (bad base64, truncated, unknown version)
    #[error("Malformed token: {reason}")]
    #[diagnostic(code(verbatim::cipher::malformed_token))]
    MalformedToken {
        /// Why the token could not be parsed
        reason: String,
    },

    /// No key in the ring could authenticate the token
    #[error("No key in the ring can decrypt this token")]
    #[diagnostic(
        code(verbatim::cipher::decryption_failed),
        help("The token was sealed under a key no longer in the ring, or the data is corrupt")
    )]
    DecryptionFailed,

    /// The token authenticated but its embedded timestamp is outside the accepted window
    #[error("Token expired: sealed {age_secs}s ago, max age {max_age_secs}s")]
    #[diagnostic(code(verbatim::cipher::expired))]
    Expired {
        /// Seconds since the token was sealed
        age_secs: u64,
        /// Maximum accepted age in seconds
        max_age_secs: u64,
    },

    /// The AEAD backend failed to seal a payload
    #[error("Encryption failed")]
    #[diagnostic(code(verbatim::cipher::encryption_failed))]
    EncryptionFailed,
}

impl Error {
    /// Create an invalid-key error
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create a malformed-token error
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }
}

/// Result type for cipher operations
pub type Result<T> = std::result::Result<T, Error>;
