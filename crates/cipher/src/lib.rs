//! Multi-key symmetric encryption for verbatim's result cache.
//!
//! Cached transcription results are persisted to an external key-value store
//! and must never land there in plaintext. This crate provides the cipher
//! used for that: an ordered ring of symmetric keys where the first key seals
//! new tokens and every key is tried, in order, when opening one.
//!
//! # Key Rotation
//!
//! Rotation is a configuration change, not a runtime mutation: the ring is
//! immutable for the lifetime of a process. To rotate, restart with a new
//! ordered key list where the fresh key sits at index 0 and the previous
//! active key has moved to index 1. Tokens sealed under the old key stay
//! readable until a rotation sweep re-seals them (see `verbatim-cache`).
//!
//! # Token Format
//!
//! ```text
//! base64( version(1) ‖ unix-seconds(8, big-endian) ‖ nonce(24) ‖ ciphertext+tag )
//! ```
//!
//! The version byte and timestamp are bound as associated data, so a token
//! cannot be re-stamped without failing authentication. The timestamp enables
//! an optional max-age check at decrypt time.

mod error;
mod key;
mod ring;

pub use error::{Error, Result};
pub use key::CipherKey;
pub use ring::CipherRing;
