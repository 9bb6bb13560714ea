//! Encrypted result caching for verbatim
//!
//! This crate sits between an expensive, deterministic compute function
//! (audio transcription) and an external key-value store. It provides:
//! - Content-addressed cache key derivation (SHA-256 of the full audio
//!   content plus the semantically relevant request parameters)
//! - A [`CacheStore`] adapter over the key-value backend (Redis in
//!   production, an in-memory store for tests and single-process use)
//! - The [`ResultCache`] get-or-compute wrapper, which persists results
//!   encrypted under a [`verbatim_cipher::CipherRing`]
//! - A rotation sweep that migrates every cached entry onto the active
//!   encryption key and evicts what no key can open
//!
//! # Failure Policy
//!
//! The cache is a non-essential subsystem in front of an essential one.
//! Backend unavailability degrades to direct computation (fail-open, logged),
//! undecryptable entries degrade to cache misses, and a failed cache write
//! never fails a call that already holds a computed result. Only two failures
//! reach callers: unreadable source content and the compute function's own
//! errors. Compute errors are never cached.

mod error;
pub mod key;
mod result_cache;
mod rotate;
pub mod store;

pub use error::{ComputeError, Error, Result};
pub use key::{derive_key, format_key, hash_content};
pub use result_cache::ResultCache;
pub use rotate::{RotationOutcome, rotate_entries};
pub use store::{CacheStore, MemoryStore, RedisStore};
