//! Key-rotation sweep
//!
//! After the key ring is reconfigured (new active key prepended, oldest key
//! about to be dropped), this sweep walks every cached entry under a
//! namespace prefix and re-seals it with the active key. Entries no key can
//! open are deleted rather than left behind permanently unreadable.
//!
//! The sweep runs on demand and may race ordinary traffic: a concurrent
//! cache write for the same key simply wins or loses the last write, and
//! both outcomes are valid ciphertexts of correct data.

use std::time::Duration;

use serde::Serialize;
use verbatim_cipher::CipherRing;

use crate::Result;
use crate::store::CacheStore;

/// Counts accumulated by a rotation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RotationOutcome {
    /// Keys returned by the scan
    pub scanned: u64,
    /// Entries re-sealed under the active key
    pub rotated: u64,
    /// Entries deleted because no key could open them
    pub deleted: u64,
}

/// Re-encrypt every entry under `prefix` with the ring's active key.
///
/// TTL policy: an entry keeps its remaining TTL when the store reports one;
/// otherwise `default_ttl` is applied. Entries that disappear between scan
/// and read are skipped. Every per-entry failure is logged and counted at
/// most as a skip — a single bad entry never aborts the sweep. Only a failed
/// initial scan fails the call.
pub async fn rotate_entries<S: CacheStore + ?Sized>(
    store: &S,
    cipher: &CipherRing,
    prefix: &str,
    default_ttl: Duration,
) -> Result<RotationOutcome> {
    let keys = store.scan(prefix).await?;
    let mut outcome = RotationOutcome::default();

    for key in keys {
        outcome.scanned += 1;

        let token = match store.get(&key).await {
            Ok(Some(token)) => token,
            // Evicted between scan and read.
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(%key, error = %e, "rotation: read failed, skipping entry");
                continue;
            }
        };

        match cipher.decrypt(&token) {
            Ok(plaintext) => {
                let ttl = match store.ttl(&key).await {
                    Ok(Some(remaining)) if remaining > Duration::ZERO => remaining,
                    _ => default_ttl,
                };
                let resealed = match cipher.encrypt(&plaintext) {
                    Ok(resealed) => resealed,
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "rotation: re-encrypt failed, skipping entry");
                        continue;
                    }
                };
                match store.set(&key, &resealed, ttl).await {
                    Ok(()) => outcome.rotated += 1,
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "rotation: write-back failed, skipping entry");
                    }
                }
            }
            Err(_) => {
                // Sealed under a key no longer in the ring, or corrupt.
                match store.delete(&key).await {
                    Ok(()) => {
                        outcome.deleted += 1;
                        tracing::debug!(%key, "rotation: deleted undecryptable entry");
                    }
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "rotation: delete failed, skipping entry");
                    }
                }
            }
        }
    }

    tracing::info!(
        scanned = outcome.scanned,
        rotated = outcome.rotated,
        deleted = outcome.deleted,
        prefix,
        "rotation sweep complete"
    );
    Ok(outcome)
}
