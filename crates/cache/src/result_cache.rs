//! The get-or-compute caching wrapper
//!
//! [`ResultCache`] composes key derivation, the cipher ring, and a store
//! into one operation: look the request up, decrypt on a hit, otherwise run
//! the compute function and persist its result encrypted.
//!
//! There is deliberately no locking or leasing around the miss path. Two
//! concurrent misses for the same key both compute and both write; the
//! compute function is a pure function of its input, so duplicate work is
//! wasted but never wrong, and the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use verbatim_cipher::CipherRing;
use verbatim_core::{Settings, TranscriptionRequest};

use crate::key::derive_key;
use crate::rotate::{RotationOutcome, rotate_entries};
use crate::store::CacheStore;
use crate::{ComputeError, Error, Result};

/// Encrypted result cache in front of a deterministic compute function.
#[derive(Debug)]
pub struct ResultCache<S> {
    store: S,
    cipher: Arc<CipherRing>,
    namespace: String,
    version: String,
    default_ttl: Duration,
}

impl<S: CacheStore> ResultCache<S> {
    /// Create a cache over `store` with an explicit cipher ring.
    pub fn new(
        store: S,
        cipher: Arc<CipherRing>,
        namespace: impl Into<String>,
        version: impl Into<String>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cipher,
            namespace: namespace.into(),
            version: version.into(),
            default_ttl,
        }
    }

    /// Create a cache over `store`, building the cipher ring from settings.
    pub fn with_settings(store: S, settings: &Settings) -> Result<Self> {
        let cipher = CipherRing::from_key_material(&settings.encryption_keys)?;
        Ok(Self::new(
            store,
            Arc::new(cipher),
            settings.cache_namespace.clone(),
            settings.cache_version.clone(),
            settings.cache_ttl,
        ))
    }

    /// The cache key this cache derives for `request`.
    ///
    /// Exposed for operational tooling; `get_or_compute` derives internally.
    pub fn key_for(&self, request: &TranscriptionRequest) -> Result<String> {
        derive_key(&self.namespace, &self.version, request)
    }

    /// Namespace prefix covering every key this cache writes.
    #[must_use]
    pub fn namespace_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// [`Self::get_or_compute_with_ttl`] with the configured default TTL.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        request: &TranscriptionRequest,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(TranscriptionRequest) -> Fut,
        Fut: Future<Output = std::result::Result<T, ComputeError>>,
    {
        self.get_or_compute_with_ttl(request, self.default_ttl, compute)
            .await
    }

    /// Return the cached result for `request`, computing and caching it on a
    /// miss.
    ///
    /// Cached and fresh paths are observationally identical: the stored value
    /// is the canonical serialization of what `compute` returned, so it
    /// round-trips exactly.
    ///
    /// # Errors
    ///
    /// Only two failures surface: [`Error::KeyDerivation`] when the source
    /// content is unreadable, and [`Error::Compute`] wrapping the compute
    /// function's own error (which is never cached). Store and cipher
    /// failures degrade: an unavailable store falls open to direct
    /// computation, an undecryptable entry becomes a miss and is overwritten,
    /// and a failed cache write still returns the computed result.
    pub async fn get_or_compute_with_ttl<T, F, Fut>(
        &self,
        request: &TranscriptionRequest,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(TranscriptionRequest) -> Fut,
        Fut: Future<Output = std::result::Result<T, ComputeError>>,
    {
        let key = self.key_for(request)?;

        let cached = match self.store.get(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache store unavailable, computing without cache");
                return compute(request.clone()).await.map_err(Error::compute);
            }
        };

        if let Some(token) = cached {
            // Entries older than the TTL are rejected here even if the store
            // has not evicted them yet; both cases are plain misses.
            match self.cipher.decrypt_with_max_age(&token, ttl) {
                Ok(plaintext) => match serde_json::from_slice::<T>(&plaintext) {
                    Ok(value) => {
                        tracing::debug!(%key, "cache hit");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "cached value does not deserialize, treating as miss");
                    }
                },
                Err(e) => {
                    // Stale key, incomplete rotation, or corruption. The
                    // overwrite below self-heals the entry.
                    tracing::debug!(%key, error = %e, "cached entry not decryptable, treating as miss");
                }
            }
        }

        let value = compute(request.clone()).await.map_err(Error::compute)?;

        match serde_json::to_vec(&value) {
            Ok(plaintext) => match self.cipher.encrypt(&plaintext) {
                Ok(token) => {
                    if let Err(e) = self.store.set(&key, &token, ttl).await {
                        tracing::warn!(%key, error = %e, "cache write failed, returning fresh result");
                    }
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "encryption failed, returning fresh result uncached");
                }
            },
            Err(e) => {
                tracing::warn!(%key, error = %e, "result serialization failed, returning fresh result uncached");
            }
        }

        Ok(value)
    }

    /// Run a rotation sweep over this cache's namespace.
    ///
    /// Intended to run after the key ring was reconfigured; see
    /// [`rotate_entries`] for the per-entry policy.
    pub async fn rotate(&self) -> Result<RotationOutcome> {
        rotate_entries(
            &self.store,
            &self.cipher,
            &self.namespace_prefix(),
            self.default_ttl,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;
    use verbatim_cipher::CipherKey;
    use verbatim_core::{Task, TranscriptionResponse, TranscriptionSegment};

    const TTL: Duration = Duration::from_secs(3600);

    fn test_ring() -> Arc<CipherRing> {
        let key = CipherKey::from_base64(&CipherKey::generate()).unwrap();
        Arc::new(CipherRing::new(vec![key]).unwrap())
    }

    fn cache_over<S: CacheStore>(store: S) -> ResultCache<S> {
        ResultCache::new(store, test_ring(), "transcription", "v1", TTL)
    }

    fn audio_fixture(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn request_for(file: &NamedTempFile) -> TranscriptionRequest {
        TranscriptionRequest {
            model_id: "small".to_string(),
            task: Task::Transcribe,
            language: "en".to_string(),
            chunk_length: 30,
            batch_size: 24,
            filepath: file.path().to_path_buf(),
        }
    }

    fn response(text: &str) -> TranscriptionResponse {
        TranscriptionResponse {
            text: text.to_string(),
            segments: vec![TranscriptionSegment {
                id: Some(0),
                text: text.to_string(),
                timestamp: (0.0, Some(2.5)),
            }],
        }
    }

    /// A store where every operation fails.
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::store_unavailable("connection refused"))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            Err(Error::store_unavailable("connection refused"))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::store_unavailable("connection refused"))
        }
        async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
            Err(Error::store_unavailable("connection refused"))
        }
        async fn scan(&self, _prefix: &str) -> Result<Vec<String>> {
            Err(Error::store_unavailable("connection refused"))
        }
    }

    #[tokio::test]
    async fn second_call_hits_without_recomputing() {
        let cache = cache_over(MemoryStore::new());
        let file = audio_fixture(b"the audio");
        let request = request_for(&file);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: TranscriptionResponse = cache
                .get_or_compute(&request, |_req| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(response("hello")) }
                })
                .await
                .unwrap();
            assert_eq!(result, response("hello"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hit_and_fresh_results_serialize_identically() {
        let cache = cache_over(MemoryStore::new());
        let file = audio_fixture(b"round trip audio");
        let request = request_for(&file);

        let fresh: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async { Ok(response("same words")) })
            .await
            .unwrap();
        let cached: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async {
                panic!("must not recompute on a hit")
            })
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string(&fresh).unwrap(),
            serde_json::to_string(&cached).unwrap()
        );
    }

    #[tokio::test]
    async fn unavailable_store_fails_open() {
        let cache = cache_over(DownStore);
        let file = audio_fixture(b"audio");
        let request = request_for(&file);

        let result: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async { Ok(response("still works")) })
            .await
            .unwrap();
        assert_eq!(result.text, "still works");
    }

    #[tokio::test]
    async fn write_failure_still_returns_result() {
        /// Reads succeed (miss), writes fail.
        struct ReadOnlyStore;

        #[async_trait]
        impl CacheStore for ReadOnlyStore {
            async fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(None)
            }
            async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
                Err(Error::store_unavailable("read-only replica"))
            }
            async fn delete(&self, _key: &str) -> Result<()> {
                Ok(())
            }
            async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
                Ok(None)
            }
            async fn scan(&self, _prefix: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
        }

        let cache = cache_over(ReadOnlyStore);
        let file = audio_fixture(b"audio");
        let request = request_for(&file);

        let result: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async { Ok(response("computed")) })
            .await
            .unwrap();
        assert_eq!(result.text, "computed");
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss_and_gets_overwritten() {
        let store = MemoryStore::new();
        let cache = cache_over(store);
        let file = audio_fixture(b"audio");
        let request = request_for(&file);
        let key = cache.key_for(&request).unwrap();

        cache.store.set(&key, "garbage token", TTL).await.unwrap();

        let result: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async { Ok(response("recomputed")) })
            .await
            .unwrap();
        assert_eq!(result.text, "recomputed");

        // The garbage was overwritten with a decryptable entry.
        let stored = cache.store.get(&key).await.unwrap().unwrap();
        assert!(cache.cipher.decrypt(&stored).is_ok());
    }

    #[tokio::test]
    async fn compute_errors_propagate_and_are_not_cached() {
        let cache = cache_over(MemoryStore::new());
        let file = audio_fixture(b"audio");
        let request = request_for(&file);
        let key = cache.key_for(&request).unwrap();

        let err = cache
            .get_or_compute::<TranscriptionResponse, _, _>(&request, |_req| async {
                Err("engine out of memory".into())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compute { .. }));
        assert_eq!(cache.store.get(&key).await.unwrap(), None);

        // A later successful compute is cached normally.
        let result: TranscriptionResponse = cache
            .get_or_compute(&request, |_req| async { Ok(response("recovered")) })
            .await
            .unwrap();
        assert_eq!(result.text, "recovered");
        assert!(cache.store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unreadable_content_fails_the_call() {
        let cache = cache_over(MemoryStore::new());
        let request = TranscriptionRequest {
            model_id: "small".to_string(),
            task: Task::Transcribe,
            language: "en".to_string(),
            chunk_length: 30,
            batch_size: 24,
            filepath: "/nonexistent/audio.wav".into(),
        };

        let err = cache
            .get_or_compute::<TranscriptionResponse, _, _>(&request, |_req| async {
                panic!("compute must not run when key derivation fails")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyDerivation { .. }));
    }

    #[tokio::test]
    async fn entries_sealed_under_a_retired_key_still_hit() {
        let old = CipherKey::generate();
        let new = CipherKey::generate();
        let old_ring = Arc::new(
            CipherRing::new(vec![CipherKey::from_base64(&old).unwrap()]).unwrap(),
        );
        let rotated_ring = Arc::new(
            CipherRing::new(vec![
                CipherKey::from_base64(&new).unwrap(),
                CipherKey::from_base64(&old).unwrap(),
            ])
            .unwrap(),
        );

        let file = audio_fixture(b"audio");
        let request = request_for(&file);

        let store = MemoryStore::new();
        let writer = ResultCache::new(store, old_ring, "transcription", "v1", TTL);
        let _: TranscriptionResponse = writer
            .get_or_compute(&request, |_req| async { Ok(response("pre-rotation")) })
            .await
            .unwrap();

        // Same store, post-rotation ring.
        let ResultCache { store, .. } = writer;
        let reader = ResultCache::new(store, rotated_ring, "transcription", "v1", TTL);
        let result: TranscriptionResponse = reader
            .get_or_compute(&request, |_req| async {
                panic!("retired-key entry must decrypt, not recompute")
            })
            .await
            .unwrap();
        assert_eq!(result.text, "pre-rotation");
    }
}
