//! Deterministic cache key derivation
//!
//! A cache key binds the identity of the audio content (SHA-256 over every
//! byte) to the parameters that influence the transcription output. Two
//! requests with the same content and the same parameter tuple always map to
//! the same key; any parameter that changes the output changes the key.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use verbatim_core::TranscriptionRequest;

use crate::{Error, Result};

/// Read buffer size for content hashing
const HASH_BUF_LEN: usize = 64 * 1024;

/// Compute the hex-encoded SHA-256 of a file's full content.
///
/// The file is streamed, so arbitrarily large audio never lands in memory at
/// once; every byte still contributes to the digest. An unreadable file is a
/// hard error carrying the path — never a silent cache miss.
pub fn hash_content(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::key_derivation(e, path))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_BUF_LEN];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| Error::key_derivation(e, path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Assemble a cache key from its parts.
///
/// Field order is frozen for compatibility with pre-existing cached data,
/// including the absence of a separator between the content hash and the
/// model identifier. Bumping `version` makes every old key unreachable,
/// which is the supported way to invalidate the whole cache.
#[must_use]
pub fn format_key(
    namespace: &str,
    version: &str,
    content_hash: &str,
    request: &TranscriptionRequest,
) -> String {
    format!(
        "{namespace}:{version}:{content_hash}{model_id}:{task}:{language}:{chunk_length}:{batch_size}",
        model_id = request.model_id,
        task = request.task,
        language = request.language,
        chunk_length = request.chunk_length,
        batch_size = request.batch_size,
    )
}

/// Derive the cache key for a request: hash its content, then bind the
/// request parameters.
pub fn derive_key(
    namespace: &str,
    version: &str,
    request: &TranscriptionRequest,
) -> Result<String> {
    let content_hash = hash_content(&request.filepath)?;
    Ok(format_key(namespace, version, &content_hash, request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use verbatim_core::Task;

    fn request_for(path: &Path) -> TranscriptionRequest {
        TranscriptionRequest {
            model_id: "small".to_string(),
            task: Task::Transcribe,
            language: "en".to_string(),
            chunk_length: 30,
            batch_size: 24,
            filepath: path.to_path_buf(),
        }
    }

    #[test]
    fn key_format_is_frozen() {
        let request = request_for(Path::new("/unused"));
        let key = format_key("transcription", "v1", "abc123", &request);
        assert_eq!(key, "transcription:v1:abc123small:transcribe:en:30:24");
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"some audio bytes").unwrap();
        let request = request_for(file.path());

        let first = derive_key("transcription", "v1", &request).unwrap();
        let second = derive_key("transcription", "v1", &request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn content_hash_matches_full_digest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        // sha256("hello")
        assert_eq!(
            hash_content(file.path()).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn different_content_different_key() {
        let mut a = NamedTempFile::new().unwrap();
        a.write_all(b"take one").unwrap();
        let mut b = NamedTempFile::new().unwrap();
        b.write_all(b"take two").unwrap();

        let key_a = derive_key("transcription", "v1", &request_for(a.path())).unwrap();
        let key_b = derive_key("transcription", "v1", &request_for(b.path())).unwrap();
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn different_parameters_different_key() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"same audio").unwrap();

        let base = request_for(file.path());
        let mut translated = base.clone();
        translated.task = Task::Translate;
        let mut batched = base.clone();
        batched.batch_size = 8;

        let key = derive_key("transcription", "v1", &base).unwrap();
        assert_ne!(key, derive_key("transcription", "v1", &translated).unwrap());
        assert_ne!(key, derive_key("transcription", "v1", &batched).unwrap());
    }

    #[test]
    fn version_bump_changes_key() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"audio").unwrap();
        let request = request_for(file.path());

        let v1 = derive_key("transcription", "v1", &request).unwrap();
        let v2 = derive_key("transcription", "v2", &request).unwrap();
        assert_ne!(v1, v2);
    }

    #[test]
    fn unreadable_content_is_a_hard_error() {
        let request = request_for(Path::new("/nonexistent/audio.wav"));
        let err = derive_key("transcription", "v1", &request).unwrap_err();
        assert!(matches!(err, Error::KeyDerivation { .. }));
    }
}
