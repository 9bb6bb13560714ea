//! The ordered key ring: seal with the newest key, open with any

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{Aead, AeadCore, OsRng, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use secrecy::SecretString;

use crate::key::CipherKey;
use crate::{Error, Result};

/// Token format version byte
const TOKEN_VERSION: u8 = 1;
/// version(1) + unix-seconds(8)
const HEADER_LEN: usize = 9;
/// XChaCha20-Poly1305 nonce length
const NONCE_LEN: usize = 24;
/// Poly1305 authentication tag length
const TAG_LEN: usize = 16;
/// Tolerated clock skew when validating embedded timestamps
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// An ordered ring of symmetric keys.
///
/// Index 0 is the active write key; the remainder are retired keys retained
/// for decrypt-only access to data sealed before a rotation. The ring is
/// immutable after construction.
#[derive(Clone)]
pub struct CipherRing {
    keys: Vec<CipherKey>,
}

impl CipherRing {
    /// Build a ring from parsed keys, newest first.
    pub fn new(keys: Vec<CipherKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::EmptyRing);
        }
        Ok(Self { keys })
    }

    /// Build a ring from configured key material, newest first.
    pub fn from_key_material(materials: &[SecretString]) -> Result<Self> {
        let keys = materials
            .iter()
            .map(CipherKey::from_secret)
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys)
    }

    /// Number of keys in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// A ring always holds at least one key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Seal a plaintext under the active key.
    ///
    /// Each call draws a fresh random nonce, so two encryptions of the same
    /// plaintext produce different tokens.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        self.seal(plaintext, now_unix())
    }

    /// Open a token, trying every key in ring order.
    ///
    /// Returns [`Error::DecryptionFailed`] when no key authenticates the
    /// token. No timestamp check is applied.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>> {
        self.open(token).map(|(plaintext, _)| plaintext)
    }

    /// Open a token and reject it if it was sealed longer than `max_age` ago.
    ///
    /// Timestamps more than a small skew allowance in the future are rejected
    /// as malformed, mirroring the age check.
    pub fn decrypt_with_max_age(&self, token: &str, max_age: Duration) -> Result<Vec<u8>> {
        let (plaintext, sealed_at) = self.open(token)?;
        let now = now_unix();
        if sealed_at > now + MAX_CLOCK_SKEW_SECS {
            return Err(Error::malformed("token timestamp is in the future"));
        }
        let age_secs = now.saturating_sub(sealed_at);
        if age_secs > max_age.as_secs() {
            return Err(Error::Expired {
                age_secs,
                max_age_secs: max_age.as_secs(),
            });
        }
        Ok(plaintext)
    }

    fn seal(&self, plaintext: &[u8], sealed_at: u64) -> Result<String> {
        let mut header = [0u8; HEADER_LEN];
        header[0] = TOKEN_VERSION;
        header[1..].copy_from_slice(&sealed_at.to_be_bytes());

        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self.keys[0]
            .aead
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| Error::EncryptionFailed)?;

        let mut token = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&header);
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(token))
    }

    /// Parse and authenticate a token; returns plaintext and seal timestamp.
    fn open(&self, token: &str) -> Result<(Vec<u8>, u64)> {
        let bytes = BASE64
            .decode(token.trim())
            .map_err(|e| Error::malformed(format!("not valid base64: {e}")))?;
        if bytes.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
            return Err(Error::malformed("token too short"));
        }
        if bytes[0] != TOKEN_VERSION {
            return Err(Error::malformed(format!(
                "unknown token version {}",
                bytes[0]
            )));
        }
        let header = &bytes[..HEADER_LEN];
        let mut ts_bytes = [0u8; 8];
        ts_bytes.copy_from_slice(&header[1..HEADER_LEN]);
        let sealed_at = u64::from_be_bytes(ts_bytes);
        let nonce = XNonce::from_slice(&bytes[HEADER_LEN..HEADER_LEN + NONCE_LEN]);
        let ciphertext = &bytes[HEADER_LEN + NONCE_LEN..];

        // Linear scan, newest key first. First key that authenticates wins.
        for key in &self.keys {
            if let Ok(plaintext) = key.aead.decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            ) {
                return Ok((plaintext, sealed_at));
            }
        }
        Err(Error::DecryptionFailed)
    }
}

impl std::fmt::Debug for CipherRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CipherRing({} keys)", self.keys.len())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
