//! Individual cipher keys parsed from configured key material

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305};
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Length of raw key material in bytes
pub(crate) const KEY_LEN: usize = 32;

/// A single symmetric key in the ring.
///
/// Parsed from base64-encoded 32-byte material supplied at configuration
/// time. Debug output never reveals the key bytes.
#[derive(Clone)]
pub struct CipherKey {
    pub(crate) aead: XChaCha20Poly1305,
}

impl CipherKey {
    /// Parse a key from base64-encoded material.
    pub fn from_base64(material: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(material.trim())
            .map_err(|e| Error::invalid_key(format!("not valid base64: {e}")))?;
        if bytes.len() != KEY_LEN {
            return Err(Error::invalid_key(format!(
                "expected {KEY_LEN} bytes of key material, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(&bytes)),
        })
    }

    /// Parse a key from wrapped secret material.
    ///
    /// The exposed string is used only for the duration of the parse; the
    /// caller keeps ownership of the secret.
    pub fn from_secret(material: &SecretString) -> Result<Self> {
        Self::from_base64(material.expose_secret())
    }

    /// Generate fresh key material, returned base64-encoded.
    ///
    /// Intended for provisioning and tests; production key material normally
    /// arrives through configuration.
    #[must_use]
    pub fn generate() -> String {
        let key = XChaCha20Poly1305::generate_key(&mut OsRng);
        BASE64.encode(key)
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}
