//! Configuration loaded from the environment
//!
//! All settings carry working defaults except the encryption keys, which
//! must be supplied: the cache cannot run without at least one key.

use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default cache namespace, shared with pre-existing cached data
const DEFAULT_NAMESPACE: &str = "transcription";
/// Default cache key version; bump to implicitly invalidate all entries
const DEFAULT_CACHE_VERSION: &str = "v1";
/// Default entry TTL in seconds
const DEFAULT_TTL_SECS: u64 = 3600;

/// Service settings.
///
/// Loaded once at startup via [`Settings::from_env`] and passed down
/// explicitly; there is no ambient global configuration.
#[derive(Debug)]
pub struct Settings {
    /// Connection URL for the cache backend
    pub redis_url: String,
    /// Namespace prefixed to every cache key
    pub cache_namespace: String,
    /// Cache key version component
    pub cache_version: String,
    /// Time-to-live applied to cache writes
    pub cache_ttl: Duration,
    /// Encryption key material, newest first
    pub encryption_keys: Vec<SecretString>,
}

impl Settings {
    /// Load settings from `VERBATIM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary variable source.
    ///
    /// `from_env` delegates here; tests inject closures instead of mutating
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let redis_url = lookup("VERBATIM_REDIS_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let cache_namespace = lookup("VERBATIM_CACHE_NAMESPACE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let cache_version = lookup("VERBATIM_CACHE_VERSION")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_VERSION.to_string());

        let cache_ttl = match lookup("VERBATIM_CACHE_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::configuration(format!("VERBATIM_CACHE_TTL_SECS is not a number: {raw}"))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        let encryption_keys: Vec<SecretString> = lookup("VERBATIM_CACHE_ENCRYPTION_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::from(s.to_string()))
            .collect();

        if encryption_keys.is_empty() {
            return Err(Error::configuration(
                "VERBATIM_CACHE_ENCRYPTION_KEYS must list at least one key (newest first)",
            ));
        }

        Ok(Self {
            redis_url,
            cache_namespace,
            cache_version,
            cache_ttl,
            encryption_keys,
        })
    }
}
