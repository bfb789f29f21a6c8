use std::path::Path;

use anyhow::{Context, Result};
use cbx_crypto::NonceSchedule;
use serde::{Deserialize, Serialize};

/// Top-level CLI configuration (loaded from cipherbox.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherboxConfig {
    pub codec: CodecConfig,
    pub log: LogConfig,
}

/// Codec sizes and key source. Zero sizes fall back to the codec defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// KDF salt size in bytes (0 = 32)
    pub salt_size: usize,
    /// Nonce size in bytes (0 = 24, the only supported width)
    pub nonce_size: usize,
    /// Passphrase bytes fed to the KDF (0 = the full length of the key)
    pub key_size: usize,
    /// Plaintext bytes per streaming chunk (default: 1024)
    pub chunk_size: usize,
    /// Streaming nonce schedule: "shared" or "per-chunk"
    pub stream_nonce: NonceSchedule,
    /// Environment variable holding the key (default: CKEY)
    pub key_env: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            salt_size: 0,
            nonce_size: 0,
            key_size: 0,
            chunk_size: 1024,
            stream_nonce: NonceSchedule::Shared,
            key_env: "CKEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn). Logs always go to stderr.
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

/// Load the config file at `path`, or the defaults when no path is given.
///
/// A path that was given but cannot be read is an error.
pub fn load(path: Option<&Path>) -> Result<CipherboxConfig> {
    let Some(path) = path else {
        return Ok(CipherboxConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
}
