//! Codec configuration: options → resolved, immutable [`Params`]
//!
//! Zero-valued sizes fall back to the crate defaults ([`SALT_SIZE`],
//! [`NONCE_SIZE`], [`KEY_SIZE`]). The key has no default.

use std::io::{Read, Write};

use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};

use crate::aead::Nonce;
use crate::error::{CodecError, Result};
use crate::stream::StreamSummary;
use crate::{frame, stream, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// How the streaming codec assigns nonces to the chunks of one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonceSchedule {
    /// Every chunk is sealed under the header nonce. This is the established
    /// wire format, but it reuses one (key, nonce) pair for the whole stream:
    /// equal plaintext chunks produce equal ciphertext chunks.
    #[default]
    Shared,
    /// Chunk `i` is sealed under the header nonce with `i` mixed into its
    /// trailing 8 bytes. Same layout as `Shared`, incompatible ciphertext.
    PerChunk,
}

impl NonceSchedule {
    pub fn nonce_for(&self, base: &Nonce, chunk_index: u64) -> Nonce {
        match self {
            NonceSchedule::Shared => *base,
            NonceSchedule::PerChunk => base.for_chunk(chunk_index),
        }
    }
}

/// Unresolved codec options. Zero means "use the default".
#[derive(Debug, Default)]
pub struct ParamsOptions {
    pub salt_size: usize,
    pub nonce_size: usize,
    pub key_size: usize,
    pub key: Option<SecretSlice<u8>>,
    pub stream_nonce: NonceSchedule,
}

/// Resolved codec configuration.
///
/// Read-only after construction; a single value can drive any number of
/// encrypt/decrypt calls, from any number of threads.
#[derive(Debug)]
pub struct Params {
    salt_size: usize,
    nonce_size: usize,
    key_size: usize,
    key: SecretSlice<u8>,
    stream_nonce: NonceSchedule,
}

impl Params {
    /// Resolve `options` into a configuration, applying defaults.
    pub fn new(options: ParamsOptions) -> Result<Self> {
        let key = options.key.ok_or(CodecError::MissingKey)?;

        let salt_size = or_default(options.salt_size, SALT_SIZE);
        let nonce_size = or_default(options.nonce_size, NONCE_SIZE);
        let key_size = or_default(options.key_size, KEY_SIZE);

        if nonce_size != NONCE_SIZE {
            return Err(CodecError::InvalidParams(format!(
                "nonce size must be {NONCE_SIZE} bytes for XChaCha20-Poly1305, got {nonce_size}"
            )));
        }

        Ok(Self {
            salt_size,
            nonce_size,
            key_size,
            key,
            stream_nonce: options.stream_nonce,
        })
    }

    /// Shorthand for a configuration with every default and the given key.
    pub fn with_key(key: impl Into<Vec<u8>>) -> Result<Self> {
        Self::builder().key(key).build()
    }

    pub fn builder() -> ParamsBuilder {
        ParamsBuilder::default()
    }

    pub fn salt_size(&self) -> usize {
        self.salt_size
    }

    pub fn nonce_size(&self) -> usize {
        self.nonce_size
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    pub fn stream_nonce(&self) -> NonceSchedule {
        self.stream_nonce
    }

    /// Encrypt a whole buffer into one self-contained, length-prefixed frame.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        frame::encrypt_frame(self, data)
    }

    /// Decrypt a frame produced by [`Params::encrypt`].
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        frame::decrypt_frame(self, data)
    }

    /// Encrypt `reader` into `writer` in chunks of `chunk_size` plaintext bytes.
    pub fn stream_encrypt<R: Read, W: Write>(
        &self,
        reader: R,
        writer: W,
        chunk_size: usize,
    ) -> Result<StreamSummary> {
        stream::encrypt_stream(self, reader, writer, chunk_size)
    }

    /// Decrypt a stream produced by [`Params::stream_encrypt`] with the same
    /// `chunk_size`.
    pub fn stream_decrypt<R: Read, W: Write>(
        &self,
        reader: R,
        writer: W,
        chunk_size: usize,
    ) -> Result<StreamSummary> {
        stream::decrypt_stream(self, reader, writer, chunk_size)
    }

    /// Fails with [`CodecError::ShortKey`] unless the key covers `key_size`.
    pub(crate) fn check_key(&self) -> Result<()> {
        let actual = self.key.expose_secret().len();
        if actual < self.key_size {
            return Err(CodecError::ShortKey {
                expected: self.key_size,
                actual,
            });
        }
        Ok(())
    }

    /// The passphrase bytes fed to the KDF: `key[..key_size]`.
    ///
    /// Callers must run [`Params::check_key`] first.
    pub(crate) fn key_material(&self) -> &[u8] {
        &self.key.expose_secret()[..self.key_size]
    }
}

fn or_default(value: usize, default: usize) -> usize {
    if value == 0 {
        default
    } else {
        value
    }
}

/// Builder over [`ParamsOptions`].
#[derive(Debug, Default)]
pub struct ParamsBuilder {
    options: ParamsOptions,
}

impl ParamsBuilder {
    pub fn salt_size(mut self, salt_size: usize) -> Self {
        self.options.salt_size = salt_size;
        self
    }

    pub fn nonce_size(mut self, nonce_size: usize) -> Self {
        self.options.nonce_size = nonce_size;
        self
    }

    pub fn key_size(mut self, key_size: usize) -> Self {
        self.options.key_size = key_size;
        self
    }

    pub fn key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.options.key = Some(SecretSlice::from(key.into()));
        self
    }

    pub fn stream_nonce(mut self, schedule: NonceSchedule) -> Self {
        self.options.stream_nonce = schedule;
        self
    }

    pub fn build(self) -> Result<Params> {
        Params::new(self.options)
    }
}
