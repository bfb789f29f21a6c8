//! XChaCha20-Poly1305 seal/open
//!
//! Sealed message format (binary):
//! ```text
//! [N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! The nonce travels separately (frame or stream header). Associated data is
//! always empty. The 192-bit nonce is wide enough to draw at random for a
//! single key without a meaningful collision risk.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::{CodecError, Result};
use crate::kdf::DerivedKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// A 192-bit XChaCha20 nonce.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a nonce from a slice that must be exactly [`NONCE_SIZE`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; NONCE_SIZE] = bytes
            .try_into()
            .map_err(|_| CodecError::Truncated("nonce"))?;
        Ok(Self(arr))
    }

    /// Draw a nonce from the operating system RNG.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(CodecError::Randomness)?;
        Ok(Self(bytes))
    }

    /// Nonce for chunk `index` of a stream: the counter is XORed into the
    /// trailing 8 bytes (big-endian). Chunk 0 keeps the base nonce.
    pub fn for_chunk(&self, index: u64) -> Self {
        let mut bytes = self.0;
        let counter = index.to_be_bytes();
        for (b, c) in bytes[NONCE_SIZE - 8..].iter_mut().zip(counter) {
            *b ^= c;
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// XChaCha20-Poly1305 bound to one derived key.
///
/// Build once per operation and reuse it for every chunk so the key schedule
/// is not recomputed per message.
pub struct AeadEngine {
    cipher: XChaCha20Poly1305,
}

impl AeadEngine {
    pub fn new(key: &DerivedKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }

    /// Seal `plaintext` under `nonce` with empty AAD.
    ///
    /// Returns: `[ciphertext][16-byte tag]`
    pub fn seal(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.cipher
            .encrypt(
                XNonce::from_slice(nonce.as_bytes()),
                Payload {
                    msg: plaintext,
                    aad: &[],
                },
            )
            // Only reachable for messages beyond the cipher's 256 GiB limit.
            .map_err(|_| CodecError::OversizedInput {
                len: plaintext.len(),
            })
    }

    /// Open `[ciphertext][16-byte tag]` sealed under `nonce`.
    ///
    /// Tag comparison is constant-time inside `chacha20poly1305`; every
    /// failure collapses into the single opaque [`CodecError::Authentication`].
    pub fn open(&self, nonce: &Nonce, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < TAG_SIZE {
            return Err(CodecError::Authentication);
        }

        self.cipher
            .decrypt(
                XNonce::from_slice(nonce.as_bytes()),
                Payload {
                    msg: sealed,
                    aad: &[],
                },
            )
            .map_err(|_| CodecError::Authentication)
    }
}
