//! Key derivation: scrypt passphrase + salt → 256-bit cipher key

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::error::{CodecError, Result};
use crate::KEY_SIZE;

/// scrypt CPU/memory cost, as log2(N). N = 2^15 needs 32 MiB of scratch.
pub const SCRYPT_LOG_N: u8 = 15;

/// scrypt block size parameter
pub const SCRYPT_R: u32 = 8;

/// scrypt parallelization parameter
pub const SCRYPT_P: u32 = 1;

/// A 256-bit key stretched from the configured passphrase.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a passphrase and salt using scrypt.
///
/// The cost is fixed (N=2^15, r=8, p=1) and deliberately expensive. The salt
/// is random per operation and travels in the clear next to the ciphertext.
/// Passphrase content never causes a failure; only the KDF itself can.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_SIZE)
        .map_err(|e| CodecError::KeyDerivation(format!("invalid scrypt params: {e}")))?;

    let mut key = [0u8; KEY_SIZE];
    scrypt::scrypt(passphrase, salt, &params, &mut key)
        .map_err(|e| CodecError::KeyDerivation(format!("scrypt failed: {e}")))?;

    tracing::trace!(salt_len = salt.len(), "derived cipher key");
    Ok(DerivedKey::from_bytes(key))
}

/// Draw a fresh `len`-byte salt from the operating system RNG.
pub fn generate_salt(len: usize) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(CodecError::Randomness)?;
    Ok(salt)
}
