//! One-shot frames: a whole buffer sealed into one self-contained chunk
//!
//! Frame format (binary):
//! ```text
//! [4 bytes: body length, BE u32][24 bytes: nonce][salt_size bytes: salt][ciphertext][16 bytes: tag]
//! ```
//!
//! The length prefix covers everything after itself, so
//! `length == nonce_size + salt_size + len(ciphertext) + 16`.

use crate::aead::{AeadEngine, Nonce};
use crate::error::{CodecError, Result};
use crate::kdf::{derive_key, generate_salt};
use crate::params::Params;
use crate::TAG_SIZE;

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Length of the frame body (everything after the prefix) for a plaintext of
/// `plaintext_len` bytes, or [`CodecError::OversizedInput`] if it does not fit
/// the 4-byte prefix.
pub fn body_len(params: &Params, plaintext_len: usize) -> Result<u32> {
    params
        .nonce_size()
        .checked_add(params.salt_size())
        .and_then(|n| n.checked_add(TAG_SIZE))
        .and_then(|n| n.checked_add(plaintext_len))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(CodecError::OversizedInput { len: plaintext_len })
}

/// The fixed-offset regions of a frame, bounds-checked against its prefix.
#[derive(Debug)]
pub struct FrameHeader<'a> {
    pub nonce: Nonce,
    pub salt: &'a [u8],
    /// `[ciphertext][16-byte tag]`
    pub sealed: &'a [u8],
}

impl<'a> FrameHeader<'a> {
    /// Split `frame` into nonce, salt, and sealed payload.
    ///
    /// Rejects with [`CodecError::Truncated`] when the buffer is shorter than
    /// the prefix, when the bytes after the prefix do not match its value, or
    /// when the declared body cannot hold nonce, salt, and tag.
    pub fn parse(params: &Params, frame: &'a [u8]) -> Result<Self> {
        if frame.len() < LENGTH_PREFIX_SIZE {
            return Err(CodecError::Truncated("frame shorter than length prefix"));
        }

        let (prefix, body) = frame.split_at(LENGTH_PREFIX_SIZE);
        let declared = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        if body.len() as u64 != u64::from(declared) {
            return Err(CodecError::Truncated(
                "frame length does not match length prefix",
            ));
        }

        let header_len = params.nonce_size() + params.salt_size();
        if body.len() < header_len + TAG_SIZE {
            return Err(CodecError::Truncated(
                "frame too short for nonce, salt and tag",
            ));
        }

        let (nonce_bytes, rest) = body.split_at(params.nonce_size());
        let (salt, sealed) = rest.split_at(params.salt_size());

        Ok(Self {
            nonce: Nonce::from_slice(nonce_bytes)?,
            salt,
            sealed,
        })
    }
}

/// Encrypt `data` into a single frame.
///
/// Draws a fresh salt and nonce, derives the key from `key[..key_size]`, and
/// returns `[length][nonce][salt][ciphertext][tag]`.
pub fn encrypt_frame(params: &Params, data: &[u8]) -> Result<Vec<u8>> {
    params.check_key()?;
    let body_len = body_len(params, data.len())?;

    let salt = generate_salt(params.salt_size())?;
    let nonce = Nonce::random()?;

    let key = derive_key(params.key_material(), &salt)?;
    let sealed = AeadEngine::new(&key).seal(&nonce, data)?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + body_len as usize);
    frame.extend_from_slice(&body_len.to_be_bytes());
    frame.extend_from_slice(nonce.as_bytes());
    frame.extend_from_slice(&salt);
    frame.extend_from_slice(&sealed);
    debug_assert_eq!(frame.len(), LENGTH_PREFIX_SIZE + body_len as usize);

    tracing::debug!(
        plaintext_len = data.len(),
        frame_len = frame.len(),
        "sealed frame"
    );
    Ok(frame)
}

/// Decrypt a frame produced by [`encrypt_frame`].
pub fn decrypt_frame(params: &Params, frame: &[u8]) -> Result<Vec<u8>> {
    params.check_key()?;
    let header = FrameHeader::parse(params, frame)?;

    let key = derive_key(params.key_material(), header.salt)?;
    let plaintext = AeadEngine::new(&key).open(&header.nonce, header.sealed)?;

    tracing::debug!(
        frame_len = frame.len(),
        plaintext_len = plaintext.len(),
        "opened frame"
    );
    Ok(plaintext)
}
