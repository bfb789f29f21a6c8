//! Chunked streaming encryption with memory bounded by the chunk size
//!
//! Stream format (binary):
//! ```text
//! [salt_size bytes: salt][24 bytes: nonce][chunk_0][chunk_1]...[chunk_n]
//! chunk_i = [≤ chunk_size bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! Chunks carry no length field: both sides must agree on `chunk_size`, and
//! only the final chunk may be short. The key and the header nonce are fixed
//! for the whole stream; see [`NonceSchedule`] for how chunk nonces are
//! taken from it.
//!
//! Any I/O or authentication failure ends the stream. Plaintext already
//! handed to the writer is not retracted.

use std::io::{self, Read, Write};

use crate::aead::{AeadEngine, Nonce};
use crate::error::{CodecError, Result};
use crate::kdf::{derive_key, generate_salt};
use crate::params::{NonceSchedule, Params};
use crate::{NONCE_SIZE, TAG_SIZE};

/// What crossed the wire during one streaming call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Number of sealed chunks written or opened
    pub chunks: u64,
    /// Plaintext bytes consumed (encrypt) or produced (decrypt)
    pub plaintext_bytes: u64,
    /// Encrypted bytes produced (encrypt) or consumed (decrypt), header included
    pub wire_bytes: u64,
}

/// Encrypt everything `reader` yields into `writer`.
///
/// Writes the salt, derives the key, writes the nonce, then seals each
/// `chunk_size` block of input until the reader reports end of input.
pub fn encrypt_stream<R: Read, W: Write>(
    params: &Params,
    mut reader: R,
    mut writer: W,
    chunk_size: usize,
) -> Result<StreamSummary> {
    params.check_key()?;
    check_chunk_size(chunk_size)?;
    let schedule = params.stream_nonce();

    let salt = generate_salt(params.salt_size())?;
    writer.write_all(&salt)?;

    let key = derive_key(params.key_material(), &salt)?;
    let aead = AeadEngine::new(&key);

    let nonce = Nonce::random()?;
    writer.write_all(nonce.as_bytes())?;

    let mut summary = StreamSummary {
        wire_bytes: (salt.len() + NONCE_SIZE) as u64,
        ..StreamSummary::default()
    };

    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }

        let chunk_nonce = schedule.nonce_for(&nonce, summary.chunks);
        let sealed = aead.seal(&chunk_nonce, &buf[..n])?;
        writer.write_all(&sealed)?;

        tracing::trace!(chunk = summary.chunks, len = n, "sealed stream chunk");
        summary.chunks += 1;
        summary.plaintext_bytes += n as u64;
        summary.wire_bytes += sealed.len() as u64;
    }
    writer.flush()?;

    log_summary("encrypted stream", schedule, &summary);
    Ok(summary)
}

/// Decrypt a stream written by [`encrypt_stream`] with the same `chunk_size`.
pub fn decrypt_stream<R: Read, W: Write>(
    params: &Params,
    mut reader: R,
    mut writer: W,
    chunk_size: usize,
) -> Result<StreamSummary> {
    params.check_key()?;
    check_chunk_size(chunk_size)?;
    let schedule = params.stream_nonce();

    let mut salt = vec![0u8; params.salt_size()];
    reader
        .read_exact(&mut salt)
        .map_err(|e| header_error(e, "stream salt"))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    reader
        .read_exact(&mut nonce_bytes)
        .map_err(|e| header_error(e, "stream nonce"))?;
    let nonce = Nonce::from_bytes(nonce_bytes);

    let key = derive_key(params.key_material(), &salt)?;
    let aead = AeadEngine::new(&key);

    let mut summary = StreamSummary {
        wire_bytes: (salt.len() + NONCE_SIZE) as u64,
        ..StreamSummary::default()
    };

    let mut buf = vec![0u8; chunk_size + TAG_SIZE];
    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }

        let chunk_nonce = schedule.nonce_for(&nonce, summary.chunks);
        let plaintext = aead.open(&chunk_nonce, &buf[..n]).inspect_err(|_| {
            tracing::debug!(chunk = summary.chunks, "stream chunk failed authentication");
        })?;
        writer.write_all(&plaintext)?;

        tracing::trace!(chunk = summary.chunks, len = plaintext.len(), "opened stream chunk");
        summary.chunks += 1;
        summary.plaintext_bytes += plaintext.len() as u64;
        summary.wire_bytes += n as u64;
    }
    writer.flush()?;

    log_summary("decrypted stream", schedule, &summary);
    Ok(summary)
}

fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > usize::MAX - TAG_SIZE {
        return Err(CodecError::InvalidParams(format!(
            "chunk size must be between 1 and {} bytes, got {chunk_size}",
            usize::MAX - TAG_SIZE
        )));
    }
    Ok(())
}

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Short reads are accumulated so a chunk is never split across two AEAD
/// calls by a transport that hands data over piecemeal. Returns the number of
/// bytes filled; 0 means the reader was already exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn header_error(e: io::Error, what: &'static str) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::Truncated(what)
    } else {
        CodecError::Io(e)
    }
}

fn log_summary(what: &str, schedule: NonceSchedule, summary: &StreamSummary) {
    tracing::debug!(
        chunks = summary.chunks,
        plaintext_bytes = summary.plaintext_bytes,
        wire_bytes = summary.wire_bytes,
        schedule = ?schedule,
        "{what}"
    );
}
