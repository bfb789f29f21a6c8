//! cbx-crypto: passphrase-based authenticated encryption for cipherbox
//!
//! Architecture: scrypt KDF → XChaCha20-Poly1305, one derivation per operation
//!
//! Two wire formats share the same primitives:
//! ```text
//! One-shot:  [4 bytes: BE length][24 bytes: nonce][32 bytes: salt][ciphertext + 16-byte tag]
//! Stream:    [32 bytes: salt][24 bytes: nonce][chunk_0 + tag][chunk_1 + tag]...
//! ```
//!
//! The key handed to [`Params`] is treated as a passphrase: every operation
//! draws a fresh random salt and stretches `key[..key_size]` with scrypt
//! (N=2^15, r=8, p=1) before touching the cipher.

pub mod aead;
pub mod error;
pub mod frame;
pub mod kdf;
pub mod params;
pub mod stream;

pub use aead::{AeadEngine, Nonce};
pub use error::{CodecError, Result};
pub use kdf::{derive_key, DerivedKey};
pub use params::{NonceSchedule, Params, ParamsBuilder, ParamsOptions};
pub use stream::StreamSummary;

/// Size of a derived XChaCha20-Poly1305 key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Default size of the random KDF salt
pub const SALT_SIZE: usize = 32;
