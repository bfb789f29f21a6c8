use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("key is not set")]
    MissingKey,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("key is too short: expecting {expected} bytes, got {actual}")]
    ShortKey { expected: usize, actual: usize },

    #[error("data chunk is too big: {len} bytes, max frame size is {} bytes", u32::MAX)]
    OversizedInput { len: usize },

    #[error("secure random source unavailable: {0}")]
    Randomness(#[source] rand::Error),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("unexpected end of data: {0}")]
    Truncated(&'static str),

    /// Tag mismatch. Tampering and a wrong key are indistinguishable.
    #[error("authentication failed: wrong key or corrupted data")]
    Authentication,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, CodecError::Authentication)
    }
}
