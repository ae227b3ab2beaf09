//! Codec error types

use thiserror::Error;

/// Errors produced by the payload codec
#[derive(Debug, Error)]
pub enum CodecError {
    /// Neither or both of `asym_pub_key`/`sym_key` were supplied, or a key
    /// had the wrong length
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The RNG returned a wrong-length or all-zero padding buffer
    #[error("padding generation failed")]
    PaddingGenerationFailed,

    /// The flags byte, size-field, or overall envelope length was malformed
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// AES-GCM authentication tag or ECIES MAC did not verify, or a shared
    /// secret could not be derived
    #[error("decryption failed")]
    DecryptionFailed,

    /// The payload is too large to be framed by a version-1 envelope: its
    /// length needs a 4-byte size field, but the flags byte's low two bits
    /// can only represent 1-3
    #[error("payload too large: {len} bytes needs a size field wider than 3 bytes")]
    PayloadTooLarge {
        /// Length of the payload that was rejected
        len: usize,
    },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
