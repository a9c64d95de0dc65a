//! Error types for delegate key operations.

use crate::ErrorKind;
use thiserror::Error;

/// Errors from generating, importing or decoding delegate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The platform RNG failed.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(getrandom::Error),

    /// The private key bytes are not a 32-byte Ed25519 seed.
    #[error("expected a 32 byte ed25519 seed, got {0} bytes")]
    InvalidPrivateKey(usize),

    /// The public key encoding could not be decoded.
    #[error("malformed public key encoding: {0}")]
    MalformedEncoding(#[from] EncodingError),
}

impl KeyError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EntropyUnavailable(_) => ErrorKind::EntropyUnavailable,
            Self::InvalidPrivateKey(_) => ErrorKind::InvalidPrivateKey,
            Self::MalformedEncoding(_) => ErrorKind::MalformedEncoding,
        }
    }
}

/// Reasons an [`super::EncodedPublicKey`] fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EncodingError {
    /// The `ed25519:` prefix is missing.
    #[error("missing 'ed25519:' prefix")]
    MissingPrefix,

    /// The payload is not base58.
    #[error("invalid base58 payload")]
    InvalidBase58,

    /// The decoded payload is not 32 bytes long.
    #[error("expected 32 key bytes, got {0}")]
    InvalidLength(usize),

    /// The bytes do not describe a point on the curve.
    #[error("key bytes are not a valid ed25519 point")]
    InvalidPoint,
}
