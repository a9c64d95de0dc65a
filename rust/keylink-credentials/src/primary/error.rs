//! Error types for primary address parsing and signature checks.

use crate::ErrorKind;
use thiserror::Error;

/// Errors from parsing primary addresses or verifying their signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimaryError {
    /// The address text is not a recognized EVM or Solana address.
    #[error("invalid primary address: {0}")]
    InvalidAddress(String),

    /// The signature text is not valid hex.
    #[error("invalid primary signature encoding")]
    InvalidSignatureEncoding,

    /// The signature has the wrong length for the address scheme.
    #[error("expected a {expected} byte signature, got {actual} bytes")]
    InvalidSignatureLength {
        /// Length required by the scheme.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// The EVM recovery byte is not one of 0, 1, 27 or 28.
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    /// The signature recovers to a different address.
    #[error("signature was produced by {recovered}, not the claimed address")]
    SignerMismatch {
        /// Address the signature actually recovers to.
        recovered: String,
    },

    /// The signature is malformed or does not verify.
    #[error("primary signature verification failed")]
    Verification,

    /// A local signing key could not be constructed or used.
    #[error("invalid primary signing key")]
    InvalidSigningKey,
}

impl PrimaryError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress(_) | Self::InvalidSignatureEncoding => {
                ErrorKind::MalformedEncoding
            }
            Self::InvalidSigningKey => ErrorKind::InvalidPrivateKey,
            Self::InvalidSignatureLength { .. }
            | Self::InvalidRecoveryId(_)
            | Self::SignerMismatch { .. }
            | Self::Verification => ErrorKind::BadSignature,
        }
    }
}
