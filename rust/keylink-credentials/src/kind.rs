//! Failure classification shared by every layer of the protocol.

use serde::Serialize;

/// The kind of a failure, independent of which component produced it.
///
/// Relying parties and UIs branch on the kind rather than on concrete error
/// types, so a kind is stable across crate boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The platform could not supply secure randomness.
    EntropyUnavailable,
    /// A private key is not a valid Ed25519 seed.
    InvalidPrivateKey,
    /// A textual or binary encoding could not be decoded.
    MalformedEncoding,
    /// A caller supplied an empty or out-of-range field.
    InvalidInput,
    /// The wallet has no active account.
    NoActiveAccount,
    /// The wallet is connected to a different chain than requested.
    ChainMismatch,
    /// The user declined to sign.
    SigningDeclined,
    /// The wallet or its transport failed while signing.
    SigningFailed,
    /// The primary signature does not verify.
    BadSignature,
    /// The operation signature does not verify against the delegate key.
    BadDelegateSignature,
    /// The delegation has expired.
    Expired,
}

impl ErrorKind {
    /// Whether retrying the same request may succeed without user action.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::SigningFailed)
    }
}
