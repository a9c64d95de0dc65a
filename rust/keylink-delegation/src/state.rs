use keylink_credentials::{EncodedPublicKey, ErrorKind};
use serde::Serialize;

/// Progress of a delegation attempt, as observed through
/// [`crate::DelegationIssuer::subscribe`].
///
/// ```text
/// Idle -> Generating -> AwaitingSignature -> Issued
///                                          -> Declined
///                                          -> Failed
/// ```
///
/// `Generating` is skipped when the caller supplies a keypair. A dropped
/// attempt returns to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IssuanceState {
    /// No attempt in progress.
    #[default]
    Idle,
    /// Generating a delegate keypair.
    Generating,
    /// Waiting for the wallet to sign the statement.
    AwaitingSignature,
    /// The last attempt produced a record for this delegate key.
    Issued {
        /// The newly authorized key.
        delegate_public_key: EncodedPublicKey,
    },
    /// The user declined the last signing request.
    Declined,
    /// The last attempt failed.
    Failed {
        /// Why it failed.
        kind: ErrorKind,
    },
}

impl IssuanceState {
    /// Whether an attempt is in flight.
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::AwaitingSignature)
    }
}
