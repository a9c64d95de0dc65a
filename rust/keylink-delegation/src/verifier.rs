//! Relying-party checks on delegation records.
//!
//! This module handles:
//! 1. Primary signature verification over the canonical statement bytes
//! 2. Expiry checking against a caller-supplied clock reading
//! 3. Delegate signature verification on individual operations
//!
//! Nothing here reads a clock or touches the network, so every check is
//! deterministic and safe to run concurrently.

use crate::DelegationRecord;
use keylink_credentials::{DelegateSignature, ErrorKind};
use tracing::debug;

/// Why a record or operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The primary signature does not verify against the primary address.
    #[error("primary signature does not verify")]
    BadSignature,

    /// The delegation expired before the check.
    #[error("delegation expired")]
    Expired,

    /// The operation signature does not verify against the delegate key.
    #[error("operation signature does not verify against the delegate key")]
    BadDelegateSignature,
}

impl Rejection {
    /// Classify this rejection.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadSignature => ErrorKind::BadSignature,
            Self::Expired => ErrorKind::Expired,
            Self::BadDelegateSignature => ErrorKind::BadDelegateSignature,
        }
    }
}

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Trust the record (and the operation, if one was checked).
    Accepted,
    /// Do not trust it.
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the check passed.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Convert into a `Result` for use with `?`.
    pub const fn into_result(self) -> Result<(), Rejection> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::Accepted,
            Err(rejection) => Self::Rejected(rejection),
        }
    }
}

/// Check a delegation record at `now` (Unix seconds).
///
/// 1. Recompute the statement's canonical bytes
/// 2. Verify the primary signature against the primary address
/// 3. Refuse the record if `now` is past its expiry
///
/// The signature is checked before the expiry, so a forged record is always
/// reported as [`Rejection::BadSignature`]. The record's `valid_signer` flag
/// plays no part.
pub fn verify(record: &DelegationRecord, now: u64) -> Verdict {
    check_record(record, now).into()
}

/// Check an operation signed by the record's delegate key.
///
/// Runs [`verify`] first and reports its rejection unchanged; only then is
/// `signature` checked over `operation` with the delegate key.
pub fn authorize_operation(
    record: &DelegationRecord,
    operation: &[u8],
    signature: &DelegateSignature,
    now: u64,
) -> Verdict {
    check_record(record, now)
        .and_then(|()| {
            record
                .delegate_public_key()
                .verify_strict(operation, signature)
                .map_err(|_| Rejection::BadDelegateSignature)
        })
        .inspect_err(|rejection| {
            debug!(
                slot = %record.slot(),
                delegate = %record.delegate_public_key(),
                %rejection,
                "operation refused"
            );
        })
        .into()
}

fn check_record(record: &DelegationRecord, now: u64) -> Result<(), Rejection> {
    let statement = record.statement();
    record
        .primary_address()
        .verify(&statement.canonical_bytes(), record.primary_signature())
        .map_err(|error| {
            debug!(
                slot = %record.slot(),
                primary = %record.primary_address(),
                %error,
                "primary signature refused"
            );
            Rejection::BadSignature
        })?;

    if !statement.is_live_at(now) {
        debug!(
            slot = %record.slot(),
            expires_at = statement.expires_at(),
            now,
            "delegation expired"
        );
        return Err(Rejection::Expired);
    }

    Ok(())
}
