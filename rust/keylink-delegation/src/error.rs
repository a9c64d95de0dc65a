//! Error types for statement construction and issuance.
//!
//! Verification failures are not errors: they are reported as
//! [`crate::Rejection`] values inside a [`crate::Verdict`].

use keylink_credentials::{ErrorKind, KeyError, PrimaryError};

/// Errors from building or parsing a [`crate::DelegationStatement`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatementError {
    /// A required field is empty or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The canonical bytes end before the statement is complete.
    #[error("canonical bytes truncated while reading {0}")]
    Truncated(&'static str),

    /// The canonical bytes continue after the statement ends.
    #[error("{0} unexpected bytes after the statement")]
    TrailingBytes(usize),

    /// An identifier is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// The delegate public key is not a valid Ed25519 point.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl StatementError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Truncated(_) | Self::TrailingBytes(_) | Self::InvalidUtf8(_) => {
                ErrorKind::MalformedEncoding
            }
            Self::Key(error) => error.kind(),
        }
    }
}

/// Errors from [`crate::DelegationIssuer::issue`].
///
/// Every variant aborts the attempt; no record is produced and any key the
/// issuer generated is dropped.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// Key generation failed.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The statement could not be built.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// The wallet has no connected account.
    #[error("wallet has no active account")]
    NoActiveAccount,

    /// The wallet is connected to another chain.
    #[error("wallet is on chain {actual}, delegation targets chain {expected}")]
    ChainMismatch {
        /// Chain the delegation targets.
        expected: u64,
        /// Chain the wallet is connected to.
        actual: u64,
    },

    /// The user rejected the signing request.
    #[error("signing declined by the user")]
    SigningDeclined,

    /// The wallet or its transport failed; the attempt may be retried.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

impl IssueError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Key(error) => error.kind(),
            Self::Statement(error) => error.kind(),
            Self::NoActiveAccount => ErrorKind::NoActiveAccount,
            Self::ChainMismatch { .. } => ErrorKind::ChainMismatch,
            Self::SigningDeclined => ErrorKind::SigningDeclined,
            Self::SigningFailed(_) => ErrorKind::SigningFailed,
        }
    }

    /// Whether the same attempt may succeed if retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<PrimaryError> for IssueError {
    fn from(error: PrimaryError) -> Self {
        Self::SigningFailed(error.to_string())
    }
}

impl From<crate::WalletError> for IssueError {
    fn from(error: crate::WalletError) -> Self {
        match error {
            crate::WalletError::Declined => Self::SigningDeclined,
            crate::WalletError::Failed(reason) => Self::SigningFailed(reason),
        }
    }
}

/// Errors from the [`crate::RecordBook`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A newer record already occupies the slot.
    #[error("slot {slot} already holds a record issued at {held}, refusing one issued at {offered}")]
    Stale {
        /// The contested slot.
        slot: crate::Slot,
        /// Issue time of the record held.
        held: u64,
        /// Issue time of the record offered.
        offered: u64,
    },

    /// Reading or writing the record file failed.
    #[error("record file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record file is not valid JSON for this format.
    #[error("record file is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// The record file was written by an unsupported format version.
    #[error("unsupported record file version {0}")]
    UnsupportedVersion(u32),
}
