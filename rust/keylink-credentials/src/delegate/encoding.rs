//! The `ed25519:<base58>` public key encoding.

use super::{DelegatePublicKey, EncodingError, KEY_LENGTH, KeyError};
use base58::{FromBase58, ToBase58};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Prefix of every encoded delegate public key.
pub const ENCODED_KEY_PREFIX: &str = "ed25519:";

/// Textual form of a delegate public key: `"ed25519:" + base58(bytes)`.
///
/// This is the only representation of a delegate key that is displayed or
/// transmitted. An `EncodedPublicKey` may hold arbitrary text (e.g. when it
/// was received from a remote party), so [`EncodedPublicKey::decode`] is
/// where validation happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPublicKey(String);

impl EncodedPublicKey {
    /// Encode a public key.
    #[must_use]
    pub fn encode(key: &DelegatePublicKey) -> Self {
        let b58 = ToBase58::to_base58(key.to_bytes().as_slice());
        Self(format!("{ENCODED_KEY_PREFIX}{b58}"))
    }

    /// Decode back into a public key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedEncoding`] if the prefix is wrong, the
    /// payload is not base58, the decoded length is not 32 bytes, or the bytes
    /// are not a valid Ed25519 point.
    pub fn decode(&self) -> Result<DelegatePublicKey, KeyError> {
        let b58 = self
            .0
            .strip_prefix(ENCODED_KEY_PREFIX)
            .ok_or(EncodingError::MissingPrefix)?;
        let bytes = b58.from_base58().map_err(|_| EncodingError::InvalidBase58)?;
        let key: [u8; KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| EncodingError::InvalidLength(bytes.len()))?;
        DelegatePublicKey::from_bytes(&key)
    }

    /// The encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&DelegatePublicKey> for EncodedPublicKey {
    fn from(key: &DelegatePublicKey) -> Self {
        Self::encode(key)
    }
}

impl From<String> for EncodedPublicKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EncodedPublicKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DelegatePublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncodedPublicKey::from(s).decode()
    }
}
