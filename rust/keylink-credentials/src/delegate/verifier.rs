//! Delegate public key.

use super::{DelegateSignature, EncodedPublicKey, EncodingError, KEY_LENGTH, KeyError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The public half of a delegate keypair.
///
/// Serializes as its [`EncodedPublicKey`] text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegatePublicKey(ed25519_dalek::VerifyingKey);

impl DelegatePublicKey {
    /// Construct from raw public key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MalformedEncoding`] if the bytes are not a valid
    /// Ed25519 point.
    pub fn from_bytes(bytes: &[u8; KEY_LENGTH]) -> Result<Self, KeyError> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| EncodingError::InvalidPoint.into())
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Borrow the raw public key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// The `ed25519:<base58>` encoding of this key.
    #[must_use]
    pub fn encode(&self) -> EncodedPublicKey {
        EncodedPublicKey::encode(self)
    }

    /// Strictly verify `signature` over `msg`.
    ///
    /// Weak keys and non-canonical signatures are rejected.
    ///
    /// # Errors
    ///
    /// Returns `signature::Error` if verification fails.
    pub fn verify_strict(
        &self,
        msg: &[u8],
        signature: &DelegateSignature,
    ) -> Result<(), signature::Error> {
        self.0.verify_strict(msg, signature)
    }
}

impl From<ed25519_dalek::VerifyingKey> for DelegatePublicKey {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key)
    }
}

impl signature::Verifier<DelegateSignature> for DelegatePublicKey {
    fn verify(&self, msg: &[u8], signature: &DelegateSignature) -> Result<(), signature::Error> {
        self.verify_strict(msg, signature)
    }
}

impl fmt::Display for DelegatePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Debug for DelegatePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DelegatePublicKey")
            .field(&self.encode().as_str())
            .finish()
    }
}

impl Serialize for DelegatePublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DelegatePublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        EncodedPublicKey::deserialize(deserializer)?
            .decode()
            .map_err(serde::de::Error::custom)
    }
}
