//! Solana accounts: the address is the base58 Ed25519 public key.

use super::{PrimaryError, PrimarySignature};
use base58::{FromBase58, ToBase58};
use std::{fmt, str::FromStr};

/// Length of a Solana `signMessage` signature.
pub const SOLANA_SIGNATURE_LENGTH: usize = 64;

/// A Solana account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolanaAddress(ed25519_dalek::VerifyingKey);

impl SolanaAddress {
    /// Raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Check that `signature` is this account's Ed25519 signature over the
    /// raw `message` bytes.
    ///
    /// # Errors
    ///
    /// Fails if the signature is not 64 bytes or does not verify.
    pub fn verify(&self, message: &[u8], signature: &PrimarySignature) -> Result<(), PrimaryError> {
        let bytes: &[u8; SOLANA_SIGNATURE_LENGTH] =
            signature.as_bytes().try_into().map_err(|_| {
                PrimaryError::InvalidSignatureLength {
                    expected: SOLANA_SIGNATURE_LENGTH,
                    actual: signature.as_bytes().len(),
                }
            })?;
        let signature = ed25519_dalek::Signature::from_bytes(bytes);
        self.0
            .verify_strict(message, &signature)
            .map_err(|_| PrimaryError::Verification)
    }
}

impl From<ed25519_dalek::VerifyingKey> for SolanaAddress {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.as_bytes().to_base58())
    }
}

impl fmt::Debug for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolanaAddress({self})")
    }
}

impl FromStr for SolanaAddress {
    type Err = PrimaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrimaryError::InvalidAddress(s.to_owned());
        let bytes = s.from_base58().map_err(|_| invalid())?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| invalid())?;
        ed25519_dalek::VerifyingKey::from_bytes(&key)
            .map(Self)
            .map_err(|_| invalid())
    }
}

/// An in-process Solana account key.
pub struct SolanaSigner {
    key: ed25519_dalek::SigningKey,
}

impl SolanaSigner {
    /// Construct from a 32-byte Ed25519 seed.
    #[must_use]
    pub fn from_secret_bytes(seed: &[u8; 32]) -> Self {
        Self {
            key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The account address.
    #[must_use]
    pub fn address(&self) -> SolanaAddress {
        SolanaAddress(self.key.verifying_key())
    }

    /// Sign the raw `message` bytes.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> PrimarySignature {
        use ed25519_dalek::Signer;
        PrimarySignature::from(self.key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for SolanaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
