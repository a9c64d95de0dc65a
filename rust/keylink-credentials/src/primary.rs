//! Primary wallet identities and the signatures they produce.
//!
//! A primary address is what binds a delegation to an on-chain identity. The
//! address scheme decides how a signature is checked:
//!
//! - [`EvmAddress`]: the signature is an EIP-191 `personal_sign` signature and
//!   the address is recovered from it.
//! - [`SolanaAddress`]: the address is the Ed25519 public key and the signature
//!   is checked over the raw message.

mod error;
mod evm;
mod solana;

pub use error::PrimaryError;
pub use evm::{EVM_SIGNATURE_LENGTH, EvmAddress, EvmSigner, personal_message_hash};
pub use solana::{SOLANA_SIGNATURE_LENGTH, SolanaAddress, SolanaSigner};

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// The wallet account that authorizes a delegate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryAddress {
    /// An EVM account (`0x` + 40 hex digits).
    Evm(EvmAddress),
    /// A Solana account (base58 Ed25519 public key).
    Solana(SolanaAddress),
}

impl PrimaryAddress {
    /// Check that `signature` over `message` was produced by this account.
    ///
    /// # Errors
    ///
    /// Returns a [`PrimaryError`] describing why the signature was refused.
    pub fn verify(&self, message: &[u8], signature: &PrimarySignature) -> Result<(), PrimaryError> {
        match self {
            Self::Evm(address) => address.verify(message, signature),
            Self::Solana(address) => address.verify(message, signature),
        }
    }
}

impl From<EvmAddress> for PrimaryAddress {
    fn from(address: EvmAddress) -> Self {
        Self::Evm(address)
    }
}

impl From<SolanaAddress> for PrimaryAddress {
    fn from(address: SolanaAddress) -> Self {
        Self::Solana(address)
    }
}

impl fmt::Display for PrimaryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm(address) => fmt::Display::fmt(address, f),
            Self::Solana(address) => fmt::Display::fmt(address, f),
        }
    }
}

impl FromStr for PrimaryAddress {
    type Err = PrimaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Ok(Self::Evm(s.parse()?))
        } else {
            Ok(Self::Solana(s.parse()?))
        }
    }
}

impl Serialize for PrimaryAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrimaryAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Signature bytes produced by a primary wallet.
///
/// Transported as `0x`-prefixed hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PrimarySignature(Vec<u8>);

impl PrimarySignature {
    /// The raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PrimarySignature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PrimarySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for PrimarySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimarySignature({self})")
    }
}

impl FromStr for PrimarySignature {
    type Err = PrimaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(digits)
            .map(Self)
            .map_err(|_| PrimaryError::InvalidSignatureEncoding)
    }
}

impl Serialize for PrimarySignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrimarySignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An in-process primary wallet key of either scheme.
#[derive(Debug)]
pub enum PrimarySigner {
    /// EVM account key.
    Evm(EvmSigner),
    /// Solana account key.
    Solana(SolanaSigner),
}

impl PrimarySigner {
    /// The account address.
    #[must_use]
    pub fn address(&self) -> PrimaryAddress {
        match self {
            Self::Evm(signer) => signer.address().into(),
            Self::Solana(signer) => signer.address().into(),
        }
    }

    /// Sign `message` the way a wallet of this scheme would.
    ///
    /// # Errors
    ///
    /// Returns [`PrimaryError::InvalidSigningKey`] if the EVM signer fails.
    pub fn sign(&self, message: &[u8]) -> Result<PrimarySignature, PrimaryError> {
        match self {
            Self::Evm(signer) => signer.sign(message),
            Self::Solana(signer) => Ok(signer.sign(message)),
        }
    }
}

impl From<EvmSigner> for PrimarySigner {
    fn from(signer: EvmSigner) -> Self {
        Self::Evm(signer)
    }
}

impl From<SolanaSigner> for PrimarySigner {
    fn from(signer: SolanaSigner) -> Self {
        Self::Solana(signer)
    }
}
