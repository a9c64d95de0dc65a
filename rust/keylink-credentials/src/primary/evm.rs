//! EVM accounts: secp256k1 keys, Keccak-256 addresses and EIP-191 messages.

use super::{PrimaryError, PrimarySignature};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::{fmt, str::FromStr};

/// Length of an EVM `personal_sign` signature (`r || s || v`).
pub const EVM_SIGNATURE_LENGTH: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// A 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    /// Derive the address of a secp256k1 public key.
    #[must_use]
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag; the address is the last 20 bytes of the hash.
        let hash = Keccak256::digest(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Self(address)
    }

    /// Raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Recover the address that produced an EIP-191 signature over `message`.
    ///
    /// # Errors
    ///
    /// Fails if the signature is not 65 bytes, carries an invalid recovery
    /// byte, or does not recover to any key.
    pub fn recover(message: &[u8], signature: &PrimarySignature) -> Result<Self, PrimaryError> {
        let bytes = signature.as_bytes();
        if bytes.len() != EVM_SIGNATURE_LENGTH {
            return Err(PrimaryError::InvalidSignatureLength {
                expected: EVM_SIGNATURE_LENGTH,
                actual: bytes.len(),
            });
        }

        let v = bytes[64];
        let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
            .filter(|id| !id.is_x_reduced())
            .ok_or(PrimaryError::InvalidRecoveryId(v))?;
        let signature =
            Signature::from_slice(&bytes[..64]).map_err(|_| PrimaryError::Verification)?;

        let digest = personal_message_hash(message);
        let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
            .map_err(|_| PrimaryError::Verification)?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Check that `signature` over `message` was produced by this address.
    ///
    /// # Errors
    ///
    /// Returns [`PrimaryError::SignerMismatch`] when the signature is valid
    /// but belongs to another account, or any error from [`Self::recover`].
    pub fn verify(&self, message: &[u8], signature: &PrimarySignature) -> Result<(), PrimaryError> {
        let recovered = Self::recover(message, signature)?;
        if recovered == *self {
            Ok(())
        } else {
            Err(PrimaryError::SignerMismatch {
                recovered: recovered.to_string(),
            })
        }
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmAddress({self})")
    }
}

impl FromStr for EvmAddress {
    type Err = PrimaryError;

    /// Parses `0x`-prefixed hex. Mixed-case (EIP-55) input is accepted
    /// without checksum validation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| PrimaryError::InvalidAddress(s.to_owned()))?;
        let mut address = [0u8; 20];
        hex::decode_to_slice(digits, &mut address)
            .map_err(|_| PrimaryError::InvalidAddress(s.to_owned()))?;
        Ok(Self(address))
    }
}

/// The EIP-191 `personal_sign` digest of `message`.
#[must_use]
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// An in-process EVM account key, used where a local wallet stands in for
/// a browser or hardware wallet.
pub struct EvmSigner {
    key: SigningKey,
}

impl EvmSigner {
    /// Construct from a 32-byte secp256k1 secret scalar.
    ///
    /// # Errors
    ///
    /// Returns [`PrimaryError::InvalidSigningKey`] if the bytes are zero or
    /// not below the curve order.
    pub fn from_slice(secret: &[u8]) -> Result<Self, PrimaryError> {
        SigningKey::from_slice(secret)
            .map(|key| Self { key })
            .map_err(|_| PrimaryError::InvalidSigningKey)
    }

    /// The account address.
    #[must_use]
    pub fn address(&self) -> EvmAddress {
        EvmAddress::from_verifying_key(self.key.verifying_key())
    }

    /// Produce an EIP-191 `personal_sign` signature over `message`.
    ///
    /// # Errors
    ///
    /// Returns [`PrimaryError::InvalidSigningKey`] if signing fails.
    pub fn sign(&self, message: &[u8]) -> Result<PrimarySignature, PrimaryError> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .map_err(|_| PrimaryError::InvalidSigningKey)?;

        let mut bytes = Vec::with_capacity(EVM_SIGNATURE_LENGTH);
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.push(27 + recovery_id.to_byte());
        Ok(PrimarySignature::from(bytes))
    }
}

impl fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_signer(seed: u8) -> EvmSigner {
        EvmSigner::from_slice(&[seed; 32]).unwrap()
    }

    #[test]
    fn it_derives_the_well_known_address_for_key_one() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signer = EvmSigner::from_slice(&secret).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn it_recovers_the_signing_address() {
        let signer = test_signer(3);
        let signature = signer.sign(b"hello orderly").unwrap();
        assert_eq!(signature.as_bytes().len(), EVM_SIGNATURE_LENGTH);
        assert_eq!(
            EvmAddress::recover(b"hello orderly", &signature).unwrap(),
            signer.address()
        );
        assert!(signer.address().verify(b"hello orderly", &signature).is_ok());
    }

    #[test]
    fn it_accepts_zero_based_recovery_bytes() {
        let signer = test_signer(4);
        let signature = signer.sign(b"payload").unwrap();
        let mut bytes = signature.as_bytes().to_vec();
        bytes[64] -= 27;
        assert!(
            signer
                .address()
                .verify(b"payload", &PrimarySignature::from(bytes))
                .is_ok()
        );
    }

    #[test]
    fn it_reports_a_different_signer() {
        let alice = test_signer(5);
        let bob = test_signer(6);
        let signature = bob.sign(b"payload").unwrap();
        assert!(matches!(
            alice.address().verify(b"payload", &signature),
            Err(PrimaryError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn it_rejects_a_tampered_message() {
        let signer = test_signer(7);
        let signature = signer.sign(b"payload").unwrap();
        assert!(signer.address().verify(b"payl0ad", &signature).is_err());
    }

    #[test]
    fn it_rejects_bad_recovery_bytes_and_lengths() {
        let signer = test_signer(8);
        let signature = signer.sign(b"payload").unwrap();

        let mut bytes = signature.as_bytes().to_vec();
        bytes[64] = 30;
        assert_eq!(
            EvmAddress::recover(b"payload", &PrimarySignature::from(bytes)),
            Err(PrimaryError::InvalidRecoveryId(30))
        );

        let truncated = PrimarySignature::from(signature.as_bytes()[..64].to_vec());
        assert_eq!(
            EvmAddress::recover(b"payload", &truncated),
            Err(PrimaryError::InvalidSignatureLength {
                expected: 65,
                actual: 64
            })
        );
    }

    #[test]
    fn it_parses_mixed_case_addresses() {
        let parsed: EvmAddress = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap();
        assert_eq!(
            parsed.to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn it_rejects_malformed_addresses() {
        for input in [
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf",
            "0x7e5f4552091a69125d5dfcb7b8c2659029395b",
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf00",
            "0xzz5f4552091a69125d5dfcb7b8c2659029395bdf",
        ] {
            assert!(input.parse::<EvmAddress>().is_err(), "{input}");
        }
    }

    #[test]
    fn it_rejects_the_zero_scalar() {
        assert_eq!(
            EvmSigner::from_slice(&[0u8; 32]).unwrap_err(),
            PrimaryError::InvalidSigningKey
        );
    }
}
