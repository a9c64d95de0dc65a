//! Delegate keypair.

use super::{DelegatePublicKey, DelegateSignature, EncodedPublicKey, KEY_LENGTH, KeyError};
use std::fmt;
use zeroize::Zeroizing;

/// A locally generated Ed25519 keypair authorized to act for a primary wallet.
///
/// The private half never leaves this value: it is not `Clone`, its `Debug`
/// output only shows the public key, and the seed is zeroized on drop.
pub struct DelegateKeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl DelegateKeyPair {
    /// Generate a fresh keypair from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::EntropyUnavailable`] if the platform cannot supply
    /// secure randomness.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = Zeroizing::new([0u8; KEY_LENGTH]);
        getrandom::getrandom(seed.as_mut_slice()).map_err(KeyError::EntropyUnavailable)?;
        Ok(Self::from_secret_bytes(&seed))
    }

    /// Restore a keypair from its 32-byte seed.
    #[must_use]
    pub fn from_secret_bytes(seed: &[u8; KEY_LENGTH]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Restore a keypair from a seed of unchecked length.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidPrivateKey`] unless `seed` is exactly 32
    /// bytes.
    pub fn import(seed: &[u8]) -> Result<Self, KeyError> {
        let seed: &[u8; KEY_LENGTH] = seed
            .try_into()
            .map_err(|_| KeyError::InvalidPrivateKey(seed.len()))?;
        Ok(Self::from_secret_bytes(seed))
    }

    /// Export the seed for persistence in a protected local store.
    ///
    /// The returned buffer is wiped when dropped.
    #[must_use]
    pub fn export(&self) -> Zeroizing<[u8; KEY_LENGTH]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// The public half of this keypair.
    #[must_use]
    pub fn public_key(&self) -> DelegatePublicKey {
        self.signing_key.verifying_key().into()
    }

    /// The `ed25519:<base58>` encoding of the public key.
    #[must_use]
    pub fn encoded_public_key(&self) -> EncodedPublicKey {
        self.public_key().encode()
    }

    /// Sign an operation payload.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> DelegateSignature {
        use ed25519_dalek::Signer;
        self.signing_key.sign(payload)
    }
}

impl signature::Signer<DelegateSignature> for DelegateKeyPair {
    fn try_sign(&self, msg: &[u8]) -> Result<DelegateSignature, signature::Error> {
        signature::Signer::try_sign(&self.signing_key, msg)
    }
}

impl fmt::Debug for DelegateKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateKeyPair")
            .field("public_key", &self.encoded_public_key().as_str())
            .finish_non_exhaustive()
    }
}

/// Derive the public key for a private key seed.
///
/// # Errors
///
/// Returns [`KeyError::InvalidPrivateKey`] unless `private_key` is a 32-byte
/// Ed25519 seed.
pub fn derive_public_key(private_key: &[u8]) -> Result<DelegatePublicKey, KeyError> {
    Ok(DelegateKeyPair::import(private_key)?.public_key())
}
