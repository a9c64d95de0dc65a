//! Ed25519 delegate keys and their textual encoding.

mod encoding;
mod error;
mod signer;
mod verifier;

pub use encoding::{ENCODED_KEY_PREFIX, EncodedPublicKey};
pub use error::{EncodingError, KeyError};
pub use signer::{DelegateKeyPair, derive_public_key};
pub use verifier::DelegatePublicKey;

/// Signature produced by a delegate key over an operation.
pub type DelegateSignature = ed25519_dalek::Signature;

/// Length in bytes of a delegate key seed and of its public key.
pub const KEY_LENGTH: usize = 32;
