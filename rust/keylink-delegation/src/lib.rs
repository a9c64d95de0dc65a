#![warn(missing_docs)]

//! Delegate-key issuance and verification.
//!
//! A primary wallet authorizes a locally generated delegate key by signing a
//! [`DelegationStatement`]. The resulting [`DelegationRecord`] is what a
//! relying party checks before accepting operations signed by the delegate
//! key.
//!
//! # Overview
//!
//! 1. [`DelegationIssuer::issue`] generates (or accepts) a delegate keypair,
//!    builds the statement, and asks a [`WalletSigner`] to sign its
//!    [canonical bytes](DelegationStatement::canonical_bytes).
//! 2. The caller submits a [`RegistrationRequest`] to the broker and merges
//!    the [`RegistrationResponse`] with
//!    [`DelegationRecord::apply_registration`].
//! 3. Relying parties call [`verify`] on the record and
//!    [`authorize_operation`] on each delegate-signed operation.
//!
//! # Example
//!
//! ```ignore
//! use keylink_delegation::{ChainContext, DelegationIssuer, Verdict, authorize_operation};
//!
//! let issuer = DelegationIssuer::default();
//! let chain = ChainContext::new(42161, "0x6F7a338F2aA472838dEFD3283eB360d4Dff5D203");
//! let issued = issuer.issue(&wallet, &chain, "orderly", "acct-1", None).await?;
//!
//! let operation = b"order:place:ETH-PERP:1";
//! let signature = issued.key.sign(operation);
//! assert_eq!(
//!     authorize_operation(&issued.record, operation, &signature, now),
//!     Verdict::Accepted
//! );
//! ```

mod chain;
pub use chain::*;

pub mod error;
pub use error::*;

mod issuer;
pub use issuer::*;

mod record;
pub use record::*;

mod registration;
pub use registration::*;

mod state;
pub use state::*;

mod statement;
pub use statement::*;

mod store;
pub use store::*;

pub mod time;

mod verifier;
pub use verifier::*;

mod wallet;
pub use wallet::*;

pub use keylink_credentials::{
    DelegateKeyPair, DelegatePublicKey, DelegateSignature, EncodedPublicKey, ErrorKind,
    PrimaryAddress, PrimarySignature,
};
