#![warn(missing_docs)]

//! Key material for delegate-key authorization.
//!
//! This crate provides the two kinds of identity that take part in a
//! delegation:
//!
//! - **Delegate keys** ([`DelegateKeyPair`]): locally generated Ed25519
//!   keypairs that sign routine operations. Their public half travels as an
//!   [`EncodedPublicKey`] (`ed25519:<base58>`).
//! - **Primary addresses** ([`PrimaryAddress`]): the wallet identity that
//!   authorizes a delegate key. EVM (`0x…`, EIP-191 `personal_sign`) and
//!   Solana (base58 Ed25519) accounts are supported.

mod kind;
pub use kind::ErrorKind;

pub mod delegate;
pub use delegate::*;

pub mod primary;
pub use primary::*;
