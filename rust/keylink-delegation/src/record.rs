use crate::{
    ChainContext, DelegationStatement, RegistrationResponse, Rejection, Verdict, verify,
};
use keylink_credentials::{DelegatePublicKey, PrimaryAddress, PrimarySignature};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The `(broker, account, chain)` triple a delegation occupies.
///
/// At most one record is outstanding per slot; issuing again for the same
/// slot supersedes the previous record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// Broker identifier.
    pub broker_id: String,
    /// Account identifier.
    pub account_id: String,
    /// Chain identifier.
    pub chain_id: u64,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.broker_id, self.account_id, self.chain_id)
    }
}

/// A signed delegation as held by the delegate and presented to relying
/// parties.
///
/// A record only carries public material. `valid_signer` starts out `false`
/// and is only set through [`apply_registration`](Self::apply_registration),
/// which re-verifies the record first. A deserialized record whose primary
/// signature does not verify comes back unregistered, whatever the input
/// claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordFields")]
pub struct DelegationRecord {
    statement: DelegationStatement,
    primary_signature: PrimarySignature,
    primary_address: PrimaryAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    valid_signer: bool,
}

/// Record fields as found in a file or payload.
#[derive(Deserialize)]
struct RecordFields {
    statement: DelegationStatement,
    primary_signature: PrimarySignature,
    primary_address: PrimaryAddress,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    valid_signer: bool,
}

impl From<RecordFields> for DelegationRecord {
    fn from(fields: RecordFields) -> Self {
        let mut record = Self::new(
            fields.statement,
            fields.primary_signature,
            fields.primary_address,
        );
        if record.primary_signature_verifies() {
            record.user_id = fields.user_id;
            record.valid_signer = fields.valid_signer;
        } else if fields.valid_signer || fields.user_id.is_some() {
            warn!(
                slot = %record.slot(),
                "dropping registration of a record whose primary signature does not verify"
            );
        }
        record
    }
}

impl DelegationRecord {
    /// Assemble an unregistered record.
    pub fn new(
        statement: DelegationStatement,
        primary_signature: PrimarySignature,
        primary_address: PrimaryAddress,
    ) -> Self {
        Self {
            statement,
            primary_signature,
            primary_address,
            user_id: None,
            valid_signer: false,
        }
    }

    /// The signed statement.
    pub const fn statement(&self) -> &DelegationStatement {
        &self.statement
    }

    /// The primary wallet's signature over the statement's canonical bytes.
    pub const fn primary_signature(&self) -> &PrimarySignature {
        &self.primary_signature
    }

    /// The primary identity that signed the statement.
    pub const fn primary_address(&self) -> &PrimaryAddress {
        &self.primary_address
    }

    /// Broker-assigned user id, once registered.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Whether the broker has accepted this delegate key.
    pub const fn valid_signer(&self) -> bool {
        self.valid_signer
    }

    /// Shorthand for the statement's delegate key.
    pub const fn delegate_public_key(&self) -> &DelegatePublicKey {
        self.statement.delegate_public_key()
    }

    /// Shorthand for the statement's chain.
    pub const fn chain(&self) -> &ChainContext {
        self.statement.chain()
    }

    /// The slot this record occupies.
    pub fn slot(&self) -> Slot {
        Slot {
            broker_id: self.statement.broker_id().to_owned(),
            account_id: self.statement.account_id().to_owned(),
            chain_id: self.statement.chain().chain_id,
        }
    }

    fn primary_signature_verifies(&self) -> bool {
        self.primary_address
            .verify(&self.statement.canonical_bytes(), &self.primary_signature)
            .is_ok()
    }

    /// Merge a broker's registration response.
    ///
    /// The record is verified at `now` first; a record that does not verify
    /// is left untouched, whatever the broker claims.
    pub fn apply_registration(
        &mut self,
        response: RegistrationResponse,
        now: u64,
    ) -> Result<(), Rejection> {
        if let Verdict::Rejected(rejection) = verify(self, now) {
            return Err(rejection);
        }
        self.user_id = Some(response.user_id);
        self.valid_signer = response.valid_signer;
        Ok(())
    }
}
