//! The boundary with the broker that registers delegate keys, and the
//! read-only view shown to the account holder.

use crate::{DelegationRecord, Rejection, Verdict, verify};
use async_trait::async_trait;
use keylink_credentials::{EncodedPublicKey, PrimaryAddress, PrimarySignature};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// What a broker needs to register a delegate key.
///
/// Carries enough of the statement for the broker to rebuild its canonical
/// bytes and verify the primary signature itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Broker identifier.
    pub broker_id: String,
    /// Account identifier.
    pub account_id: String,
    /// Chain identifier.
    pub chain_id: u64,
    /// The delegate key to register.
    pub delegate_public_key: EncodedPublicKey,
    /// The primary wallet's signature over the statement.
    pub primary_signature: PrimarySignature,
    /// The primary wallet account.
    pub primary_address: PrimaryAddress,
    /// Statement issue time, Unix seconds.
    pub issued_at: u64,
    /// Statement expiry, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl From<&DelegationRecord> for RegistrationRequest {
    fn from(record: &DelegationRecord) -> Self {
        let statement = record.statement();
        Self {
            broker_id: statement.broker_id().to_owned(),
            account_id: statement.account_id().to_owned(),
            chain_id: statement.chain().chain_id,
            delegate_public_key: statement.delegate_public_key().encode(),
            primary_signature: record.primary_signature().clone(),
            primary_address: *record.primary_address(),
            issued_at: statement.issued_at(),
            expires_at: statement.expires_at(),
        }
    }
}

/// The broker's answer to a [`RegistrationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// The broker's user id for the account.
    pub user_id: String,
    /// Whether the broker accepts the delegate key as a signer.
    pub valid_signer: bool,
}

/// A broker that registers delegate keys.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Transport or broker failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit `request` to the broker.
    async fn register(&self, request: &RegistrationRequest) -> Result<RegistrationResponse, Self::Error>;
}

/// Why [`register`] did not update the record.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError<E> {
    /// The service failed.
    #[error("registration service failed: {0}")]
    Service(#[source] E),
    /// The record does not verify, so it was not submitted or not updated.
    #[error("record refused: {0}")]
    Rejected(#[from] Rejection),
}

/// Register `record` with `service` and merge the response into it.
///
/// The record is verified before it is submitted and again before the
/// response is merged.
pub async fn register<S>(
    service: &S,
    record: &mut DelegationRecord,
    now: u64,
) -> Result<(), RegistrationError<S::Error>>
where
    S: RegistrationService + ?Sized,
{
    verify(record, now).into_result()?;

    let request = RegistrationRequest::from(&*record);
    let response = service
        .register(&request)
        .await
        .map_err(RegistrationError::Service)?;

    record.apply_registration(response, now)?;
    info!(
        slot = %record.slot(),
        user_id = record.user_id(),
        valid_signer = record.valid_signer(),
        "delegate key registered"
    );
    Ok(())
}

const PLACEHOLDER: &str = "-";

/// Display strings describing an account and its delegate key.
///
/// Fields without a value read `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    /// Primary wallet address.
    pub address: String,
    /// Account identifier.
    pub account_id: String,
    /// Broker user id.
    pub user_id: String,
    /// Whether the delegate key is a valid signer.
    pub valid_signer: String,
    /// Encoded delegate key.
    pub delegate_key: String,
}

impl AccountView {
    /// Describe the connected `address`, with the record held for it, if any.
    ///
    /// The record only reads as a valid signer if it is
    /// [trusted](Self::is_trusted) at `now`.
    pub fn new(
        address: &PrimaryAddress,
        account_id: Option<&str>,
        record: Option<&DelegationRecord>,
        now: u64,
    ) -> Self {
        let account_id = account_id
            .or_else(|| record.map(|record| record.statement().account_id()))
            .filter(|account_id| !account_id.is_empty());
        let registered = record.filter(|record| record.user_id().is_some());

        Self {
            address: address.to_string(),
            account_id: text_or_placeholder(account_id),
            user_id: text_or_placeholder(registered.and_then(DelegationRecord::user_id)),
            valid_signer: registered
                .map(|record| Self::is_trusted(record, now).to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_owned()),
            delegate_key: record
                .map(|record| record.delegate_public_key().to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_owned()),
        }
    }

    /// Whether `record` both verifies at `now` and is registered as a valid
    /// signer.
    pub fn is_trusted(record: &DelegationRecord, now: u64) -> bool {
        record.valid_signer() && verify(record, now) == Verdict::Accepted
    }
}

fn text_or_placeholder(text: Option<&str>) -> String {
    text.unwrap_or(PLACEHOLDER).to_owned()
}

impl fmt::Display for AccountView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Address:      {}", self.address)?;
        writeln!(f, "Account ID:   {}", self.account_id)?;
        writeln!(f, "User ID:      {}", self.user_id)?;
        writeln!(f, "Valid Signer: {}", self.valid_signer)?;
        write!(f, "Delegate Key: {}", self.delegate_key)
    }
}
