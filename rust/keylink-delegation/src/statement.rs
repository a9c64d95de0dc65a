//! Delegation statements and their canonical byte encoding.

use crate::{ChainContext, StatementError};
use keylink_credentials::{DelegatePublicKey, KEY_LENGTH};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted broker or account identifier, in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 1024;

/// The message a primary wallet signs to authorize a delegate key.
///
/// Binds the broker, the account, the chain, the delegate public key and a
/// validity window. What the wallet signs is
/// [`canonical_bytes`](Self::canonical_bytes), so two logically equal
/// statements always produce the same signature input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatementFields")]
pub struct DelegationStatement {
    broker_id: String,
    account_id: String,
    chain: ChainContext,
    delegate_public_key: DelegatePublicKey,
    issued_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl DelegationStatement {
    /// Build a statement.
    ///
    /// A `ttl` of `None` or zero means the delegation never expires; otherwise
    /// it expires at `issued_at + ttl` (whole seconds).
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::InvalidInput`] if `broker_id` or `account_id`
    /// is empty or longer than [`MAX_IDENTIFIER_LENGTH`], or if the expiry
    /// overflows.
    pub fn build(
        broker_id: impl Into<String>,
        account_id: impl Into<String>,
        chain: ChainContext,
        delegate_public_key: DelegatePublicKey,
        issued_at: u64,
        ttl: Option<Duration>,
    ) -> Result<Self, StatementError> {
        let expires_at = match ttl.map(|ttl| ttl.as_secs()) {
            None | Some(0) => None,
            Some(seconds) => Some(issued_at.checked_add(seconds).ok_or_else(|| {
                StatementError::InvalidInput(format!(
                    "expiry overflows: issued at {issued_at} with ttl {seconds}s"
                ))
            })?),
        };

        StatementFields {
            broker_id: broker_id.into(),
            account_id: account_id.into(),
            chain,
            delegate_public_key,
            issued_at,
            expires_at,
        }
        .try_into()
    }

    /// The broker the delegate key may act with.
    #[must_use]
    pub fn broker_id(&self) -> &str {
        &self.broker_id
    }

    /// The account the delegate key may act for.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The targeted chain.
    #[must_use]
    pub const fn chain(&self) -> &ChainContext {
        &self.chain
    }

    /// The authorized delegate key.
    #[must_use]
    pub const fn delegate_public_key(&self) -> &DelegatePublicKey {
        &self.delegate_public_key
    }

    /// Issue time in Unix seconds.
    #[must_use]
    pub const fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// Expiry in Unix seconds, if any.
    #[must_use]
    pub const fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// Whether the statement is still within its validity window at `now`.
    ///
    /// The expiry instant itself is still valid.
    #[must_use]
    pub fn is_live_at(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }

    /// The exact bytes the primary wallet signs.
    ///
    /// Layout, all integers big-endian:
    ///
    /// | field | encoding |
    /// |-------|----------|
    /// | broker id | `u32` byte length, UTF-8 |
    /// | account id | `u32` byte length, UTF-8 |
    /// | chain id | `u64` |
    /// | delegate public key | 32 raw bytes |
    /// | issued at | `u64` Unix seconds |
    /// | expires at | `u64` Unix seconds, `0` when absent |
    ///
    /// The contract address is not part of the signed bytes.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            4 + self.broker_id.len() + 4 + self.account_id.len() + 8 + KEY_LENGTH + 8 + 8,
        );
        put_identifier(&mut bytes, &self.broker_id);
        put_identifier(&mut bytes, &self.account_id);
        bytes.extend_from_slice(&self.chain.chain_id.to_be_bytes());
        bytes.extend_from_slice(self.delegate_public_key.as_bytes());
        bytes.extend_from_slice(&self.issued_at.to_be_bytes());
        bytes.extend_from_slice(&self.expires_at.unwrap_or(0).to_be_bytes());
        bytes
    }

    /// Parse canonical bytes back into a statement.
    ///
    /// The returned statement's contract address is empty, since it is not
    /// part of the encoding.
    ///
    /// # Errors
    ///
    /// Fails on truncated input, trailing bytes, identifiers that are not
    /// UTF-8 or out of range, or a delegate key that is not a valid point.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, StatementError> {
        let mut reader = Reader(bytes);
        let broker_id = reader.identifier("broker id")?;
        let account_id = reader.identifier("account id")?;
        let chain_id = reader.u64("chain id")?;
        let key: [u8; KEY_LENGTH] = reader.array("delegate public key")?;
        let issued_at = reader.u64("issued at")?;
        let expires_at = reader.u64("expires at")?;
        if !reader.0.is_empty() {
            return Err(StatementError::TrailingBytes(reader.0.len()));
        }

        StatementFields {
            broker_id,
            account_id,
            chain: ChainContext::new(chain_id, String::new()),
            delegate_public_key: DelegatePublicKey::from_bytes(&key)?,
            issued_at,
            expires_at: (expires_at != 0).then_some(expires_at),
        }
        .try_into()
    }
}

fn put_identifier(bytes: &mut Vec<u8>, value: &str) {
    // Identifiers are bounded by MAX_IDENTIFIER_LENGTH on construction.
    let length = u32::try_from(value.len()).unwrap_or(u32::MAX);
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(value.as_bytes());
}

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn take(&mut self, length: usize, field: &'static str) -> Result<&'a [u8], StatementError> {
        if self.0.len() < length {
            return Err(StatementError::Truncated(field));
        }
        let (head, tail) = self.0.split_at(length);
        self.0 = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], StatementError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, StatementError> {
        Ok(u64::from_be_bytes(self.array(field)?))
    }

    fn identifier(&mut self, field: &'static str) -> Result<String, StatementError> {
        let length = u32::from_be_bytes(self.array(field)?) as usize;
        if length > MAX_IDENTIFIER_LENGTH {
            return Err(StatementError::InvalidInput(format!(
                "{field} is {length} bytes, at most {MAX_IDENTIFIER_LENGTH} are allowed"
            )));
        }
        let raw = self.take(length, field)?;
        String::from_utf8(raw.to_vec()).map_err(|_| StatementError::InvalidUtf8(field))
    }
}

/// Unvalidated statement fields, as found on the wire.
#[derive(Deserialize)]
struct StatementFields {
    broker_id: String,
    account_id: String,
    chain: ChainContext,
    delegate_public_key: DelegatePublicKey,
    issued_at: u64,
    #[serde(default)]
    expires_at: Option<u64>,
}

impl TryFrom<StatementFields> for DelegationStatement {
    type Error = StatementError;

    fn try_from(fields: StatementFields) -> Result<Self, Self::Error> {
        check_identifier("broker id", &fields.broker_id)?;
        check_identifier("account id", &fields.account_id)?;

        Ok(Self {
            broker_id: fields.broker_id,
            account_id: fields.account_id,
            chain: fields.chain,
            delegate_public_key: fields.delegate_public_key,
            issued_at: fields.issued_at,
            // Zero is the canonical encoding of "no expiry".
            expires_at: fields.expires_at.filter(|expires_at| *expires_at != 0),
        })
    }
}

fn check_identifier(field: &str, value: &str) -> Result<(), StatementError> {
    if value.is_empty() {
        return Err(StatementError::InvalidInput(format!("{field} is empty")));
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StatementError::InvalidInput(format!(
            "{field} is {} bytes, at most {MAX_IDENTIFIER_LENGTH} are allowed",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylink_credentials::DelegateKeyPair;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn delegate_key() -> DelegatePublicKey {
        DelegateKeyPair::from_secret_bytes(&[2; 32]).public_key()
    }

    fn arbitrum() -> ChainContext {
        ChainContext::new(42161, "0x6F7a338F2aA472838dEFD3283eB360d4Dff5D203")
    }

    fn statement(ttl: Option<Duration>) -> DelegationStatement {
        DelegationStatement::build("orderly", "acct-1", arbitrum(), delegate_key(), 1000, ttl)
            .unwrap()
    }

    #[test]
    fn it_treats_zero_and_absent_ttl_as_no_expiry() {
        assert_eq!(statement(None).expires_at(), None);
        assert_eq!(statement(Some(Duration::ZERO)).expires_at(), None);
        assert_eq!(
            statement(Some(Duration::from_secs(60))).expires_at(),
            Some(1060)
        );
    }

    #[test]
    fn it_rejects_empty_identifiers() {
        let empty_broker =
            DelegationStatement::build("", "acct-1", arbitrum(), delegate_key(), 1000, None);
        assert!(matches!(empty_broker, Err(StatementError::InvalidInput(_))));

        let empty_account =
            DelegationStatement::build("orderly", "", arbitrum(), delegate_key(), 1000, None);
        assert!(matches!(empty_account, Err(StatementError::InvalidInput(_))));
    }

    #[test]
    fn it_rejects_oversized_identifiers() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let result = DelegationStatement::build(long, "acct-1", arbitrum(), delegate_key(), 0, None);
        assert!(matches!(result, Err(StatementError::InvalidInput(_))));
    }

    #[test]
    fn it_rejects_expiry_overflow() {
        let result = DelegationStatement::build(
            "orderly",
            "acct-1",
            arbitrum(),
            delegate_key(),
            u64::MAX,
            Some(Duration::from_secs(1)),
        );
        assert!(matches!(result, Err(StatementError::InvalidInput(_))));
    }

    #[test]
    fn it_lays_out_canonical_bytes() {
        let bytes = statement(None).canonical_bytes();

        let mut expected = Vec::new();
        expected.extend_from_slice(&[0, 0, 0, 7]);
        expected.extend_from_slice(b"orderly");
        expected.extend_from_slice(&[0, 0, 0, 6]);
        expected.extend_from_slice(b"acct-1");
        expected.extend_from_slice(&42161u64.to_be_bytes());
        expected.extend_from_slice(delegate_key().as_bytes());
        expected.extend_from_slice(&1000u64.to_be_bytes());
        expected.extend_from_slice(&[0; 8]);

        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), 4 + 7 + 4 + 6 + 8 + 32 + 8 + 8);
    }

    #[test]
    fn it_encodes_expiry_big_endian() {
        let bytes = statement(Some(Duration::from_secs(0x0102))).canonical_bytes();
        let tail = &bytes[bytes.len() - 8..];
        assert_eq!(tail, &(1000u64 + 0x0102).to_be_bytes());
    }

    #[test]
    fn it_keeps_shifted_identifiers_apart() {
        let a = DelegationStatement::build("ab", "c", arbitrum(), delegate_key(), 1, None).unwrap();
        let b = DelegationStatement::build("a", "bc", arbitrum(), delegate_key(), 1, None).unwrap();
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn it_ignores_the_contract_address() {
        let mut other_chain = arbitrum();
        other_chain.contract_address = "0x0000000000000000000000000000000000000000".into();
        let other =
            DelegationStatement::build("orderly", "acct-1", other_chain, delegate_key(), 1000, None)
                .unwrap();
        assert_eq!(other.canonical_bytes(), statement(None).canonical_bytes());
    }

    #[test]
    fn it_parses_its_own_canonical_bytes() {
        let original = statement(Some(Duration::from_secs(3600)));
        let parsed = DelegationStatement::from_canonical_bytes(&original.canonical_bytes()).unwrap();
        assert_eq!(parsed.broker_id(), "orderly");
        assert_eq!(parsed.account_id(), "acct-1");
        assert_eq!(parsed.chain().chain_id, 42161);
        assert_eq!(parsed.chain().contract_address, "");
        assert_eq!(parsed.delegate_public_key(), &delegate_key());
        assert_eq!(parsed.issued_at(), 1000);
        assert_eq!(parsed.expires_at(), Some(4600));
        assert_eq!(parsed.canonical_bytes(), original.canonical_bytes());
    }

    #[test]
    fn it_refuses_truncated_and_padded_bytes() {
        let bytes = statement(None).canonical_bytes();

        for cut in [0, 3, 11, 20, bytes.len() - 1] {
            assert!(matches!(
                DelegationStatement::from_canonical_bytes(&bytes[..cut]),
                Err(StatementError::Truncated(_))
            ));
        }

        let mut padded = bytes.clone();
        padded.push(0);
        assert_eq!(
            DelegationStatement::from_canonical_bytes(&padded),
            Err(StatementError::TrailingBytes(1))
        );
    }

    #[test]
    fn it_refuses_identifiers_that_are_not_utf8() {
        let mut bytes = statement(None).canonical_bytes();
        // First byte of "orderly"
        bytes[4] = 0xff;
        assert_eq!(
            DelegationStatement::from_canonical_bytes(&bytes),
            Err(StatementError::InvalidUtf8("broker id"))
        );
    }

    #[test]
    fn it_deserializes_through_validation() {
        let json = serde_json::to_value(statement(None)).unwrap();
        let mut tampered = json.clone();
        tampered["broker_id"] = serde_json::Value::String(String::new());

        assert_eq!(
            serde_json::from_value::<DelegationStatement>(json).unwrap(),
            statement(None)
        );
        assert!(serde_json::from_value::<DelegationStatement>(tampered).is_err());
    }

    #[test]
    fn it_reads_zero_expiry_as_none() {
        let mut json = serde_json::to_value(statement(None)).unwrap();
        json["expires_at"] = serde_json::Value::from(0u64);
        let parsed: DelegationStatement = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.expires_at(), None);
    }

    #[test]
    fn it_is_live_through_the_expiry_second() {
        let statement = statement(Some(Duration::from_secs(10)));
        assert!(statement.is_live_at(1010));
        assert!(!statement.is_live_at(1011));
    }

    fn arbitrary_statement() -> impl Strategy<Value = DelegationStatement> {
        (
            "[a-z]{1,4}",
            "[a-z0-9-]{1,4}",
            0u64..4,
            0u8..3,
            0u64..3,
            prop::option::of(1u64..3),
        )
            .prop_map(|(broker_id, account_id, chain_id, seed, issued_at, ttl)| {
                DelegationStatement::build(
                    broker_id,
                    account_id,
                    ChainContext::new(chain_id, "0x"),
                    DelegateKeyPair::from_secret_bytes(&[seed; 32]).public_key(),
                    issued_at,
                    ttl.map(Duration::from_secs),
                )
                .unwrap()
            })
    }

    proptest! {
        #[test]
        fn canonical_bytes_distinguish_every_field(
            a in arbitrary_statement(),
            b in arbitrary_statement(),
        ) {
            prop_assert_eq!(a.canonical_bytes() == b.canonical_bytes(), a == b);
        }

        #[test]
        fn canonical_bytes_are_stable(statement in arbitrary_statement()) {
            prop_assert_eq!(statement.canonical_bytes(), statement.clone().canonical_bytes());
        }
    }
}
