//! End-to-end issuance and verification with in-process wallets.

use keylink_credentials::{EvmSigner, PrimarySignature, SolanaSigner};
use keylink_delegation::{
    ChainContext, DelegateKeyPair, DelegationIssuer, DelegationRecord, LocalWallet, RecordBook,
    Rejection, Verdict, authorize_operation, verify,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::Duration;
use testresult::TestResult;

const FIXED_CANONICAL_BYTES: &str = concat!(
    "000000076f726465726c79",
    "00000006616363742d31",
    "000000000000a4b1",
    "a09aa5f47a6759802ff955f8dc2d2a14a5c99d23be97f864127ff9383455a4f0",
    "00000000000003e8",
    "0000000000000000",
);

const FIXED_PRIMARY_SIGNATURE: &str = concat!(
    "0x4e007ced7563c0fd281d44156cf7a84bcff4311938e22c6527e87c6fabc97257",
    "01375c639d2c402e4a5885c271a08d61606e91f9050f9f723a5b641a6810d603",
);

fn arbitrum() -> ChainContext {
    ChainContext::new(42161, "0x6F7a338F2aA472838dEFD3283eB360d4Dff5D203")
}

fn solana_wallet() -> LocalWallet {
    LocalWallet::new(SolanaSigner::from_secret_bytes(&[0x11; 32])).on_chain(42161)
}

fn evm_wallet() -> LocalWallet {
    LocalWallet::new(EvmSigner::from_slice(&[0x11; 32]).unwrap()).on_chain(42161)
}

fn flip(signature: &PrimarySignature, index: usize) -> PrimarySignature {
    let mut bytes = signature.as_bytes().to_vec();
    bytes[index] ^= 0x01;
    PrimarySignature::from(bytes)
}

fn with_signature(record: &DelegationRecord, signature: PrimarySignature) -> DelegationRecord {
    DelegationRecord::new(
        record.statement().clone(),
        signature,
        *record.primary_address(),
    )
}

#[tokio::test]
async fn fixed_scenario_is_deterministic() -> TestResult {
    let issuer = DelegationIssuer::new().with_clock(|| 1000);
    let issued = issuer
        .issue(
            &solana_wallet(),
            &arbitrum(),
            "orderly",
            "acct-1",
            Some(DelegateKeyPair::from_secret_bytes(&[0x22; 32])),
        )
        .await?;

    let record = &issued.record;
    let canonical: String = record
        .statement()
        .canonical_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();

    assert_eq!(canonical, FIXED_CANONICAL_BYTES);
    assert_eq!(record.primary_signature().to_string(), FIXED_PRIMARY_SIGNATURE);
    assert_eq!(
        record.delegate_public_key().to_string(),
        "ed25519:Bow1CGKGDB9mNxeWdw85E2aCthQ1oZX4oFEe7fYT17ew"
    );
    assert_eq!(
        record.primary_address().to_string(),
        "F25s3DdjXdCxYBhh2z8FBusVEMT4b9bGNFVKJi3wFoF4"
    );
    assert_eq!(record.statement().expires_at(), None);
    assert_eq!(verify(record, 999_999), Verdict::Accepted);
    Ok(())
}

#[tokio::test]
async fn issued_records_verify_for_both_schemes() -> TestResult {
    for wallet in [solana_wallet(), evm_wallet()] {
        let issued = DelegationIssuer::new()
            .with_ttl(Some(Duration::from_secs(3600)))
            .with_clock(|| 1_700_000_000)
            .issue(&wallet, &arbitrum(), "orderly", "acct-1", None)
            .await?;

        assert_eq!(verify(&issued.record, 1_700_000_000), Verdict::Accepted);
        assert_eq!(verify(&issued.record, 1_700_003_600), Verdict::Accepted);
        assert_eq!(
            verify(&issued.record, 1_700_003_601),
            Verdict::Rejected(Rejection::Expired)
        );
    }
    Ok(())
}

#[tokio::test]
async fn flipping_any_signature_byte_is_rejected() -> TestResult {
    for wallet in [solana_wallet(), evm_wallet()] {
        let issued = DelegationIssuer::new()
            .with_clock(|| 1000)
            .issue(&wallet, &arbitrum(), "orderly", "acct-1", None)
            .await?;
        let signature = issued.record.primary_signature();

        for index in 0..signature.as_bytes().len() {
            let tampered = with_signature(&issued.record, flip(signature, index));
            assert_eq!(
                verify(&tampered, 1000),
                Verdict::Rejected(Rejection::BadSignature),
                "byte {index} of a {} signature",
                issued.record.primary_address()
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn operations_are_bound_to_their_delegate() -> TestResult {
    let issuer = DelegationIssuer::new().with_clock(|| 1000);
    let first = issuer
        .issue(&evm_wallet(), &arbitrum(), "orderly", "acct-1", None)
        .await?;
    let second = issuer
        .issue(&evm_wallet(), &arbitrum(), "orderly", "acct-1", None)
        .await?;

    assert_ne!(first.key.public_key(), second.key.public_key());

    let operation = b"order:place:ETH-PERP:buy:1";
    let by_first = first.key.sign(operation);
    let by_second = second.key.sign(operation);

    assert_eq!(
        authorize_operation(&first.record, operation, &by_first, 1000),
        Verdict::Accepted
    );
    assert_eq!(
        authorize_operation(&second.record, operation, &by_second, 1000),
        Verdict::Accepted
    );
    assert_eq!(
        authorize_operation(&first.record, operation, &by_second, 1000),
        Verdict::Rejected(Rejection::BadDelegateSignature)
    );
    assert_eq!(
        authorize_operation(&second.record, operation, &by_first, 1000),
        Verdict::Rejected(Rejection::BadDelegateSignature)
    );
    Ok(())
}

#[tokio::test]
async fn reissuing_keeps_only_the_latest_record() -> TestResult {
    let book = RecordBook::new();
    let wallet = solana_wallet();

    let first = DelegationIssuer::new()
        .with_clock(|| 1000)
        .issue(&wallet, &arbitrum(), "orderly", "acct-1", None)
        .await?;
    let second = DelegationIssuer::new()
        .with_clock(|| 2000)
        .issue(&wallet, &arbitrum(), "orderly", "acct-1", None)
        .await?;

    book.insert(first.record.clone())?;
    let superseded = book.insert(second.record.clone())?;

    assert_eq!(superseded, Some(first.record.clone()));
    assert_eq!(book.len(), 1);
    assert_eq!(book.get(&second.record.slot()), Some(second.record.clone()));

    // The superseded record still verifies on its own; holders drop it.
    assert_eq!(verify(&first.record, 2000), Verdict::Accepted);
    Ok(())
}

proptest! {
    #[test]
    fn statements_reject_signatures_for_other_statements(
        account_id in "[a-z0-9-]{1,24}",
        issued_at in 0u64..4_000_000_000,
        ttl in 1u64..1_000_000,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let wallet = solana_wallet();
        let issue = |issued_at: u64| {
            let account_id = account_id.clone();
            let wallet = &wallet;
            runtime.block_on(async move {
                DelegationIssuer::new()
                    .with_ttl(Some(Duration::from_secs(ttl)))
                    .with_clock(move || issued_at)
                    .issue(
                        wallet,
                        &arbitrum(),
                        "orderly",
                        &account_id,
                        Some(DelegateKeyPair::from_secret_bytes(&[0x22; 32])),
                    )
                    .await
                    .unwrap()
            })
        };

        let original = issue(issued_at);
        let shifted = issue(issued_at + 1);

        // Swap the signatures: each must fail against the other statement.
        let crossed = with_signature(&original.record, shifted.record.primary_signature().clone());
        prop_assert_eq!(verify(&original.record, issued_at), Verdict::Accepted);
        prop_assert_eq!(
            verify(&crossed, issued_at),
            Verdict::Rejected(Rejection::BadSignature)
        );
    }
}
