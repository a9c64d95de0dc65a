//! Command execution.

use std::io::Write;

use anyhow::{Context, bail};
use keylink_delegation::{
    AccountView, DelegateKeyPair, DelegateSignature, DelegationIssuer, LocalWallet, RecordBook,
    Verdict, authorize_operation, time::unix_now, verify,
};
use tracing::info;

use crate::{cli::Command, config::Settings, keyfile};

/// Run `command`, writing its output to `out`.
pub async fn run<W: Write>(command: Command, settings: &Settings, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Keygen { out: path } => {
            let key = DelegateKeyPair::generate()?;
            keyfile::write_delegate_key(&path, &key)?;
            info!(path = %path.display(), delegate = %key.public_key(), "generated delegate key");
            writeln!(out, "{}", key.encoded_public_key())?;
        }

        Command::Pubkey { key } => {
            writeln!(out, "{}", keyfile::read_delegate_key(&key)?.encoded_public_key())?;
        }

        Command::Issue {
            primary_key,
            scheme,
            key,
            out: key_out,
        } => {
            let chain = settings.chain()?;
            let wallet = LocalWallet::new(keyfile::read_primary_key(&primary_key, scheme)?)
                .on_chain(chain.chain_id);
            let supplied = key.as_deref().map(keyfile::read_delegate_key).transpose()?;
            let book = RecordBook::open(&settings.record_store)?;

            let issuer = DelegationIssuer::new().with_ttl(settings.ttl());
            let attempt = issuer.issue(
                &wallet,
                &chain,
                &settings.broker_id,
                &settings.account_id,
                supplied,
            );
            let issued = tokio::time::timeout(settings.signing_timeout(), attempt)
                .await
                .with_context(|| {
                    format!(
                        "wallet did not sign within {}s",
                        settings.signing_timeout_secs
                    )
                })??;

            let superseded = book.insert(issued.record.clone())?;
            if key.is_none() {
                let path = key_out.context("--out is required when generating a key")?;
                keyfile::write_delegate_key(&path, &issued.key)?;
            }
            book.save(&settings.record_store)?;

            if let Some(previous) = superseded {
                writeln!(out, "Superseded:   {}", previous.delegate_public_key())?;
            }
            writeln!(
                out,
                "{}",
                AccountView::new(
                    issued.record.primary_address(),
                    Some(settings.account_id.as_str()),
                    Some(&issued.record),
                    unix_now()
                )
            )?;
        }

        Command::Verify { now } => {
            let book = RecordBook::open(&settings.record_store)?;
            let slot = settings.slot()?;
            let record = book
                .get(&slot)
                .with_context(|| format!("no record held for {slot}"))?;
            report(out, verify(&record, now.unwrap_or_else(unix_now)))?;
        }

        Command::Sign { key, operation } => {
            let signature = keyfile::read_delegate_key(&key)?.sign(operation.as_bytes());
            writeln!(out, "{}", hex::encode(signature.to_bytes()))?;
        }

        Command::Authorize {
            operation,
            signature,
            now,
        } => {
            let mut bytes = [0u8; 64];
            hex::decode_to_slice(signature.trim(), &mut bytes)
                .context("signature must be 128 hex digits")?;
            let signature = DelegateSignature::from_bytes(&bytes);

            let book = RecordBook::open(&settings.record_store)?;
            let slot = settings.slot()?;
            let record = book
                .get(&slot)
                .with_context(|| format!("no record held for {slot}"))?;
            let verdict = authorize_operation(
                &record,
                operation.as_bytes(),
                &signature,
                now.unwrap_or_else(unix_now),
            );
            report(out, verdict)?;
        }

        Command::Show => {
            let book = RecordBook::open(&settings.record_store)?;
            let now = unix_now();
            for (index, record) in book.records().iter().enumerate() {
                if index > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "Slot:         {}", record.slot())?;
                writeln!(
                    out,
                    "{}",
                    AccountView::new(record.primary_address(), None, Some(record), now)
                )?;
            }
        }

        Command::Revoke => {
            let book = RecordBook::open(&settings.record_store)?;
            let slot = settings.slot()?;
            let Some(removed) = book.remove(&slot) else {
                bail!("no record held for {slot}");
            };
            book.save(&settings.record_store)?;
            writeln!(out, "Revoked:      {}", removed.delegate_public_key())?;
        }
    }

    Ok(())
}

fn report<W: Write>(out: &mut W, verdict: Verdict) -> anyhow::Result<()> {
    match verdict {
        Verdict::Accepted => {
            writeln!(out, "accepted")?;
            Ok(())
        }
        Verdict::Rejected(rejection) => {
            writeln!(out, "rejected: {rejection}")?;
            bail!("{rejection}")
        }
    }
}
