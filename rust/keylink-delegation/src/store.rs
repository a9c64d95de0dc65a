//! Holding the outstanding delegation for each slot.

use crate::{DelegationRecord, Slot, StoreError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, io, path::Path};
use tracing::{debug, info};

/// Version of the record file layout written by [`RecordBook::save`].
pub const RECORD_FILE_VERSION: u32 = 1;

/// The outstanding delegation records, one per [`Slot`].
///
/// Inserting a record for an occupied slot supersedes the record held there,
/// so at most one delegate key is outstanding per slot. Records hold only
/// public material, which is all [`save`](Self::save) ever writes.
#[derive(Debug, Default)]
pub struct RecordBook {
    records: RwLock<HashMap<Slot, DelegationRecord>>,
}

impl RecordBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `record` for its slot and return the record it supersedes.
    ///
    /// Records issued at the same second replace each other.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Stale`] if the slot holds a record issued later
    /// than `record`; the book is left unchanged.
    pub fn insert(&self, record: DelegationRecord) -> Result<Option<DelegationRecord>, StoreError> {
        let slot = record.slot();
        let mut records = self.records.write();

        if let Some(held) = records.get(&slot) {
            let held = held.statement().issued_at();
            let offered = record.statement().issued_at();
            if held > offered {
                return Err(StoreError::Stale {
                    slot,
                    held,
                    offered,
                });
            }
        }

        let superseded = records.insert(slot, record);
        if let Some(previous) = &superseded {
            debug!(
                slot = %previous.slot(),
                delegate = %previous.delegate_public_key(),
                "superseded delegation"
            );
        }
        Ok(superseded)
    }

    /// The record held for `slot`.
    pub fn get(&self, slot: &Slot) -> Option<DelegationRecord> {
        self.records.read().get(slot).cloned()
    }

    /// Stop holding the record for `slot`.
    pub fn remove(&self, slot: &Slot) -> Option<DelegationRecord> {
        self.records.write().remove(slot)
    }

    /// Every held record, ordered by slot.
    pub fn records(&self) -> Vec<DelegationRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by_key(DelegationRecord::slot);
        records
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Write every record to `path` as JSON.
    ///
    /// The file is written next to `path` first and renamed into place, so a
    /// reader never observes a partial file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let records = self.records();
        let file = RecordFile {
            version: RECORD_FILE_VERSION,
            records,
        };
        let json = serde_json::to_vec_pretty(&file)?;

        let staging = path.with_extension("tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;

        info!(path = %path.display(), records = file.records.len(), "saved delegation records");
        Ok(())
    }

    /// Read a book written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, was written by
    /// another format version, or holds records that fail validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        let header: RecordFileHeader = serde_json::from_slice(&bytes)?;
        if header.version != RECORD_FILE_VERSION {
            return Err(StoreError::UnsupportedVersion(header.version));
        }
        let file: RecordFile = serde_json::from_slice(&bytes)?;

        let book = Self::new();
        for record in file.records {
            book.insert(record)?;
        }

        debug!(path = %path.display(), records = book.len(), "loaded delegation records");
        Ok(book)
    }

    /// Like [`load`](Self::load), but a missing file yields an empty book.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        match Self::load(path) {
            Err(StoreError::Io(error)) if error.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            result => result,
        }
    }
}

#[derive(Deserialize)]
struct RecordFileHeader {
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct RecordFile {
    version: u32,
    records: Vec<DelegationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChainContext, DelegationStatement};
    use keylink_credentials::{DelegateKeyPair, PrimarySigner, SolanaSigner};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn record(account_id: &str, seed: u8, issued_at: u64) -> DelegationRecord {
        let primary: PrimarySigner = SolanaSigner::from_secret_bytes(&[4; 32]).into();
        let statement = DelegationStatement::build(
            "orderly",
            account_id,
            ChainContext::new(42161, "0x6F7a338F2aA472838dEFD3283eB360d4Dff5D203"),
            DelegateKeyPair::from_secret_bytes(&[seed; 32]).public_key(),
            issued_at,
            None,
        )
        .unwrap();
        let signature = primary.sign(&statement.canonical_bytes()).unwrap();
        DelegationRecord::new(statement, signature, primary.address())
    }

    #[test]
    fn it_supersedes_the_record_in_a_slot() -> TestResult {
        let book = RecordBook::new();
        let first = record("acct-1", 1, 1000);
        let second = record("acct-1", 2, 2000);

        assert_eq!(book.insert(first.clone())?, None);
        assert_eq!(book.insert(second.clone())?, Some(first));
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(&second.slot()), Some(second));
        Ok(())
    }

    #[test]
    fn it_refuses_an_older_record() -> TestResult {
        let book = RecordBook::new();
        let newer = record("acct-1", 2, 2000);
        book.insert(newer.clone())?;

        let error = book.insert(record("acct-1", 1, 1000)).unwrap_err();
        assert!(matches!(
            error,
            StoreError::Stale {
                held: 2000,
                offered: 1000,
                ..
            }
        ));
        assert_eq!(book.get(&newer.slot()), Some(newer));
        Ok(())
    }

    #[test]
    fn it_keeps_slots_apart() -> TestResult {
        let book = RecordBook::new();
        book.insert(record("acct-2", 1, 1000))?;
        book.insert(record("acct-1", 2, 1000))?;

        let accounts: Vec<_> = book
            .records()
            .iter()
            .map(|record| record.statement().account_id().to_owned())
            .collect();
        assert_eq!(accounts, vec!["acct-1", "acct-2"]);
        Ok(())
    }

    #[test]
    fn it_removes_a_slot() -> TestResult {
        let book = RecordBook::new();
        let held = record("acct-1", 1, 1000);
        book.insert(held.clone())?;

        assert_eq!(book.remove(&held.slot()), Some(held.clone()));
        assert_eq!(book.remove(&held.slot()), None);
        assert!(book.is_empty());
        Ok(())
    }

    #[test]
    fn it_saves_and_loads_records() -> TestResult {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("records.json");

        let book = RecordBook::new();
        book.insert(record("acct-1", 1, 1000))?;
        book.insert(record("acct-2", 2, 1500))?;
        book.save(&path)?;

        let loaded = RecordBook::load(&path)?;
        assert_eq!(loaded.records(), book.records());
        assert!(!directory.path().join("records.tmp").exists());
        Ok(())
    }

    #[test]
    fn it_never_writes_private_material() -> TestResult {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("records.json");

        let book = RecordBook::new();
        book.insert(record("acct-1", 1, 1000))?;
        book.save(&path)?;

        let text = fs::read_to_string(&path)?;
        let seed_hex = "01".repeat(32);
        assert!(!text.contains(&seed_hex));
        assert!(text.contains("ed25519:"));
        Ok(())
    }

    #[test]
    fn it_refuses_unknown_versions() -> TestResult {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("records.json");
        fs::write(&path, r#"{"version": 7, "records": []}"#)?;

        assert!(matches!(
            RecordBook::load(&path),
            Err(StoreError::UnsupportedVersion(7))
        ));
        Ok(())
    }

    #[test]
    fn it_opens_a_missing_file_as_empty() -> TestResult {
        let directory = tempfile::tempdir()?;
        let book = RecordBook::open(directory.path().join("absent.json"))?;
        assert!(book.is_empty());
        assert!(RecordBook::load(directory.path().join("absent.json")).is_err());
        Ok(())
    }

    #[test]
    fn it_does_not_load_registration_for_forged_records() -> TestResult {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("records.json");

        let mut forged = serde_json::to_value(record("acct-1", 1, 1000))?;
        forged["primary_signature"] = format!("0x{}", "00".repeat(64)).into();
        forged["user_id"] = "u-1".into();
        forged["valid_signer"] = true.into();
        let file = serde_json::json!({ "version": RECORD_FILE_VERSION, "records": [forged] });
        fs::write(&path, serde_json::to_vec(&file)?)?;

        let book = RecordBook::load(&path)?;
        let loaded = &book.records()[0];
        assert_eq!(
            crate::verify(loaded, 1000),
            crate::Verdict::Rejected(crate::Rejection::BadSignature)
        );
        assert!(!loaded.valid_signer());
        assert_eq!(loaded.user_id(), None);
        Ok(())
    }
}
