//! Redb-based persistent registry implementation.
//!
//! Records are written inside redb write transactions. The commit is
//! shadow-paged: a crash mid-write leaves the previously committed
//! record visible, never a half-written one. Readers run on a snapshot
//! and may overlap writers to unrelated identities.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{Registry, RegistryError, RegistryResult, SpeakerRecord, decode_record, encode_record};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("speakers");

/// A persistent registry backed by redb.
pub struct RedbRegistry {
    db: Database,
}

impl RedbRegistry {
    /// Open or create a registry at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let db = Database::create(path).map_err(|e| RegistryError::Storage(e.to_string()))?;

        // Create the table if it doesn't exist
        let tx = db
            .begin_write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        {
            let _ = tx
                .open_table(TABLE)
                .map_err(|e| RegistryError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| RegistryError::Storage(e.to_string()))?;

        Ok(Self { db })
    }
}

impl Registry for RedbRegistry {
    fn put(&self, record: &SpeakerRecord) -> RegistryResult<()> {
        let value = encode_record(record)?;
        let tx = self
            .db
            .begin_write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| RegistryError::Storage(e.to_string()))?;
            table
                .insert(record.identity.as_str(), value.as_slice())
                .map_err(|e| RegistryError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get(&self, identity: &str) -> RegistryResult<SpeakerRecord> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        match table
            .get(identity)
            .map_err(|e| RegistryError::Storage(e.to_string()))?
        {
            Some(value) => decode_record(value.value()),
            None => Err(RegistryError::NotFound),
        }
    }

    fn list(&self) -> RegistryResult<Vec<SpeakerRecord>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        let mut records = Vec::new();
        for item in table.iter().map_err(|e| RegistryError::Storage(e.to_string()))? {
            let (_, value) = item.map_err(|e| RegistryError::Storage(e.to_string()))?;
            records.push(decode_record(value.value())?);
        }

        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(records)
    }

    fn delete(&self, identity: &str) -> RegistryResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let removed = {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| RegistryError::Storage(e.to_string()))?;
            table
                .remove(identity)
                .map_err(|e| RegistryError::Storage(e.to_string()))?
                .is_some()
        };
        tx.commit().map_err(|e| RegistryError::Storage(e.to_string()))?;

        if removed {
            Ok(())
        } else {
            Err(RegistryError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(identity: &str, fingerprint: Vec<f32>) -> SpeakerRecord {
        SpeakerRecord {
            identity: identity.to_string(),
            enrolled_date: Utc::now(),
            clips_count: 3,
            fingerprint,
        }
    }

    #[test]
    fn test_redb_basic() {
        let dir = tempdir().unwrap();
        let reg = RedbRegistry::open(dir.path().join("test.redb")).unwrap();

        reg.put(&record("alice", vec![1.0, 0.0])).unwrap();
        assert_eq!(reg.get("alice").unwrap().fingerprint, vec![1.0, 0.0]);

        reg.delete("alice").unwrap();
        assert!(matches!(reg.get("alice"), Err(RegistryError::NotFound)));
    }

    #[test]
    fn test_redb_delete_missing() {
        let dir = tempdir().unwrap();
        let reg = RedbRegistry::open(dir.path().join("test.redb")).unwrap();
        assert!(matches!(reg.delete("nobody"), Err(RegistryError::NotFound)));
    }

    #[test]
    fn test_redb_list_sorted() {
        let dir = tempdir().unwrap();
        let reg = RedbRegistry::open(dir.path().join("test.redb")).unwrap();

        reg.put(&record("carol", vec![0.0, 1.0])).unwrap();
        reg.put(&record("alice", vec![1.0, 0.0])).unwrap();

        let ids: Vec<String> = reg
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.identity)
            .collect();
        assert_eq!(ids, vec!["alice", "carol"]);
    }

    #[test]
    fn test_redb_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let reg = RedbRegistry::open(&path).unwrap();
            reg.put(&record("alice", vec![0.5, 0.5])).unwrap();
        }

        let reg = RedbRegistry::open(&path).unwrap();
        let got = reg.get("alice").unwrap();
        assert_eq!(got.fingerprint, vec![0.5, 0.5]);
        assert_eq!(got.clips_count, 3);
    }
}
