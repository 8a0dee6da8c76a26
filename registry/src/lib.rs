//! Registry of committed speaker fingerprints.
//!
//! Provides a trait-based registry interface with an in-memory
//! implementation for testing and a redb-based implementation for
//! persistence. Each entry maps a normalized identity key to the
//! averaged voice fingerprint plus its enrollment metadata.
//!
//! Writes replace or remove whole records; a concurrent reader sees
//! either the previous record or the new one, never a torn record.

pub mod memory;
pub mod redb;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry: not found")]
    NotFound,

    #[error("registry: storage error: {0}")]
    Storage(String),

    #[error("registry: serialization error: {0}")]
    Serialization(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// A committed speaker entry: averaged fingerprint plus enrollment metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerRecord {
    /// Normalized identity key (trimmed, lowercase).
    #[serde(rename = "identity")]
    pub identity: String,

    /// When the fingerprint was committed.
    #[serde(rename = "enrolled_date")]
    pub enrolled_date: DateTime<Utc>,

    /// Number of clips whose embeddings contributed to the fingerprint.
    #[serde(rename = "clips_count")]
    pub clips_count: usize,

    /// Averaged voice embedding.
    #[serde(rename = "fingerprint")]
    pub fingerprint: Vec<f32>,
}

/// Registry of committed speaker records.
///
/// `put` and `delete` replace or remove whole records atomically.
/// `list` returns entries sorted by identity key so match scans and
/// tests are reproducible.
pub trait Registry: Send + Sync {
    /// Store a record, overwriting any existing entry for its identity.
    fn put(&self, record: &SpeakerRecord) -> RegistryResult<()>;

    /// Fetch the record for an identity key.
    fn get(&self, identity: &str) -> RegistryResult<SpeakerRecord>;

    /// Return all records sorted by identity key.
    fn list(&self) -> RegistryResult<Vec<SpeakerRecord>>;

    /// Remove the record for an identity key.
    fn delete(&self, identity: &str) -> RegistryResult<()>;
}

impl fmt::Debug for dyn Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registry {{ ... }}")
    }
}

pub(crate) fn encode_record(record: &SpeakerRecord) -> RegistryResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| RegistryError::Serialization(e.to_string()))
}

pub(crate) fn decode_record(data: &[u8]) -> RegistryResult<SpeakerRecord> {
    serde_json::from_slice(data).map_err(|e| RegistryError::Serialization(e.to_string()))
}

// Re-export the implementations
pub use memory::MemoryRegistry;
pub use redb::RedbRegistry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let record = SpeakerRecord {
            identity: "alice".to_string(),
            enrolled_date: Utc::now(),
            clips_count: 4,
            fingerprint: vec![0.25, -0.5, 0.75],
        };

        let bytes = encode_record(&record).unwrap();
        let back = decode_record(&bytes).unwrap();
        assert_eq!(back.identity, "alice");
        assert_eq!(back.clips_count, 4);
        assert_eq!(back.fingerprint, vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_record(b"not json"),
            Err(RegistryError::Serialization(_))
        ));
    }
}
