//! In-memory registry implementation for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Registry, RegistryError, RegistryResult, SpeakerRecord};

/// An in-memory registry backed by a HashMap.
#[derive(Clone)]
pub struct MemoryRegistry {
    data: Arc<Mutex<HashMap<String, SpeakerRecord>>>,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MemoryRegistry {
    fn put(&self, record: &SpeakerRecord) -> RegistryResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        data.insert(record.identity.clone(), record.clone());
        Ok(())
    }

    fn get(&self, identity: &str) -> RegistryResult<SpeakerRecord> {
        let data = self
            .data
            .lock()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        data.get(identity).cloned().ok_or(RegistryError::NotFound)
    }

    fn list(&self) -> RegistryResult<Vec<SpeakerRecord>> {
        let data = self
            .data
            .lock()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let mut records: Vec<SpeakerRecord> = data.values().cloned().collect();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(records)
    }

    fn delete(&self, identity: &str) -> RegistryResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        match data.remove(identity) {
            Some(_) => Ok(()),
            None => Err(RegistryError::NotFound),
        }
    }
}
