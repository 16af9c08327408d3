//! In-memory record store for development/testing.

use crate::app::ports::{RecordStore, RecordTransaction};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates or resets a record. Record creation itself is outside
    /// the lifecycle operations, so the dev store exposes it directly.
    pub fn insert_record(&self, identifier: &str, references: Vec<String>) {
        self.records
            .lock()
            .unwrap()
            .insert(identifier.to_string(), references);
        debug!(identifier = %identifier, "record inserted");
    }

    pub fn references(&self, identifier: &str) -> Option<Vec<String>> {
        self.records.lock().unwrap().get(identifier).cloned()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Stages writes until commit; readers of the shared map never observe
/// a partially applied transaction.
pub struct MemoryRecordTransaction {
    records: Arc<Mutex<HashMap<String, Vec<String>>>>,
    staged: Vec<(String, Vec<String>)>,
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>> {
        Ok(Box::new(MemoryRecordTransaction {
            records: self.records.clone(),
            staged: Vec::new(),
        }))
    }
}

#[async_trait]
impl RecordTransaction for MemoryRecordTransaction {
    async fn fetch_references(&mut self, identifier: &str) -> Result<Option<Vec<String>>> {
        // Read-your-writes within the transaction.
        if let Some((_, references)) = self
            .staged
            .iter()
            .rev()
            .find(|(staged_id, _)| staged_id == identifier)
        {
            return Ok(Some(references.clone()));
        }
        Ok(self.records.lock().unwrap().get(identifier).cloned())
    }

    async fn store_references(&mut self, identifier: &str, references: &[String]) -> Result<()> {
        self.staged
            .push((identifier.to_string(), references.to_vec()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        for (identifier, references) in self.staged {
            records.insert(identifier, references);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_writes_apply_on_commit_only() {
        let store = MemoryRecordStore::new();
        store.insert_record("R001", vec!["a".to_string()]);

        let mut tx = store.begin().await.unwrap();
        tx.store_references("R001", &["b".to_string()]).await.unwrap();
        assert_eq!(store.references("R001").unwrap(), vec!["a"]);
        assert_eq!(
            tx.fetch_references("R001").await.unwrap().unwrap(),
            vec!["b"]
        );

        tx.commit().await.unwrap();
        assert_eq!(store.references("R001").unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let store = MemoryRecordStore::new();
        store.insert_record("R001", vec!["a".to_string()]);

        let mut tx = store.begin().await.unwrap();
        tx.store_references("R001", &[]).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.references("R001").unwrap(), vec!["a"]);
    }
}
