//! Merges client-uploaded keys into a record.
//!
//! The counterpart of the presign path: after the client uploads
//! directly to the store, the keys it received come back here and are
//! turned into reference URLs on the record. No object is created or
//! deleted; the objects already exist under these keys.

use crate::app::ports::ObjectStore;
use crate::app::transaction::AssetTransaction;
use crate::domain::MergedAssets;
use crate::error::{AssetError, Result};
use crate::keys;
use std::sync::Arc;

pub struct MergeUseCase {
    objects: Arc<dyn ObjectStore>,
    transaction: Arc<AssetTransaction>,
}

impl MergeUseCase {
    pub fn new(objects: Arc<dyn ObjectStore>, transaction: Arc<AssetTransaction>) -> Self {
        Self {
            objects,
            transaction,
        }
    }

    /// Appends the reference URLs for already-uploaded keys to the
    /// record, preserving existing order. Keys arrive as the client
    /// echoed them, so slashes are normalized first.
    pub async fn merge_keys(&self, identifier: &str, upload_keys: &[String]) -> Result<MergedAssets> {
        if upload_keys.is_empty() {
            return Err(AssetError::Validation("no keys provided".to_string()));
        }

        let new_references: Vec<String> = upload_keys
            .iter()
            .map(|key| {
                let clean = keys::normalize_slashes(key);
                self.objects.public_url(clean.trim_start_matches('/'))
            })
            .collect();

        let references = self
            .transaction
            .append_references(identifier, new_references, &[])
            .await?;

        Ok(MergedAssets {
            identifier: identifier.to_string(),
            references,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::RecordStore;
    use crate::infra::memory_records::MemoryRecordStore;
    use crate::infra::memory_store::MemoryObjectStore;

    fn build(records: Arc<MemoryRecordStore>) -> (MergeUseCase, Arc<MemoryObjectStore>) {
        let objects = Arc::new(MemoryObjectStore::new("lot-media"));
        let records: Arc<dyn RecordStore> = records;
        let transaction = Arc::new(AssetTransaction::new(records, objects.clone()));
        (MergeUseCase::new(objects.clone(), transaction), objects)
    }

    #[tokio::test]
    async fn merge_is_append_only() {
        let records = Arc::new(MemoryRecordStore::new());
        records.insert_record("R001", vec!["memory://lot-media/old.jpg".to_string()]);
        let (use_case, _objects) = build(records.clone());

        let merged = use_case
            .merge_keys(
                "R001",
                &["records/R001/a.jpg".to_string(), "records\\R001\\b.jpg".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(
            merged.references,
            vec![
                "memory://lot-media/old.jpg",
                "memory://lot-media/records/R001/a.jpg",
                "memory://lot-media/records/R001/b.jpg",
            ]
        );
        assert_eq!(records.references("R001").unwrap(), merged.references);
    }

    #[tokio::test]
    async fn merge_into_unknown_record_is_not_found() {
        let records = Arc::new(MemoryRecordStore::new());
        let (use_case, _objects) = build(records);
        let err = use_case
            .merge_keys("missing", &["uploads/a.jpg".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn merge_with_no_keys_is_rejected() {
        let records = Arc::new(MemoryRecordStore::new());
        records.insert_record("R001", vec![]);
        let (use_case, _objects) = build(records);
        let err = use_case.merge_keys("R001", &[]).await.unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
    }
}
