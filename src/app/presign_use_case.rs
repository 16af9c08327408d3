//! Presigned client-side uploads.
//!
//! Issues time-boxed write URLs without creating any object or touching
//! any record; the caller uploads directly to the store and then merges
//! the returned keys through the merge use case.

use crate::app::ports::ObjectStore;
use crate::config::UploadConfig;
use crate::constants::DEFAULT_CONTENT_TYPE;
use crate::domain::{FileSpec, PresignBatch, PresignedUpload};
use crate::error::{AssetError, Result};
use crate::keys;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct PresignUseCase {
    objects: Arc<dyn ObjectStore>,
    uploads: UploadConfig,
}

impl PresignUseCase {
    pub fn new(objects: Arc<dyn ObjectStore>, uploads: UploadConfig) -> Self {
        Self { objects, uploads }
    }

    /// Issues one signed upload URL per file. With an identifier the
    /// keys land in the record's canonical folder (filename preserved,
    /// so re-signing the same name targets the same object); without
    /// one they land in the flat namespace under a unique millisecond
    /// prefix.
    pub async fn issue(
        &self,
        identifier: Option<&str>,
        files: &[FileSpec],
    ) -> Result<PresignBatch> {
        if files.is_empty() {
            return Err(AssetError::Validation("no files requested".to_string()));
        }

        let ttl = Duration::from_secs(self.uploads.presign_ttl_secs);
        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            let key = match identifier {
                Some(id) => keys::record_key(id, &file.file_name),
                None => keys::flat_key(&file.file_name),
            };
            let content_type = file.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
            let upload_url = self.objects.sign_put(&key, content_type, ttl).await?;
            uploads.push(PresignedUpload {
                file_name: file.file_name.clone(),
                key,
                upload_url,
            });
        }

        info!(
            count = uploads.len(),
            identifier = identifier.unwrap_or("-"),
            ttl_secs = self.uploads.presign_ttl_secs,
            "presigned uploads issued"
        );
        Ok(PresignBatch {
            identifier: identifier.map(|s| s.to_string()),
            uploads,
            expires_in_secs: self.uploads.presign_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::MemoryObjectStore;

    fn use_case(objects: Arc<MemoryObjectStore>) -> PresignUseCase {
        PresignUseCase::new(objects, UploadConfig::default())
    }

    fn file(name: &str) -> FileSpec {
        FileSpec {
            file_name: name.to_string(),
            content_type: None,
        }
    }

    #[tokio::test]
    async fn scoped_presigns_use_canonical_folder() {
        let objects = Arc::new(MemoryObjectStore::new("lot-media"));
        let batch = use_case(objects.clone())
            .issue(Some("AB#1 2"), &[file("front.jpg"), file("rear.jpg")])
            .await
            .unwrap();

        assert_eq!(batch.uploads.len(), 2);
        assert_eq!(batch.uploads[0].key, "records/ABHASH1-2/front.jpg");
        assert_eq!(batch.uploads[1].key, "records/ABHASH1-2/rear.jpg");
        assert_eq!(batch.expires_in_secs, 900);
        // Signing creates nothing.
        assert!(objects.object_keys().is_empty());
    }

    #[tokio::test]
    async fn flat_presigns_carry_unique_prefix() {
        let objects = Arc::new(MemoryObjectStore::new("lot-media"));
        let batch = use_case(objects)
            .issue(None, &[file("front.jpg")])
            .await
            .unwrap();

        let key = &batch.uploads[0].key;
        assert!(key.starts_with("uploads/"), "{key}");
        assert!(key.ends_with("_front.jpg"), "{key}");
        assert_ne!(key, "uploads/front.jpg");
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let objects = Arc::new(MemoryObjectStore::new("lot-media"));
        let err = use_case(objects).issue(None, &[]).await.unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
    }
}
