//! Server-side upload path.
//!
//! Accepts binary payloads, uploads them with public-read access and
//! ties the resulting references to records. Which record owns a file
//! is encoded in its name (`WDB903661_3.jpg` belongs to `WDB903661`)
//! unless the caller names the record explicitly.

use crate::app::ports::ObjectStore;
use crate::app::transaction::AssetTransaction;
use crate::config::UploadConfig;
use crate::constants::IDENTIFIER_DELIMITER;
use crate::domain::{AddedAssets, IncomingFile, UploadOutcome};
use crate::error::{AssetError, Result};
use crate::keys;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct UploadUseCase {
    objects: Arc<dyn ObjectStore>,
    transaction: Arc<AssetTransaction>,
    uploads: UploadConfig,
}

struct UploadedGroup {
    references: Vec<String>,
    keys: Vec<String>,
}

impl UploadUseCase {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        transaction: Arc<AssetTransaction>,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            objects,
            transaction,
            uploads,
        }
    }

    /// Uploads a batch and links each group of files to the record its
    /// filenames name. Groups without a matching record are reported,
    /// not failed; their objects stay in the store unreferenced.
    pub async fn upload_batch(&self, files: &[IncomingFile]) -> Result<UploadOutcome> {
        self.validate_batch(files)?;

        let mut groups: BTreeMap<String, UploadedGroup> = BTreeMap::new();
        for file in files {
            let sanitized = keys::strip_spaces(&file.file_name);
            let identifier = sanitized
                .split(IDENTIFIER_DELIMITER)
                .next()
                .unwrap_or(&sanitized)
                .to_string();
            let (key, url) = self.upload_one(&sanitized, file).await?;

            let group = groups.entry(identifier).or_insert_with(|| UploadedGroup {
                references: Vec::new(),
                keys: Vec::new(),
            });
            group.references.push(url);
            group.keys.push(key);
        }

        let mut outcome = UploadOutcome {
            groups: BTreeMap::new(),
            linked: Vec::new(),
            unmatched: Vec::new(),
        };
        for (identifier, group) in groups {
            match self
                .transaction
                .append_references(&identifier, group.references.clone(), &group.keys)
                .await
            {
                Ok(_) => outcome.linked.push(identifier.clone()),
                Err(AssetError::RecordNotFound(_)) => {
                    warn!(identifier = %identifier, "no record for uploaded files");
                    outcome.unmatched.push(identifier.clone());
                }
                Err(e) => return Err(e),
            }
            outcome.groups.insert(identifier, group.references);
        }

        info!(
            files = files.len(),
            linked = outcome.linked.len(),
            unmatched = outcome.unmatched.len(),
            "upload batch processed"
        );
        Ok(outcome)
    }

    /// Uploads a batch for one known record. Fails fast if the record
    /// is missing; if the record update fails after the uploads, the
    /// new objects are deleted best-effort.
    pub async fn add_to_record(
        &self,
        identifier: &str,
        files: &[IncomingFile],
    ) -> Result<AddedAssets> {
        self.validate_batch(files)?;
        self.transaction.current(identifier).await?;

        let mut new_references = Vec::with_capacity(files.len());
        let mut new_keys = Vec::with_capacity(files.len());
        for file in files {
            let sanitized = keys::strip_spaces(&file.file_name);
            match self.upload_one(&sanitized, file).await {
                Ok((key, url)) => {
                    new_keys.push(key);
                    new_references.push(url);
                }
                Err(e) => {
                    // Clean up what this call already uploaded.
                    for key in &new_keys {
                        if let Err(cleanup) = self.objects.delete(key).await {
                            warn!(key = %key, error = %cleanup, "upload cleanup failed");
                        }
                    }
                    return Err(e);
                }
            }
        }

        let all_references = self
            .transaction
            .append_references(identifier, new_references.clone(), &new_keys)
            .await?;

        Ok(AddedAssets {
            identifier: identifier.to_string(),
            new_references,
            all_references,
        })
    }

    async fn upload_one(&self, sanitized: &str, file: &IncomingFile) -> Result<(String, String)> {
        let key = keys::timestamped_name(sanitized)
            .trim_start_matches('/')
            .to_string();
        let location = self
            .objects
            .put(&key, file.bytes.clone(), &file.content_type)
            .await
            .map_err(|e| AssetError::Store {
                message: format!("failed to upload {}: {}", sanitized, e),
            })?;
        Ok((key, keys::normalize_slashes(&location)))
    }

    fn validate_batch(&self, files: &[IncomingFile]) -> Result<()> {
        if files.is_empty() {
            return Err(AssetError::Validation("no files uploaded".to_string()));
        }
        if files.len() > self.uploads.max_files {
            return Err(AssetError::Validation(format!(
                "too many files: {} (limit {})",
                files.len(),
                self.uploads.max_files
            )));
        }
        for file in files {
            if !self.uploads.allows_content_type(&file.content_type) {
                return Err(AssetError::Validation(format!(
                    "invalid file type {} for {}; allowed: {}",
                    file.content_type,
                    file.file_name,
                    self.uploads.allowed_content_types.join(", ")
                )));
            }
            if file.bytes.len() as u64 > self.uploads.max_file_bytes {
                return Err(AssetError::Validation(format!(
                    "{} exceeds the size limit: {} > {} bytes",
                    file.file_name,
                    file.bytes.len(),
                    self.uploads.max_file_bytes
                )));
            }
        }
        Ok(())
    }
}
