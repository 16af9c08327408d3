//! The consistency boundary between the relational record and the
//! object store.
//!
//! Every mutation of a record's asset list goes through here: one
//! relational transaction per call, committed or rolled back on every
//! exit path. The list is the source of truth for what is active;
//! object-store state may lag it (garbage after a failed compensating
//! delete, missing objects after an external delete) and that is
//! surfaced in reports rather than hidden.

use crate::app::deletion;
use crate::app::ports::{ObjectStore, RecordStore, RecordTransaction};
use crate::domain::{RemovalReport, RemovalSummary};
use crate::error::{AssetError, Result};
use crate::keys;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct AssetTransaction {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
}

impl AssetTransaction {
    pub fn new(records: Arc<dyn RecordStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { records, objects }
    }

    /// Transactional read of a record's current references.
    pub async fn current(&self, identifier: &str) -> Result<Vec<String>> {
        let mut tx = self.records.begin().await?;
        let fetched = fetch_or_not_found(tx.as_mut(), identifier).await;
        rollback_quietly(tx).await;
        fetched
    }

    /// Appends already-uploaded references to a record, preserving the
    /// existing order. `compensate_keys` are the object keys this call
    /// created server-side; if the record cannot be updated they are
    /// deleted best-effort before the error surfaces. Pass an empty
    /// slice for client-uploaded keys.
    pub async fn append_references(
        &self,
        identifier: &str,
        new_references: Vec<String>,
        compensate_keys: &[String],
    ) -> Result<Vec<String>> {
        let mut tx = self.records.begin().await?;

        let current = match fetch_or_not_found(tx.as_mut(), identifier).await {
            Ok(current) => current,
            Err(e) => {
                rollback_quietly(tx).await;
                self.compensate(compensate_keys).await;
                return Err(e);
            }
        };

        // Historical rows contain backslash-mangled URLs; clean them
        // while we hold the row anyway.
        let mut combined: Vec<String> =
            current.iter().map(|url| keys::normalize_slashes(url)).collect();
        combined.extend(new_references);

        if let Err(e) = persist(tx, identifier, &combined).await {
            self.compensate(compensate_keys).await;
            return Err(e);
        }

        info!(identifier = %identifier, total = combined.len(), "references appended");
        Ok(combined)
    }

    /// Whole-list rewrite. `f` sees the current list and returns the
    /// replacement; used by migration to swap legacy URLs for canonical
    /// ones.
    pub async fn replace_references<F>(&self, identifier: &str, f: F) -> Result<Vec<String>>
    where
        F: FnOnce(&[String]) -> Vec<String> + Send,
    {
        let mut tx = self.records.begin().await?;

        let current = match fetch_or_not_found(tx.as_mut(), identifier).await {
            Ok(current) => current,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e);
            }
        };

        let replacement = f(&current);
        persist(tx, identifier, &replacement).await?;

        info!(identifier = %identifier, total = replacement.len(), "references replaced");
        Ok(replacement)
    }

    /// Removes the given positions from a record's list, deleting the
    /// backing objects where possible. Store failures are reported
    /// per index and never block the list update.
    pub async fn remove_indices(
        &self,
        identifier: &str,
        indices: &[usize],
    ) -> Result<RemovalReport> {
        let mut tx = self.records.begin().await?;

        let current = match fetch_or_not_found(tx.as_mut(), identifier).await {
            Ok(current) => current,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e);
            }
        };

        let plan = match deletion::plan_removal(&current, indices) {
            Ok(plan) => plan,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e);
            }
        };

        let mut deletions = Vec::with_capacity(plan.targets.len());
        for target in &plan.targets {
            deletions.push(deletion::delete_reference(self.objects.as_ref(), target).await);
        }

        let remaining = deletion::apply_removal(&current, &plan);
        persist(tx, identifier, &remaining).await?;

        let succeeded = deletions.iter().filter(|d| d.store_deleted).count();
        let summary = RemovalSummary {
            requested: indices.len(),
            processed: plan.targets.len(),
            succeeded,
            failed: plan.targets.len() - succeeded,
        };
        info!(
            identifier = %identifier,
            processed = summary.processed,
            failed = summary.failed,
            "references removed"
        );

        Ok(RemovalReport {
            identifier: identifier.to_string(),
            removed_indices: plan.indices(),
            removed_references: plan.targets.iter().map(|t| t.reference.clone()).collect(),
            remaining,
            deletions,
            summary,
        })
    }

    async fn compensate(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.objects.delete(key).await {
                error!(key = %key, error = %e, "failed to clean up uploaded object");
            }
        }
    }
}

async fn fetch_or_not_found(
    tx: &mut dyn RecordTransaction,
    identifier: &str,
) -> Result<Vec<String>> {
    tx.fetch_references(identifier)
        .await?
        .ok_or_else(|| AssetError::RecordNotFound(identifier.to_string()))
}

/// Stores the list and commits, rolling back on either failure.
async fn persist(
    mut tx: Box<dyn RecordTransaction>,
    identifier: &str,
    references: &[String],
) -> Result<()> {
    if let Err(e) = tx.store_references(identifier, references).await {
        rollback_quietly(tx).await;
        return Err(e);
    }
    tx.commit().await
}

async fn rollback_quietly(tx: Box<dyn RecordTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}
