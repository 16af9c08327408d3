//! Migration of legacy asset keys to the canonical layout.
//!
//! Legacy references point at timestamp-prefixed keys in flat
//! namespaces; the canonical layout keeps every record's files under
//! `records/<folder>/`. Planning is side-effect free and shared between
//! dry-run and apply, so the two modes always agree on the pair list.

use crate::app::ports::ObjectStore;
use crate::app::transaction::AssetTransaction;
use crate::constants::RECORD_KEY_ROOT;
use crate::domain::{KeyMove, MigrationFailure, MigrationPlan, MigrationReport};
use crate::error::Result;
use crate::keys;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct MigrateUseCase {
    objects: Arc<dyn ObjectStore>,
    transaction: Arc<AssetTransaction>,
}

impl MigrateUseCase {
    pub fn new(objects: Arc<dyn ObjectStore>, transaction: Arc<AssetTransaction>) -> Self {
        Self {
            objects,
            transaction,
        }
    }

    /// Computes the rename pairs for a record without touching the
    /// store.
    pub async fn plan(&self, identifier: &str) -> Result<MigrationPlan> {
        let references = self.transaction.current(identifier).await?;
        Ok(self.plan_for(identifier, &references))
    }

    /// Runs a migration. Dry-run returns the plan untouched; apply
    /// copies each object to its canonical key before deleting the old
    /// one, collects per-pair failures without aborting, and rewrites
    /// the record's references for the pairs that moved.
    pub async fn run(&self, identifier: &str, dry_run: bool) -> Result<MigrationReport> {
        let references = self.transaction.current(identifier).await?;
        let plan = self.plan_for(identifier, &references);

        if dry_run {
            return Ok(MigrationReport {
                plan,
                dry_run: true,
                moved: 0,
                failures: Vec::new(),
                references,
            });
        }

        let mut failures = Vec::new();
        let mut moved: HashMap<String, String> = HashMap::new();
        for pair in &plan.moves {
            // Copy first so there is never a moment with zero copies of
            // the object.
            if let Err(e) = self.objects.copy(&pair.from_key, &pair.to_key).await {
                warn!(from = %pair.from_key, to = %pair.to_key, error = %e, "copy failed");
                failures.push(MigrationFailure {
                    reference: self.objects.public_url(&pair.from_key),
                    error: e.to_string(),
                });
                continue;
            }
            moved.insert(pair.from_key.clone(), pair.to_key.clone());

            if let Err(e) = self.objects.delete(&pair.from_key).await {
                // The canonical copy exists; the stale original is
                // acceptable garbage.
                warn!(key = %pair.from_key, error = %e, "legacy object not deleted");
                failures.push(MigrationFailure {
                    reference: self.objects.public_url(&pair.from_key),
                    error: format!("legacy object not deleted: {}", e),
                });
            }
        }

        let references = if moved.is_empty() {
            references
        } else {
            let objects = self.objects.clone();
            let moved_pairs = moved.clone();
            self.transaction
                .replace_references(identifier, move |current| {
                    current
                        .iter()
                        .map(|reference| {
                            match objects.key_for_url(reference) {
                                Some(from_key) => match moved_pairs.get(&from_key) {
                                    Some(to_key) => objects.public_url(to_key),
                                    None => reference.clone(),
                                },
                                None => reference.clone(),
                            }
                        })
                        .collect()
                })
                .await?
        };

        info!(
            identifier = %identifier,
            moved = moved.len(),
            failed = failures.len(),
            "migration applied"
        );
        Ok(MigrationReport {
            plan,
            dry_run: false,
            moved: moved.len(),
            failures,
            references,
        })
    }

    fn plan_for(&self, identifier: &str, references: &[String]) -> MigrationPlan {
        let folder = keys::folder_name(identifier);
        let mut moves = Vec::new();
        let mut skipped = Vec::new();
        for reference in references {
            match self.objects.key_for_url(reference) {
                Some(from_key) => {
                    let to_key = format!(
                        "{}/{}/{}",
                        RECORD_KEY_ROOT,
                        folder,
                        keys::file_basename(&from_key)
                    );
                    // Already canonical; copy-then-delete onto the same
                    // key would destroy the object.
                    if from_key == to_key {
                        continue;
                    }
                    moves.push(KeyMove { from_key, to_key });
                }
                None => skipped.push(MigrationFailure {
                    reference: reference.clone(),
                    error: "no object key could be derived from reference".to_string(),
                }),
            }
        }
        MigrationPlan {
            identifier: identifier.to_string(),
            folder,
            moves,
            skipped,
        }
    }
}
