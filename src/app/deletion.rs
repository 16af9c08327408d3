//! Positional removal of asset references.
//!
//! Removal is strictly by index, never by value: reference lists may
//! contain duplicate URLs, and only positions name an entry
//! unambiguously. Planning is pure; the store-side executor walks the
//! encoding variants of each resolved key.

use crate::app::ports::ObjectStore;
use crate::domain::AssetRemoval;
use crate::error::{AssetError, Result};
use crate::keys;
use tracing::{debug, warn};

/// One entry scheduled for removal.
#[derive(Debug, Clone)]
pub struct RemovalTarget {
    pub index: usize,
    pub reference: String,
}

/// A validated removal: distinct indices in descending order so that
/// splicing one position never shifts a not-yet-processed one.
#[derive(Debug, Clone)]
pub struct RemovalPlan {
    pub targets: Vec<RemovalTarget>,
}

impl RemovalPlan {
    pub fn indices(&self) -> Vec<usize> {
        self.targets.iter().map(|t| t.index).collect()
    }
}

/// Validates `indices` against the current list and computes the
/// removal order. Any out-of-range index fails the whole call before
/// anything is touched.
pub fn plan_removal(references: &[String], indices: &[usize]) -> Result<RemovalPlan> {
    let invalid: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&index| index >= references.len())
        .collect();
    if !invalid.is_empty() {
        let range = if references.is_empty() {
            "none".to_string()
        } else {
            format!("0-{}", references.len() - 1)
        };
        return Err(AssetError::Validation(format!(
            "invalid indices: {:?}; record has {} references (valid indices: {})",
            invalid,
            references.len(),
            range
        )));
    }

    let mut distinct: Vec<usize> = indices.to_vec();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();

    let targets = distinct
        .into_iter()
        .map(|index| RemovalTarget {
            index,
            reference: references[index].clone(),
        })
        .collect();

    Ok(RemovalPlan { targets })
}

/// Splices the planned positions out, relying on the descending order.
pub fn apply_removal(references: &[String], plan: &RemovalPlan) -> Vec<String> {
    let mut remaining = references.to_vec();
    for target in &plan.targets {
        remaining.remove(target.index);
    }
    remaining
}

/// Deletes one reference's object, trying each historical key encoding
/// in order. Failure is reported, never raised: the reference leaves
/// the record regardless, and unresolved store garbage is acceptable.
pub async fn delete_reference(objects: &dyn ObjectStore, target: &RemovalTarget) -> AssetRemoval {
    let Some(key) = objects.key_for_url(&target.reference) else {
        warn!(
            reference = %target.reference,
            index = target.index,
            "no object key could be derived from reference"
        );
        return AssetRemoval {
            index: target.index,
            reference: target.reference.clone(),
            store_deleted: false,
            attempted_keys: Vec::new(),
            error: Some("no object key could be derived from reference".to_string()),
        };
    };

    let variants = keys::key_variants(&key);
    let mut last_error = None;
    for variant in &variants {
        match objects.delete(variant).await {
            Ok(()) => {
                debug!(key = %variant, index = target.index, "object deleted");
                return AssetRemoval {
                    index: target.index,
                    reference: target.reference.clone(),
                    store_deleted: true,
                    attempted_keys: variants.clone(),
                    error: None,
                };
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    warn!(
        reference = %target.reference,
        index = target.index,
        attempted = variants.len(),
        "object deletion failed for all key variants"
    );
    AssetRemoval {
        index: target.index,
        reference: target.reference.clone(),
        store_deleted: false,
        attempted_keys: variants,
        error: last_error,
    }
}
