//! Data shapes exchanged with callers of the asset lifecycle
//! operations. Everything here serializes so the CLI (or any outer
//! surface) can print results verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One file a caller wants a presigned upload URL for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub file_name: String,
    pub content_type: Option<String>,
}

/// A binary payload arriving through the server-side upload path.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    pub file_name: String,
    pub key: String,
    pub upload_url: String,
}

/// Result of a presign call. No object exists yet; the caller must
/// upload and then merge the keys into the record.
#[derive(Debug, Clone, Serialize)]
pub struct PresignBatch {
    pub identifier: Option<String>,
    pub uploads: Vec<PresignedUpload>,
    pub expires_in_secs: u64,
}

/// Outcome of a batch upload grouped by inferred owning identifier.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// New reference URLs keyed by the identifier parsed from each
    /// filename.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Identifiers whose record was found and updated.
    pub linked: Vec<String>,
    /// Identifiers with no matching record; their objects stay in the
    /// store unreferenced.
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddedAssets {
    pub identifier: String,
    pub new_references: Vec<String>,
    pub all_references: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedAssets {
    pub identifier: String,
    pub references: Vec<String>,
}

/// Per-index outcome of an indexed removal.
#[derive(Debug, Clone, Serialize)]
pub struct AssetRemoval {
    pub index: usize,
    pub reference: String,
    pub store_deleted: bool,
    pub attempted_keys: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalSummary {
    pub requested: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub identifier: String,
    pub removed_indices: Vec<usize>,
    pub removed_references: Vec<String>,
    pub remaining: Vec<String>,
    pub deletions: Vec<AssetRemoval>,
    pub summary: RemovalSummary,
}

/// One planned rename from a historical key to its canonical location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMove {
    pub from_key: String,
    pub to_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFailure {
    pub reference: String,
    pub error: String,
}

/// The side-effect-free part of a migration. Dry-run and apply both
/// return exactly this content for the same starting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub identifier: String,
    pub folder: String,
    pub moves: Vec<KeyMove>,
    pub skipped: Vec<MigrationFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub plan: MigrationPlan,
    pub dry_run: bool,
    pub moved: usize,
    pub failures: Vec<MigrationFailure>,
    /// The record's reference list after the operation (unchanged for
    /// dry-run).
    pub references: Vec<String>,
}
