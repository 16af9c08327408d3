/// Key-layout and upload-policy constants shared across the codebase.
/// These define the two namespaces assets live under and the bounds the
/// upload path enforces.
use once_cell::sync::Lazy;
use std::collections::HashSet;

// Canonical namespace: records/<sanitized identifier>/<file name>
pub const RECORD_KEY_ROOT: &str = "records";

// Flat namespace for presigned uploads that arrive without an owning
// identifier; keys here carry a millisecond prefix for uniqueness.
pub const FLAT_UPLOAD_ROOT: &str = "uploads";

// Filenames like WDB903661_3.jpg encode the owning identifier before
// the first underscore.
pub const IDENTIFIER_DELIMITER: char = '_';

// Upload bounds (overridable via config.toml)
pub const MAX_UPLOAD_FILES: usize = 10;
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

// Presigned upload URLs stay valid for 15 minutes.
pub const PRESIGN_TTL_SECS: u64 = 900;

pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

pub static ALLOWED_CONTENT_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/webp",
        "application/pdf",
    ]
    .into_iter()
    .collect()
});
