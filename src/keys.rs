//! Key derivation for object-store paths.
//!
//! Identifiers are caller-supplied and free-form (spaces, `#`, `+` and
//! friends all appear in real data), so anything that becomes part of a
//! storage key goes through the substitution table below. Historical
//! references were written with several space encodings; `key_variants`
//! produces the candidate keys a deletion has to try.

use crate::constants::{FLAT_UPLOAD_ROOT, RECORD_KEY_ROOT};
use percent_encoding::percent_decode_str;

/// Maps an identifier to a path-safe folder token. Deterministic and
/// idempotent: the replacement strings never contain a reserved
/// character, and everything outside `[A-Za-z0-9_.-]` is dropped.
pub fn folder_name(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    for c in identifier.chars() {
        match c {
            '#' => out.push_str("HASH"),
            '%' => out.push_str("PCT"),
            '?' => out.push_str("Q"),
            '&' => out.push_str("AND"),
            '+' => out.push_str("PLUS"),
            ' ' => out.push('-'),
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') => out.push(c),
            _ => {}
        }
    }
    out
}

/// Canonical key for a file owned by a record: `records/<folder>/<name>`.
pub fn record_key(identifier: &str, file_name: &str) -> String {
    format!("{}/{}/{}", RECORD_KEY_ROOT, folder_name(identifier), file_name)
}

/// Flat-namespace key for uploads with no owning identifier, prefixed
/// with a millisecond token so concurrent uploads of the same filename
/// cannot collide.
pub fn flat_key(file_name: &str) -> String {
    format!("{}/{}", FLAT_UPLOAD_ROOT, timestamped_name(file_name))
}

pub fn timestamped_name(file_name: &str) -> String {
    format!("{}_{}", chrono::Utc::now().timestamp_millis(), file_name)
}

pub fn strip_spaces(file_name: &str) -> String {
    file_name.replace(' ', "")
}

/// Collapses backslashes and repeated slashes in a stored reference.
/// The `://` scheme separator is preserved; everything after it is
/// collapsed. Historical rows contain both `\` and doubled `/`.
pub fn normalize_slashes(url: &str) -> String {
    let replaced = url.replace('\\', "/");
    match replaced.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}", scheme, collapse_slashes(rest)),
        None => collapse_slashes(&replaced),
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_was_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_was_slash {
                continue;
            }
            prev_was_slash = true;
        } else {
            prev_was_slash = false;
        }
        out.push(c);
    }
    out
}

/// Last path segment of a key or URL.
pub fn file_basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Ordered candidate keys for deleting a historical object. Stored
/// references were written with raw spaces, `%20` and `+`
/// interchangeably, so deletion walks these in order and stops at the
/// first key the store accepts.
pub fn key_variants(key: &str) -> Vec<String> {
    let decoded = percent_decode_str(key).decode_utf8_lossy().to_string();
    let candidates = [
        key.to_string(),
        decoded.clone(),
        key.replace("%20", "+"),
        key.replace('+', "%20"),
        decoded.replace(' ', "+"),
        decoded.replace(' ', "%20"),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_name_substitutes_reserved_characters() {
        assert_eq!(folder_name("AB#12"), "ABHASH12");
        assert_eq!(folder_name("AB%12"), "ABPCT12");
        assert_eq!(folder_name("AB?12"), "ABQ12");
        assert_eq!(folder_name("AB&12"), "ABAND12");
        assert_eq!(folder_name("AB+12"), "ABPLUS12");
        assert_eq!(folder_name("AB 12"), "AB-12");
    }

    #[test]
    fn folder_name_strips_everything_else() {
        assert_eq!(folder_name("A/B:C*D"), "ABCD");
        assert_eq!(folder_name("wdb.903-661_X"), "wdb.903-661_X");
    }

    #[test]
    fn folder_name_is_idempotent_and_deterministic() {
        let inputs = ["AB#12 C+D", "  ", "plain", "100% legit?"];
        for input in inputs {
            let once = folder_name(input);
            assert_eq!(folder_name(&once), once, "not idempotent for {input:?}");
            assert_eq!(folder_name(input), once, "not deterministic for {input:?}");
        }
    }

    #[test]
    fn record_key_uses_sanitized_folder() {
        assert_eq!(record_key("AB#1 2", "photo.jpg"), "records/ABHASH1-2/photo.jpg");
    }

    #[test]
    fn normalize_slashes_preserves_scheme() {
        assert_eq!(
            normalize_slashes("https://bucket.example.com//a\\b.jpg"),
            "https://bucket.example.com/a/b.jpg"
        );
    }

    #[test]
    fn normalize_slashes_collapses_bare_paths() {
        assert_eq!(normalize_slashes("a\\\\b//c"), "a/b/c");
    }

    #[test]
    fn key_variants_order_and_dedup() {
        let variants = key_variants("uploads/car%20front.jpg");
        assert_eq!(
            variants,
            vec![
                "uploads/car%20front.jpg".to_string(),
                "uploads/car front.jpg".to_string(),
                "uploads/car+front.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn key_variants_for_plain_key_is_single() {
        assert_eq!(key_variants("uploads/a.jpg"), vec!["uploads/a.jpg".to_string()]);
    }

    #[test]
    fn basename_takes_last_segment() {
        assert_eq!(file_basename("records/AB12/photo.jpg"), "photo.jpg");
        assert_eq!(file_basename("photo.jpg"), "photo.jpg");
    }
}
