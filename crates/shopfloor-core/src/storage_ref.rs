//! Turning a persisted storage reference into object-store keys.
//!
//! Attachments written by different client versions carry different kinds of
//! reference: a bucket-prefixed key, a bare key, a UUID, a timestamped
//! filename, a full URL or a local URI. [`resolve`] normalizes all of them
//! without touching the network and returns the keys to try, best first.

use crate::mime::has_extension;

const PASS_THROUGH_SCHEMES: &[&str] = &[
    "http://",
    "https://",
    "file://",
    "content://",
    "ph://",
    "blob:",
];

/// Object keys to try, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateKeys {
    pub primary: String,
    /// Extension-bearing display filename, tried after `primary` fails.
    pub fallback: Option<String>,
}

impl CandidateKeys {
    /// All keys in probe order.
    pub fn ranked(&self) -> Vec<&str> {
        let mut keys = vec![self.primary.as_str()];
        if let Some(fallback) = &self.fallback {
            keys.push(fallback.as_str());
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Already fetchable as-is: a full URL or a local URI.
    PassThrough(String),
    /// Needs an access URL from the object store.
    Keys(CandidateKeys),
    /// Neither the reference nor the fallback filename yielded a key.
    Empty,
}

pub fn is_remote_url(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn is_local_uri(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    PASS_THROUGH_SCHEMES
        .iter()
        .filter(|s| !s.starts_with("http"))
        .any(|s| lower.starts_with(s))
}

pub fn is_pass_through(reference: &str) -> bool {
    is_remote_url(reference) || is_local_uri(reference)
}

/// Derive the object key from a reference that is not a URL.
///
/// Strips `<bucket>/` when present, otherwise keeps only the final segment.
pub fn derive_key(reference: &str, bucket: &str) -> String {
    let trimmed = reference.trim().trim_start_matches('/');
    let bucket = bucket.trim_matches('/');
    if !bucket.is_empty() {
        if let Some(rest) = trimmed.strip_prefix(bucket).and_then(|r| r.strip_prefix('/')) {
            return rest.to_string();
        }
    }
    trimmed.rsplit('/').next().unwrap_or_default().to_string()
}

/// Resolve a storage reference into a pass-through URL or ranked candidate keys.
pub fn resolve(reference: &str, fallback_filename: Option<&str>, bucket: &str) -> Resolution {
    let reference = reference.trim();
    if is_pass_through(reference) {
        return Resolution::PassThrough(reference.to_string());
    }

    let fallback = fallback_filename
        .map(str::trim)
        .filter(|f| !f.is_empty());

    let derived = derive_key(reference, bucket);
    let primary = if derived.is_empty() {
        match fallback {
            Some(f) => f.to_string(),
            None => return Resolution::Empty,
        }
    } else {
        derived
    };

    let fallback = fallback
        .filter(|f| has_extension(f) && *f != primary)
        .map(str::to_string);

    Resolution::Keys(CandidateKeys { primary, fallback })
}
