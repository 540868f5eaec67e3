//! # Content Identity Module
//!
//! ## Purpose
//! Computes a stable, content-addressed identity for a raw document, used by
//! the deduplication index and by the storage sink's upsert decision.
//!
//! ## Input/Output Specification
//! - **Input**: A `RawDocument`
//! - **Output**: A `ContentFingerprint` — SHA-256 over the canonical
//!   identity fields, hex encoded
//!
//! ## Key Features
//! - Pure function of its inputs: reproducible across runs and restarts
//! - Content-sensitive: a corrected re-filing with changed text yields a
//!   different fingerprint, so storage can distinguish update from skip
//! - Fails only when every identifying field is absent; never falls back
//!   to a weaker identity

use crate::errors::{EnrichError, Result};
use crate::utils::truncate_chars;
use crate::RawDocument;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of leading content characters mixed into the fingerprint
pub const CONTENT_PREFIX_CHARS: usize = 100;

/// A deterministic content-derived identity used for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Hex digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstruct a fingerprint loaded from storage
    pub fn from_stored(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint for a raw document.
///
/// Combines external id, docket number, and the first
/// [`CONTENT_PREFIX_CHARS`] characters of content, separated by a unit
/// separator so field boundaries cannot collide.
pub fn fingerprint(doc: &RawDocument) -> Result<ContentFingerprint> {
    let external_id = doc.external_id.trim();
    let docket_number = doc.docket_number.as_deref().unwrap_or("").trim();
    let content_prefix = truncate_chars(doc.content.trim(), CONTENT_PREFIX_CHARS);

    if external_id.is_empty() && docket_number.is_empty() && content_prefix.is_empty() {
        return Err(EnrichError::Identity {
            document: doc
                .case_name
                .clone()
                .unwrap_or_else(|| "<unnamed>".to_string()),
            reason: "missing external id, docket number, and content".to_string(),
        });
    }

    let mut hasher = Sha256::new();
    hasher.update(external_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(docket_number.as_bytes());
    hasher.update([0x1f]);
    hasher.update(content_prefix.as_bytes());

    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(ContentFingerprint(hex))
}
