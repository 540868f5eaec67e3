//! # Court Resolution Module
//!
//! ## Purpose
//! Maps a raw court hint (canonical ID, resource URL, or free-text court
//! name) to a canonical court record.
//!
//! ## Input/Output Specification
//! - **Input**: Court hint string
//! - **Output**: `CourtResolution` with the matched canonical ID and the
//!   strategy that matched
//!
//! ## Key Features
//! - Strategy order: URL path-segment extraction, direct case-insensitive
//!   ID lookup, token-overlap name match; first success wins
//! - An unresolved hint reports `resolved = false` with no court ID at
//!   all; a resolution failure is a real gap for quality scoring, never a
//!   guessed default jurisdiction

use crate::reference::ReferenceData;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum token-overlap ratio for a fuzzy name match
const NAME_MATCH_THRESHOLD: f64 = 0.7;

/// Which strategy produced a court match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtMatchMethod {
    DirectId,
    UrlPath,
    NameMatch,
}

/// Result of resolving a court hint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtResolution {
    pub resolved: bool,
    /// Canonical court ID; absent whenever `resolved` is false
    pub court_id: Option<String>,
    pub court_name: Option<String>,
    pub method: Option<CourtMatchMethod>,
}

impl CourtResolution {
    fn unresolved() -> Self {
        Self {
            resolved: false,
            court_id: None,
            court_name: None,
            method: None,
        }
    }

    fn matched(record: &crate::reference::CourtRecord, method: CourtMatchMethod) -> Self {
        Self {
            resolved: true,
            court_id: Some(record.id.clone()),
            court_name: Some(record.name.clone()),
            method: Some(method),
        }
    }
}

/// Court resolver over the canonical court table
pub struct CourtResolver {
    reference: Arc<ReferenceData>,
}

impl CourtResolver {
    /// Create a resolver bound to the reference tables
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    /// Resolve a court hint. Empty hints are unresolved, never an error.
    pub fn resolve(&self, court_hint: &str) -> CourtResolution {
        let hint = court_hint.trim();
        if hint.is_empty() {
            return CourtResolution::unresolved();
        }

        // (a) URL hints: the trailing path segment is the candidate ID
        if hint.contains("://") {
            if let Some(candidate) = trailing_path_segment(hint) {
                if let Some(record) = self.reference.court_by_id(candidate) {
                    return CourtResolution::matched(record, CourtMatchMethod::UrlPath);
                }
            }
            return CourtResolution::unresolved();
        }

        // (b) direct case-insensitive ID lookup
        if let Some(record) = self.reference.court_by_id(hint) {
            return CourtResolution::matched(record, CourtMatchMethod::DirectId);
        }

        // (c) fuzzy free-text name match
        if let Some(record) = self.match_by_name(hint) {
            return CourtResolution::matched(record, CourtMatchMethod::NameMatch);
        }

        CourtResolution::unresolved()
    }

    fn match_by_name(&self, hint: &str) -> Option<&crate::reference::CourtRecord> {
        let hint_tokens = name_tokens(hint);
        if hint_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(&crate::reference::CourtRecord, f64)> = None;
        for record in self.reference.courts() {
            let record_tokens = name_tokens(&record.name);
            if record_tokens.is_empty() {
                continue;
            }
            let overlap = hint_tokens.intersection(&record_tokens).count() as f64
                / hint_tokens.len() as f64;
            // Deterministic: courts iterate in ID order, strict greater-than
            // keeps the first best match
            if overlap >= NAME_MATCH_THRESHOLD
                && best.map_or(true, |(_, score)| overlap > score)
            {
                best = Some((record, overlap));
            }
        }

        best.map(|(record, _)| record)
    }
}

fn trailing_path_segment(url: &str) -> Option<&str> {
    url.split('?')
        .next()
        .unwrap_or(url)
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .last()
}

fn name_tokens(name: &str) -> HashSet<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(|token| token.to_ascii_lowercase())
        .filter(|token| !matches!(token.as_str(), "the" | "for" | "and"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::fixtures::reference;

    fn resolver() -> CourtResolver {
        CourtResolver::new(Arc::new(reference()))
    }

    #[test]
    fn direct_id_lookup_is_case_insensitive() {
        let resolution = resolver().resolve("TXED");
        assert!(resolution.resolved);
        assert_eq!(resolution.court_id.as_deref(), Some("txed"));
        assert_eq!(resolution.method, Some(CourtMatchMethod::DirectId));
    }

    #[test]
    fn url_hint_resolves_via_trailing_segment() {
        let resolution =
            resolver().resolve("https://www.courtlistener.com/api/rest/v3/courts/ca9/");
        assert!(resolution.resolved);
        assert_eq!(resolution.court_id.as_deref(), Some("ca9"));
        assert_eq!(resolution.method, Some(CourtMatchMethod::UrlPath));
    }

    #[test]
    fn free_text_name_resolves_fuzzily() {
        let resolution = resolver().resolve("Eastern District of Texas");
        assert!(resolution.resolved);
        assert_eq!(resolution.court_id.as_deref(), Some("txed"));
        assert_eq!(resolution.method, Some(CourtMatchMethod::NameMatch));
    }

    #[test]
    fn unknown_hint_is_never_defaulted() {
        let resolution = resolver().resolve("Intergalactic Tribunal of Claims");
        assert!(!resolution.resolved);
        assert!(resolution.court_id.is_none());
        assert!(resolution.method.is_none());
    }

    #[test]
    fn empty_hint_is_unresolved() {
        let resolution = resolver().resolve("  ");
        assert!(!resolution.resolved);
        assert!(resolution.court_id.is_none());
    }
}
