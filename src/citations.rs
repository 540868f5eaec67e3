//! # Citation Extraction Module
//!
//! ## Purpose
//! Extracts legal citations from free text and normalizes reporter
//! abbreviations against the static reporter table.
//!
//! ## Input/Output Specification
//! - **Input**: Normalized document text, reporter abbreviations
//! - **Output**: Ordered citations with volume/reporter/page/year capture,
//!   reporter normalization results
//!
//! ## Key Features
//! - Extraction never fails on unparseable text; it returns an empty list
//! - Edition-aware reporter decomposition for the Federal Reporter and
//!   Federal Supplement families (`F.2d`, `F. Supp. 3d`, ...)
//! - Case-insensitive fallback lookup when exact-case lookup fails

use crate::errors::{EnrichError, Result};
use crate::reference::ReferenceData;
use crate::utils::collapse_whitespace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single extracted citation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Citation text as matched
    pub raw_text: String,
    /// Volume number
    pub volume: Option<String>,
    /// Reporter abbreviation as matched
    pub reporter: Option<String>,
    /// Page number
    pub page: Option<String>,
    /// Decision year when present in the parenthetical
    pub year: Option<u32>,
    /// Byte offset of the match in the analyzed text
    pub position: usize,
    /// Reporter-table normalization for the matched abbreviation
    pub reporter_normalization: Option<ReporterNormalization>,
}

/// Result of reporter-abbreviation normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterNormalization {
    /// Whether the abbreviation resolved against the reporter table
    pub found: bool,
    /// Base table key the abbreviation resolved to, e.g. `F.`
    pub base_reporter: Option<String>,
    /// Canonical series name, e.g. `Federal Reporter`
    pub canonical_name: Option<String>,
    /// Canonical edition abbreviation, e.g. `F.3d`
    pub edition: Option<String>,
}

impl ReporterNormalization {
    fn miss() -> Self {
        Self {
            found: false,
            base_reporter: None,
            canonical_name: None,
            edition: None,
        }
    }
}

/// Compiled citation grammar, shared by the extractor and the classifier
pub struct CitationPatterns {
    patterns: Vec<Regex>,
}

impl CitationPatterns {
    /// Compile the citation pattern table
    pub fn new() -> Result<Self> {
        // Volume / reporter / page, with an optional parenthetical year.
        // The federal pattern comes first so `F.2d`-style editions are not
        // split by the generic pattern.
        let sources = [
            // Federal Reporter and Federal Supplement families
            r"(\d{1,4})\s+(F\.(?:\s?Supp\.)?(?:\s?(?:2d|3d))?)\s+(\d{1,5})(?:\s*\([^)]*?(\d{4})\))?",
            // United States Reports / Supreme Court Reporter / Lawyers' Edition
            r"(\d{1,4})\s+(U\.\s?S\.|S\.\s?Ct\.|L\.\s?Ed\.(?:\s?2d)?)\s+(\d{1,5})(?:\s*\((\d{4})\))?",
            // Generic state and regional reporters
            r"(\d{1,4})\s+([A-Z][A-Za-z]{0,9}\.(?:\s?[A-Z][A-Za-z]{0,9}\.)?(?:\s?(?:2d|3d))?)\s+(\d{1,5})(?:\s*\([^)]*?(\d{4})\))?",
        ];

        let mut patterns = Vec::with_capacity(sources.len());
        for source in sources {
            patterns.push(Regex::new(source).map_err(|e| EnrichError::Pattern {
                pattern: source.to_string(),
                details: e.to_string(),
            })?);
        }

        Ok(Self { patterns })
    }

    /// Count citation-like substrings, used by the document-type classifier
    pub fn count_matches(&self, text: &str) -> usize {
        self.collect_spans(text).len()
    }

    fn collect_spans(&self, text: &str) -> Vec<(usize, usize, usize)> {
        // (start, end, pattern index); earlier patterns win on overlap
        let mut spans: Vec<(usize, usize, usize)> = Vec::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            for m in pattern.find_iter(text) {
                spans.push((m.start(), m.end(), index));
            }
        }
        spans.sort_by_key(|&(start, end, index)| (start, index, std::cmp::Reverse(end)));

        let mut kept: Vec<(usize, usize, usize)> = Vec::new();
        for span in spans {
            if kept.last().map_or(true, |&(_, end, _)| span.0 >= end) {
                kept.push(span);
            }
        }
        kept
    }
}

/// Citation extractor over the compiled grammar and the reporter table
pub struct CitationExtractor {
    patterns: CitationPatterns,
    reference: Arc<ReferenceData>,
}

impl CitationExtractor {
    /// Create a new extractor bound to the reference tables
    pub fn new(reference: Arc<ReferenceData>) -> Result<Self> {
        Ok(Self {
            patterns: CitationPatterns::new()?,
            reference,
        })
    }

    /// Extract citations from text, ordered by position.
    ///
    /// Unparseable text yields an empty list, never an error.
    pub fn extract(&self, text: &str) -> Vec<Citation> {
        let spans = self.patterns.collect_spans(text);
        let mut citations = Vec::with_capacity(spans.len());

        for (start, _end, index) in spans {
            let pattern = &self.patterns.patterns[index];
            let Some(captures) = pattern.captures_at(text, start) else {
                continue;
            };
            let Some(full) = captures.get(0).filter(|m| m.start() == start) else {
                continue;
            };

            let reporter = captures.get(2).map(|m| collapse_whitespace(m.as_str()));
            let reporter_normalization = reporter
                .as_deref()
                .map(|abbrev| self.normalize_reporter(abbrev));

            citations.push(Citation {
                raw_text: full.as_str().to_string(),
                volume: captures.get(1).map(|m| m.as_str().to_string()),
                reporter,
                page: captures.get(3).map(|m| m.as_str().to_string()),
                year: captures.get(4).and_then(|m| m.as_str().parse().ok()),
                position: full.start(),
                reporter_normalization,
            });
        }

        citations
    }

    /// Normalize a reporter abbreviation against the reporter table.
    ///
    /// Lookup order: exact base key, case-insensitive base key, then
    /// edition decomposition (`F.3d` -> base `F.` + edition `F.3d`) with the
    /// same exact-then-case-insensitive fallback on the base. A miss is
    /// informational: `found = false`, never an error.
    pub fn normalize_reporter(&self, abbreviation: &str) -> ReporterNormalization {
        let cleaned = collapse_whitespace(abbreviation.trim());
        if cleaned.is_empty() {
            return ReporterNormalization::miss();
        }

        if let Some(record) = self
            .reference
            .reporter(&cleaned)
            .or_else(|| self.reference.reporter_ci(&cleaned))
        {
            return ReporterNormalization {
                found: true,
                base_reporter: Some(record.abbreviation.clone()),
                canonical_name: Some(record.name.clone()),
                edition: Some(canonical_edition(record, &cleaned)),
            };
        }

        // Edition suffixes like `2d`/`3d` are not top-level table keys and
        // must be decomposed into base key + edition.
        if let Some((base, _suffix)) = split_edition(&cleaned) {
            if let Some(record) = self
                .reference
                .reporter(&base)
                .or_else(|| self.reference.reporter_ci(&base))
            {
                return ReporterNormalization {
                    found: true,
                    base_reporter: Some(record.abbreviation.clone()),
                    canonical_name: Some(record.name.clone()),
                    edition: Some(canonical_edition(record, &cleaned)),
                };
            }
        }

        ReporterNormalization::miss()
    }
}

/// Split a trailing `2d`/`3d` edition suffix from an abbreviation
fn split_edition(abbreviation: &str) -> Option<(String, String)> {
    let lower = abbreviation.to_ascii_lowercase();
    let suffix = if lower.ends_with("2d") {
        "2d"
    } else if lower.ends_with("3d") {
        "3d"
    } else {
        return None;
    };

    let base = abbreviation[..abbreviation.len() - suffix.len()].trim_end();
    if base.is_empty() {
        return None;
    }
    Some((base.to_string(), suffix.to_string()))
}

/// Map a matched abbreviation to the record's canonical edition string
fn canonical_edition(record: &crate::reference::ReporterRecord, matched: &str) -> String {
    let key = squash(matched);
    record
        .editions
        .iter()
        .find(|edition| squash(edition) == key)
        .cloned()
        .unwrap_or_else(|| matched.to_string())
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::fixtures::reference;

    fn extractor() -> CitationExtractor {
        CitationExtractor::new(Arc::new(reference())).unwrap()
    }

    #[test]
    fn extracts_ordered_citations() {
        let extractor = extractor();
        let text = "See Roe v. Wade, 410 U.S. 113 (1973); accord Smith v. Jones, \
                    123 F.3d 456 (9th Cir. 1997).";
        let citations = extractor.extract(text);
        assert_eq!(citations.len(), 2);
        assert!(citations[0].position < citations[1].position);
        assert_eq!(citations[0].volume.as_deref(), Some("410"));
        assert_eq!(citations[0].reporter.as_deref(), Some("U.S."));
        assert_eq!(citations[0].page.as_deref(), Some("113"));
        assert_eq!(citations[0].year, Some(1973));
        assert_eq!(citations[1].reporter.as_deref(), Some("F.3d"));
        assert_eq!(citations[1].year, Some(1997));
    }

    #[test]
    fn federal_supplement_is_matched_as_one_reporter() {
        let extractor = extractor();
        let citations = extractor.extract("See 950 F. Supp. 2d 1120 (N.D. Cal. 2013).");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].reporter.as_deref(), Some("F. Supp. 2d"));
        let normalization = citations[0].reporter_normalization.as_ref().unwrap();
        assert!(normalization.found);
        assert_eq!(normalization.base_reporter.as_deref(), Some("F. Supp."));
    }

    #[test]
    fn unparseable_text_yields_empty_list() {
        let extractor = extractor();
        assert!(extractor.extract("no citations here at all").is_empty());
        assert!(extractor.extract("").is_empty());
    }

    #[test]
    fn reporter_edition_decomposition() {
        let extractor = extractor();
        for abbrev in ["F.3d", "f.3d"] {
            let normalization = extractor.normalize_reporter(abbrev);
            assert!(normalization.found, "{} should resolve", abbrev);
            assert_eq!(normalization.base_reporter.as_deref(), Some("F."));
            assert_eq!(normalization.edition.as_deref(), Some("F.3d"));
            assert_eq!(
                normalization.canonical_name.as_deref(),
                Some("Federal Reporter")
            );
        }
    }

    #[test]
    fn reporter_exact_and_case_insensitive_lookup() {
        let extractor = extractor();
        let exact = extractor.normalize_reporter("U.S.");
        assert!(exact.found);
        assert_eq!(exact.edition.as_deref(), Some("U.S."));

        let ci = extractor.normalize_reporter("u.s.");
        assert!(ci.found);
        assert_eq!(ci.base_reporter.as_deref(), Some("U.S."));
    }

    #[test]
    fn unknown_reporter_is_informational_miss() {
        let extractor = extractor();
        let miss = extractor.normalize_reporter("Xyz. 4th");
        assert!(!miss.found);
        assert!(miss.base_reporter.is_none());
    }

    #[test]
    fn classifier_counting_matches_extraction() {
        let patterns = CitationPatterns::new().unwrap();
        let text = "410 U.S. 113; 123 F.3d 456; 950 F. Supp. 2d 1120";
        assert_eq!(patterns.count_matches(text), 3);
    }
}
