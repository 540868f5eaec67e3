//! # Judge Resolution Module
//!
//! ## Purpose
//! Resolves the single best judge name for a document from multiple
//! candidate fields using a strict priority order, with a docket-number
//! suffix fallback against the court-scoped initials table.
//!
//! ## Input/Output Specification
//! - **Input**: Candidate judge-bearing fields gathered from the document,
//!   plus the resolved court ID for initials scoping
//! - **Output**: `JudgeResolution` with the cleaned winner, its source
//!   tier, a fixed per-tier confidence, and the full candidate audit trail
//!
//! ## Key Features
//! - First non-empty candidate in priority order wins; no voting or merging
//! - Honorific prefixes are stripped from whichever candidate wins
//! - Unmapped docket-suffix initials are returned verbatim at low
//!   confidence rather than dropped
//! - Deterministic for a given candidate set; returns nothing only when
//!   every candidate field is empty

use crate::errors::{EnrichError, Result};
use crate::reference::ReferenceData;
use crate::utils::{collapse_whitespace, trim_punctuation};
use crate::RawDocument;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which candidate field produced the winning name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeSource {
    DocketAssignedToStr,
    DocketAssignedTo,
    ClusterJudges,
    SearchJudge,
    OpinionAuthor,
    PanelNames,
    DocketPattern,
}

impl JudgeSource {
    /// Fixed confidence tier for this source
    pub fn confidence(&self) -> f64 {
        match self {
            JudgeSource::DocketAssignedToStr => 1.0,
            JudgeSource::DocketAssignedTo => 0.95,
            JudgeSource::ClusterJudges => 0.9,
            JudgeSource::SearchJudge => 0.85,
            JudgeSource::OpinionAuthor => 0.7,
            JudgeSource::PanelNames => 0.6,
            JudgeSource::DocketPattern => 0.5,
        }
    }

    /// Stable name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeSource::DocketAssignedToStr => "docket_assigned_to_str",
            JudgeSource::DocketAssignedTo => "docket_assigned_to",
            JudgeSource::ClusterJudges => "cluster_judges",
            JudgeSource::SearchJudge => "search_judge",
            JudgeSource::OpinionAuthor => "opinion_author",
            JudgeSource::PanelNames => "panel_names",
            JudgeSource::DocketPattern => "docket_pattern",
        }
    }
}

/// One examined candidate, retained for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeCandidate {
    pub source: JudgeSource,
    pub raw_value: String,
}

/// Result of judge resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResolution {
    /// Cleaned display name; never empty when a resolution is returned
    pub name: String,
    pub source: JudgeSource,
    pub confidence: f64,
    /// Every candidate field that held a judge-like value, winner included
    pub all_candidates: Vec<JudgeCandidate>,
}

/// Candidate fields gathered from one document
#[derive(Debug, Clone, Default)]
pub struct JudgeCandidates {
    pub docket_assigned_to_str: Option<String>,
    pub docket_assigned_to: Option<String>,
    pub cluster_judges: Option<String>,
    pub search_judge: Option<String>,
    pub opinion_author_str: Option<String>,
    pub cluster_panel_names: Vec<String>,
    pub docket_number: Option<String>,
}

impl JudgeCandidates {
    /// Gather candidates from a document's metadata fields
    pub fn from_document(doc: &RawDocument) -> Self {
        Self {
            docket_assigned_to_str: doc.metadata.assigned_to_str.clone(),
            docket_assigned_to: doc.metadata.assigned_to.clone(),
            cluster_judges: doc.metadata.cluster_judges.clone(),
            search_judge: doc.metadata.search_judge.clone(),
            opinion_author_str: doc.metadata.author_str.clone(),
            cluster_panel_names: doc.metadata.panel_names.clone(),
            docket_number: doc.docket_number.clone(),
        }
    }
}

/// Judge resolver over the court-scoped initials table
pub struct JudgeResolver {
    reference: Arc<ReferenceData>,
    honorific_pattern: Regex,
    bare_honorific_pattern: Regex,
    suffix_pattern: Regex,
    author_pattern: Regex,
}

impl JudgeResolver {
    /// Create a resolver bound to the reference tables
    pub fn new(reference: Arc<ReferenceData>) -> Result<Self> {
        Ok(Self {
            reference,
            honorific_pattern: compile(
                r"(?i)^(?:the\s+honorable|honorable|hon\.?|chief\s+judge|magistrate\s+judge|judge|justice)\s+",
            )?,
            bare_honorific_pattern: compile(
                r"(?i)^(?:the\s+honorable|honorable|hon\.?|chief\s+judge|magistrate\s+judge|judge|justice)$",
            )?,
            suffix_pattern: compile(r"-([A-Za-z]{2,4})$")?,
            author_pattern: compile(
                r"(?:(?i)(?:chief\s+|magistrate\s+)?(?:judge|justice)\s+)([A-Z][A-Za-z.'-]+(?:\s+[A-Z][A-Za-z.'-]+){0,3})",
            )?,
        })
    }

    /// Resolve the best judge name from the candidate fields.
    ///
    /// `court_id` scopes the docket-suffix initials lookup; without it,
    /// matched initials fall through to the verbatim low-confidence path.
    pub fn resolve(
        &self,
        candidates: &JudgeCandidates,
        court_id: Option<&str>,
    ) -> Option<JudgeResolution> {
        let mut examined: Vec<(JudgeSource, String, String)> = Vec::new();

        let direct_fields = [
            (
                JudgeSource::DocketAssignedToStr,
                candidates.docket_assigned_to_str.as_deref(),
            ),
            (
                JudgeSource::DocketAssignedTo,
                candidates.docket_assigned_to.as_deref(),
            ),
            (JudgeSource::ClusterJudges, candidates.cluster_judges.as_deref()),
            (JudgeSource::SearchJudge, candidates.search_judge.as_deref()),
            (
                JudgeSource::OpinionAuthor,
                candidates.opinion_author_str.as_deref(),
            ),
        ];

        for (source, value) in direct_fields {
            if let Some(raw) = value {
                let cleaned = self.clean_name(raw);
                if !cleaned.is_empty() {
                    examined.push((source, raw.to_string(), cleaned));
                }
            }
        }

        let panel: Vec<&str> = candidates
            .cluster_panel_names
            .iter()
            .map(|name| name.as_str())
            .filter(|name| !name.trim().is_empty())
            .collect();
        if !panel.is_empty() {
            let raw = panel.join("; ");
            let cleaned = panel
                .iter()
                .map(|name| self.clean_name(name))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            if !cleaned.is_empty() {
                examined.push((JudgeSource::PanelNames, raw, cleaned));
            }
        }

        if let Some(initials) = candidates
            .docket_number
            .as_deref()
            .and_then(|docket| self.docket_suffix(docket))
        {
            let mapped = court_id
                .and_then(|court| self.reference.judge_for_initials(court, &initials))
                .map(str::to_string);
            // Unmapped initials still carry signal; keep them verbatim
            let name = mapped.unwrap_or_else(|| initials.clone());
            examined.push((JudgeSource::DocketPattern, initials, name));
        }

        let all_candidates: Vec<JudgeCandidate> = examined
            .iter()
            .map(|(source, raw, _)| JudgeCandidate {
                source: *source,
                raw_value: raw.clone(),
            })
            .collect();

        // Strict priority order: first surviving candidate wins
        examined.into_iter().next().map(|(source, _, name)| JudgeResolution {
            name,
            source,
            confidence: source.confidence(),
            all_candidates,
        })
    }

    /// Scan content for an authoring-judge mention, for stage strategies
    /// that include content
    pub fn author_from_content(&self, content: &str) -> Option<String> {
        self.author_pattern
            .captures(content)
            .and_then(|captures| captures.get(1))
            .map(|m| self.clean_name(m.as_str()))
            .filter(|name| !name.is_empty())
    }

    /// Strip honorific prefixes and trailing punctuation, collapse whitespace.
    /// A field holding nothing but an honorific has no judge-like value.
    fn clean_name(&self, raw: &str) -> String {
        let collapsed = collapse_whitespace(raw);
        let without_honorific = self.honorific_pattern.replace(&collapsed, "");
        let trimmed = trim_punctuation(&without_honorific);
        if self.bare_honorific_pattern.is_match(trimmed) {
            return String::new();
        }
        trimmed.to_string()
    }

    /// Extract trailing judge initials from a docket number
    fn docket_suffix(&self, docket_number: &str) -> Option<String> {
        self.suffix_pattern
            .captures(docket_number.trim())
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
    }
}

fn compile(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| EnrichError::Pattern {
        pattern: source.to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::fixtures::reference;

    fn resolver() -> JudgeResolver {
        JudgeResolver::new(Arc::new(reference())).unwrap()
    }

    #[test]
    fn assigned_to_str_outranks_author() {
        let candidates = JudgeCandidates {
            docket_assigned_to_str: Some("Judge A".to_string()),
            opinion_author_str: Some("Judge B".to_string()),
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, None).unwrap();
        assert_eq!(resolution.name, "A");
        assert_eq!(resolution.source, JudgeSource::DocketAssignedToStr);
        assert!((resolution.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(resolution.all_candidates.len(), 2);
    }

    #[test]
    fn honorifics_are_stripped() {
        let candidates = JudgeCandidates {
            cluster_judges: Some("The Honorable Rodney Gilstrap,".to_string()),
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, None).unwrap();
        assert_eq!(resolution.name, "Rodney Gilstrap");
        assert_eq!(resolution.source, JudgeSource::ClusterJudges);
        assert!((resolution.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn docket_suffix_maps_through_initials_table() {
        let candidates = JudgeCandidates {
            docket_number: Some("2:21-cv-00316-JRG".to_string()),
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, Some("txed")).unwrap();
        assert_eq!(resolution.name, "Rodney Gilstrap");
        assert_eq!(resolution.source, JudgeSource::DocketPattern);
        assert!((resolution.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unmapped_initials_are_returned_verbatim() {
        let candidates = JudgeCandidates {
            docket_number: Some("1:20-cv-00001-ZZZ".to_string()),
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, Some("txed")).unwrap();
        assert_eq!(resolution.name, "ZZZ");
        assert_eq!(resolution.source, JudgeSource::DocketPattern);
        assert!((resolution.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn panel_names_are_joined() {
        let candidates = JudgeCandidates {
            cluster_panel_names: vec![
                "Judge Alpha".to_string(),
                "Judge Beta".to_string(),
            ],
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, None).unwrap();
        assert_eq!(resolution.name, "Alpha; Beta");
        assert_eq!(resolution.source, JudgeSource::PanelNames);
    }

    #[test]
    fn empty_candidates_resolve_to_none() {
        let resolution = resolver().resolve(&JudgeCandidates::default(), None);
        assert!(resolution.is_none());
    }

    #[test]
    fn honorific_only_field_is_not_a_candidate() {
        let candidates = JudgeCandidates {
            docket_assigned_to_str: Some("Judge ".to_string()),
            cluster_judges: Some("Hon. Robert W. Schroeder III".to_string()),
            ..Default::default()
        };
        let resolution = resolver().resolve(&candidates, None).unwrap();
        assert_eq!(resolution.name, "Robert W. Schroeder III");
        assert_eq!(resolution.source, JudgeSource::ClusterJudges);
        assert_eq!(resolution.all_candidates.len(), 1);
    }

    #[test]
    fn author_scan_finds_judge_in_content() {
        let author = resolver()
            .author_from_content("Before the court. JUDGE Rodney Gilstrap delivered the opinion.")
            .unwrap();
        assert_eq!(author, "Rodney Gilstrap");
    }

    #[test]
    fn resolution_is_order_independent() {
        let mut candidates = JudgeCandidates {
            search_judge: Some("Judge Later".to_string()),
            ..Default::default()
        };
        candidates.cluster_judges = Some("Judge Sooner".to_string());
        let resolution = resolver().resolve(&candidates, None).unwrap();
        assert_eq!(resolution.name, "Sooner");
        assert_eq!(resolution.source, JudgeSource::ClusterJudges);
    }
}
