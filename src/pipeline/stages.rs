//! # Stage Selection Module
//!
//! ## Purpose
//! Maps a detected document type to the ordered list of enrichment stages
//! to run and the judge-extraction strategy to use. Selection is a static
//! table keyed by type: which logic runs for which document is a
//! first-class configuration object, not a runtime patch of behavior.
//!
//! Running citation extraction against docket metadata produced systematic
//! false quality metrics for records that structurally cannot have
//! citations, so dockets never receive the citation or structure stages,
//! and unrecognized types get a conservative minimal set rather than the
//! full opinion treatment.

use crate::DocumentType;
use serde::{Deserialize, Serialize};

/// One independent unit of enrichment work
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CourtResolution,
    JudgeResolution,
    CitationExtraction,
    StructureAnalysis,
    KeywordExtraction,
}

impl Stage {
    /// Stable name used in reports and persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CourtResolution => "court_resolution",
            Stage::JudgeResolution => "judge_resolution",
            Stage::CitationExtraction => "citation_extraction",
            Stage::StructureAnalysis => "structure_analysis",
            Stage::KeywordExtraction => "keyword_extraction",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where judge candidates are gathered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeStrategy {
    /// Content scan only
    Content,
    /// Metadata fields only; body-less records have no prose to scan
    MetadataOnly,
    /// Metadata fields, with a content scan filling a missing author
    ContentAndMetadata,
}

const OPINION_STAGES: &[Stage] = &[
    Stage::CourtResolution,
    Stage::JudgeResolution,
    Stage::CitationExtraction,
    Stage::StructureAnalysis,
    Stage::KeywordExtraction,
];

const ORDER_STAGES: &[Stage] = &[
    Stage::CourtResolution,
    Stage::JudgeResolution,
    Stage::CitationExtraction,
];

const DOCKET_STAGES: &[Stage] = &[
    Stage::CourtResolution,
    Stage::JudgeResolution,
    Stage::KeywordExtraction,
];

const BRIEF_STAGES: &[Stage] = &[
    Stage::CourtResolution,
    Stage::CitationExtraction,
    Stage::StructureAnalysis,
    Stage::KeywordExtraction,
];

const MINIMAL_STAGES: &[Stage] = &[Stage::CourtResolution, Stage::KeywordExtraction];

/// Static type-to-stages and type-to-strategy tables
pub struct StageSelector;

impl StageSelector {
    /// Ordered enrichment stages for a detected type
    pub fn stages_for(doc_type: DocumentType) -> &'static [Stage] {
        match doc_type {
            DocumentType::Opinion => OPINION_STAGES,
            DocumentType::Order => ORDER_STAGES,
            DocumentType::Docket => DOCKET_STAGES,
            DocumentType::Brief => BRIEF_STAGES,
            DocumentType::Unknown => MINIMAL_STAGES,
        }
    }

    /// Judge-extraction strategy for a detected type
    pub fn judge_strategy_for(doc_type: DocumentType) -> JudgeStrategy {
        match doc_type {
            DocumentType::Opinion | DocumentType::Order => JudgeStrategy::ContentAndMetadata,
            DocumentType::Docket | DocumentType::Brief | DocumentType::Unknown => {
                JudgeStrategy::MetadataOnly
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dockets_never_get_citation_or_structure_stages() {
        let stages = StageSelector::stages_for(DocumentType::Docket);
        assert!(!stages.contains(&Stage::CitationExtraction));
        assert!(!stages.contains(&Stage::StructureAnalysis));
        assert!(stages.contains(&Stage::JudgeResolution));
        assert_eq!(
            StageSelector::judge_strategy_for(DocumentType::Docket),
            JudgeStrategy::MetadataOnly
        );
    }

    #[test]
    fn briefs_skip_judge_resolution() {
        let stages = StageSelector::stages_for(DocumentType::Brief);
        assert!(!stages.contains(&Stage::JudgeResolution));
        assert!(stages.contains(&Stage::CitationExtraction));
    }

    #[test]
    fn unknown_gets_the_minimal_set_not_the_opinion_set() {
        let stages = StageSelector::stages_for(DocumentType::Unknown);
        assert_eq!(stages, MINIMAL_STAGES);
        assert!(stages.len() < StageSelector::stages_for(DocumentType::Opinion).len());
        assert!(!stages.contains(&Stage::CitationExtraction));
    }

    #[test]
    fn court_resolution_precedes_judge_resolution() {
        for doc_type in [
            DocumentType::Opinion,
            DocumentType::Order,
            DocumentType::Docket,
        ] {
            let stages = StageSelector::stages_for(doc_type);
            let court = stages.iter().position(|s| *s == Stage::CourtResolution);
            let judge = stages.iter().position(|s| *s == Stage::JudgeResolution);
            assert!(court.unwrap() < judge.unwrap());
        }
    }
}
