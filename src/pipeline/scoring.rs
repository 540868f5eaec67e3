//! # Scoring Module
//!
//! ## Purpose
//! Computes the completeness and quality scores for an enriched document.
//!
//! Completeness is the fraction of type-applicable stages that succeeded:
//! a docket is never penalized for citations it was not expected to have.
//! Quality is a fixed type-aware weighted combination that values judge
//! and court resolution above citation volume; each weight table sums to
//! 100 and every signal contributes monotonically.

use crate::DocumentType;

/// Per-signal weights for one document type; sums to 100
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub court: f64,
    pub judge: f64,
    pub citations: f64,
    pub structure: f64,
    pub metadata: f64,
}

/// Signals measured from an enrichment record
#[derive(Debug, Clone, Default)]
pub struct QualitySignals {
    pub court_resolved: bool,
    /// Resolution confidence when a judge was found
    pub judge_confidence: Option<f64>,
    pub citation_count: usize,
    pub structure_count: usize,
    pub has_case_name: bool,
    pub has_date_filed: bool,
}

/// Citation count at which the citation signal saturates
const CITATION_SATURATION: f64 = 10.0;
/// Structural-element count at which the structure signal saturates
const STRUCTURE_SATURATION: f64 = 3.0;

/// Weight table for a detected document type
pub fn weights_for(doc_type: DocumentType) -> ScoreWeights {
    match doc_type {
        DocumentType::Opinion => ScoreWeights {
            court: 20.0,
            judge: 25.0,
            citations: 25.0,
            structure: 20.0,
            metadata: 10.0,
        },
        DocumentType::Order => ScoreWeights {
            court: 25.0,
            judge: 30.0,
            citations: 20.0,
            structure: 10.0,
            metadata: 15.0,
        },
        DocumentType::Docket => ScoreWeights {
            court: 30.0,
            judge: 40.0,
            citations: 0.0,
            structure: 0.0,
            metadata: 30.0,
        },
        DocumentType::Brief => ScoreWeights {
            court: 25.0,
            judge: 0.0,
            citations: 40.0,
            structure: 20.0,
            metadata: 15.0,
        },
        DocumentType::Unknown => ScoreWeights {
            court: 40.0,
            judge: 0.0,
            citations: 0.0,
            structure: 0.0,
            metadata: 60.0,
        },
    }
}

/// Fraction of selected stages that succeeded, as 0-100
pub fn completeness_score(succeeded_stages: usize, selected_stages: usize) -> f64 {
    if selected_stages == 0 {
        return 0.0;
    }
    succeeded_stages as f64 / selected_stages as f64 * 100.0
}

/// Type-aware weighted quality score, 0-100
pub fn quality_score(doc_type: DocumentType, signals: &QualitySignals) -> f64 {
    let weights = weights_for(doc_type);

    let court = if signals.court_resolved { 1.0 } else { 0.0 };
    let judge = signals.judge_confidence.unwrap_or(0.0).clamp(0.0, 1.0);
    let citations = (signals.citation_count as f64 / CITATION_SATURATION).min(1.0);
    let structure = (signals.structure_count as f64 / STRUCTURE_SATURATION).min(1.0);
    let metadata = (u8::from(signals.has_case_name) + u8::from(signals.has_date_filed)) as f64 / 2.0;

    weights.court * court
        + weights.judge * judge
        + weights.citations * citations
        + weights.structure * structure
        + weights.metadata * metadata
}
