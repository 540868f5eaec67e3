//! # Document Type Classification Module
//!
//! ## Purpose
//! Scores a raw document against fixed per-type profiles (opinion, order,
//! docket, brief) to decide which enrichment stages apply.
//!
//! ## Input/Output Specification
//! - **Input**: A raw document and its normalized content
//! - **Output**: Detected type, confidence 0.0-1.0, and measured
//!   characteristics (content length, citation count, section markers)
//!
//! ## Key Features
//! - Each profile criterion contributes a normalized partial score;
//!   a profile's total is the mean over the criteria it evaluates
//! - A weak internal signal defers to an explicit source-provided type
//!   hint at a fixed low confidence instead of guessing unknown
//! - Never fails; the worst case is `unknown` at confidence 0.0

use crate::citations::CitationPatterns;
use crate::errors::{EnrichError, Result};
use crate::structure::StructureAnalyzer;
use crate::{DocumentType, RawDocument};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Measured characteristics backing a classification decision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentCharacteristics {
    /// Content length in characters after normalization
    pub content_chars: usize,
    /// Citation-like substrings found in the content
    pub citation_count: usize,
    /// Section-marker labels found in the content
    pub section_markers: Vec<String>,
}

/// Result of classifying one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub detected_type: DocumentType,
    /// 0.0-1.0; at least the floor when a hint fallback was taken
    pub confidence: f64,
    pub characteristics: DocumentCharacteristics,
    /// Whether the source-provided hint decided the type
    pub hint_fallback: bool,
}

/// One scoring profile for a candidate document type
struct TypeProfile {
    doc_type: DocumentType,
    /// Content length at which the length criterion saturates
    min_content_chars: Option<usize>,
    /// Content length above which the brevity criterion decays (dockets)
    max_content_chars: Option<usize>,
    /// Content patterns; criterion score is the matched fraction
    content_patterns: Vec<Regex>,
    /// Whether section markers are expected (saturates at two markers)
    expects_markers: bool,
    /// Citation count at which the citation criterion saturates
    min_citations: Option<usize>,
    /// Whether docket-shaped metadata is expected instead of body text
    expects_metadata: bool,
}

/// Document-type classifier over the fixed profile table
pub struct DocumentTypeClassifier {
    confidence_floor: f64,
    profiles: Vec<TypeProfile>,
    citation_patterns: CitationPatterns,
    structure: StructureAnalyzer,
}

impl DocumentTypeClassifier {
    /// Create a classifier with the given hint-fallback confidence floor
    pub fn new(confidence_floor: f64) -> Result<Self> {
        Ok(Self {
            confidence_floor,
            profiles: build_profiles()?,
            citation_patterns: CitationPatterns::new()?,
            structure: StructureAnalyzer::new()?,
        })
    }

    /// Classify a document from its normalized content.
    ///
    /// Profiles are evaluated in a fixed order; the first highest score
    /// wins, so ties are deterministic.
    pub fn classify(&self, doc: &RawDocument, content: &str) -> Classification {
        let characteristics = DocumentCharacteristics {
            content_chars: content.chars().count(),
            citation_count: self.citation_patterns.count_matches(content),
            section_markers: self.structure.heading_labels(content),
        };

        let mut best_type = DocumentType::Unknown;
        let mut best_score = 0.0f64;
        for profile in &self.profiles {
            let score = score_profile(profile, doc, content, &characteristics);
            if score > best_score {
                best_score = score;
                best_type = profile.doc_type;
            }
        }

        if best_score >= self.confidence_floor {
            return Classification {
                detected_type: best_type,
                confidence: best_score.min(1.0),
                characteristics,
                hint_fallback: false,
            };
        }

        // Weak internal signal: an explicit upstream label beats guessing
        // unknown, at a fixed low confidence.
        if let Some(hinted) = doc
            .document_type_hint
            .as_deref()
            .and_then(DocumentType::from_hint)
        {
            return Classification {
                detected_type: hinted,
                confidence: self.confidence_floor,
                characteristics,
                hint_fallback: true,
            };
        }

        Classification {
            detected_type: DocumentType::Unknown,
            confidence: best_score,
            characteristics,
            hint_fallback: false,
        }
    }
}

fn score_profile(
    profile: &TypeProfile,
    doc: &RawDocument,
    content: &str,
    characteristics: &DocumentCharacteristics,
) -> f64 {
    let mut total = 0.0f64;
    let mut criteria = 0usize;

    if let Some(min_chars) = profile.min_content_chars {
        total += (characteristics.content_chars as f64 / min_chars as f64).min(1.0);
        criteria += 1;
    }

    if let Some(max_chars) = profile.max_content_chars {
        let len = characteristics.content_chars;
        total += if len <= max_chars {
            1.0
        } else {
            max_chars as f64 / len as f64
        };
        criteria += 1;
    }

    if !profile.content_patterns.is_empty() {
        let matched = profile
            .content_patterns
            .iter()
            .filter(|p| p.is_match(content))
            .count();
        total += matched as f64 / profile.content_patterns.len() as f64;
        criteria += 1;
    }

    if profile.expects_markers {
        total += (characteristics.section_markers.len() as f64 / 2.0).min(1.0);
        criteria += 1;
    }

    if let Some(min_citations) = profile.min_citations {
        total += (characteristics.citation_count as f64 / min_citations as f64).min(1.0);
        criteria += 1;
    }

    if profile.expects_metadata {
        let present = [
            doc.docket_number.as_deref().map_or(false, |d| !d.trim().is_empty()),
            doc.metadata.has_judge_field(),
            doc.metadata
                .nature_of_suit
                .as_deref()
                .map_or(false, |n| !n.trim().is_empty()),
        ]
        .iter()
        .filter(|&&p| p)
        .count();
        // A record with none of the docket-shaped fields is not a docket,
        // however short its body is.
        if present == 0 {
            return 0.0;
        }
        total += present as f64 / 3.0;
        criteria += 1;
    }

    if criteria == 0 {
        return 0.0;
    }
    total / criteria as f64
}

fn build_profiles() -> Result<Vec<TypeProfile>> {
    Ok(vec![
        TypeProfile {
            doc_type: DocumentType::Opinion,
            min_content_chars: Some(2000),
            max_content_chars: None,
            content_patterns: compile_all(&[
                r"(?i)\bOPINION\b|MEMORANDUM\s+(?:OPINION|DECISION)",
                r"(?i)DISTRICT\s+COURT|COURT\s+OF\s+APPEALS|SUPREME\s+COURT",
                r"(?i)\bJUDGE\b|\bJUSTICE\b",
            ])?,
            expects_markers: true,
            min_citations: Some(5),
            expects_metadata: false,
        },
        TypeProfile {
            doc_type: DocumentType::Order,
            min_content_chars: Some(200),
            max_content_chars: None,
            content_patterns: compile_all(&[
                r"(?i)\bORDER\b",
                r"(?i)IT\s+IS\s+(?:SO\s+|HEREBY\s+)?ORDERED",
                r"(?i)\bGRANTED\b|\bDENIED\b",
            ])?,
            expects_markers: false,
            min_citations: None,
            expects_metadata: false,
        },
        TypeProfile {
            doc_type: DocumentType::Docket,
            min_content_chars: None,
            max_content_chars: Some(1000),
            content_patterns: Vec::new(),
            expects_markers: false,
            min_citations: None,
            expects_metadata: true,
        },
        TypeProfile {
            doc_type: DocumentType::Brief,
            min_content_chars: Some(2000),
            max_content_chars: None,
            content_patterns: compile_all(&[
                r"(?i)\bBRIEF\b",
                r"(?i)TABLE\s+OF\s+AUTHORITIES",
                r"(?i)\bARGUMENT\b",
            ])?,
            expects_markers: false,
            min_citations: Some(3),
            expects_metadata: false,
        },
    ])
}

fn compile_all(sources: &[&str]) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source).map_err(|e| EnrichError::Pattern {
                pattern: source.to_string(),
                details: e.to_string(),
            })
        })
        .collect()
}
