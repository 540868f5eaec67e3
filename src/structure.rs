//! # Document Structure Module
//!
//! ## Purpose
//! Structural segmentation of opinion-like prose: standalone section
//! headings, paragraph counts, and caption detection. Also hosts the
//! keyword extractor, which doubles as the basic-extraction stage for
//! documents of unknown type.
//!
//! ## Input/Output Specification
//! - **Input**: Normalized document text (line structure preserved)
//! - **Output**: Ordered structural elements, paragraph count, keywords
//!
//! Analysis never fails; text without recognizable structure yields an
//! empty element list.

use crate::errors::{EnrichError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Section headings recognized in court documents
const SECTION_MARKERS: &[&str] = &[
    "INTRODUCTION",
    "BACKGROUND",
    "PROCEDURAL HISTORY",
    "STATEMENT OF FACTS",
    "LEGAL STANDARD",
    "DISCUSSION",
    "ANALYSIS",
    "CONCLUSION",
    "ORDER",
];

/// Kind of structural element found in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    SectionHeading,
    Caption,
}

/// One structural element with its location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralElement {
    pub kind: StructuralKind,
    /// Normalized label, e.g. `DISCUSSION`
    pub label: String,
    /// Byte offset of the element in the analyzed text
    pub position: usize,
}

/// Aggregate structural analysis of one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralAnalysis {
    pub elements: Vec<StructuralElement>,
    pub paragraph_count: usize,
}

/// Structural analyzer with compiled heading and caption patterns
pub struct StructureAnalyzer {
    heading_pattern: Regex,
    caption_pattern: Regex,
}

impl StructureAnalyzer {
    /// Compile the structural pattern table
    pub fn new() -> Result<Self> {
        let markers = SECTION_MARKERS.join("|");
        // Headings stand on their own line, optionally numbered (II. DISCUSSION)
        let heading_source = format!(r"(?m)^\s*(?:[IVXL]+\.\s*)?({})\s*$", markers);
        let heading_pattern = compile(&heading_source)?;
        // Case captions: "Smith v. Jones"
        let caption_pattern =
            compile(r"(?m)^.{0,80}\s[vV]\.\s.{0,80}$")?;

        Ok(Self {
            heading_pattern,
            caption_pattern,
        })
    }

    /// Analyze text for section headings, captions, and paragraph shape
    pub fn analyze(&self, text: &str) -> StructuralAnalysis {
        let mut elements = Vec::new();

        for captures in self.heading_pattern.captures_iter(text) {
            if let (Some(full), Some(label)) = (captures.get(0), captures.get(1)) {
                elements.push(StructuralElement {
                    kind: StructuralKind::SectionHeading,
                    label: label.as_str().to_string(),
                    position: full.start(),
                });
            }
        }

        if let Some(caption) = self.caption_pattern.find(text) {
            elements.push(StructuralElement {
                kind: StructuralKind::Caption,
                label: crate::utils::collapse_whitespace(caption.as_str()),
                position: caption.start(),
            });
        }

        elements.sort_by_key(|e| e.position);

        let paragraph_count = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();

        StructuralAnalysis {
            elements,
            paragraph_count,
        }
    }

    /// Section-heading labels found in text, used by the classifier
    pub fn heading_labels(&self, text: &str) -> Vec<String> {
        let mut labels: Vec<String> = self
            .heading_pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
        labels.dedup();
        labels
    }
}

fn compile(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| EnrichError::Pattern {
        pattern: source.to_string(),
        details: e.to_string(),
    })
}

/// Frequency-based keyword extraction seeded with a legal-term vocabulary
pub struct KeywordExtractor {
    word_pattern: Regex,
    legal_terms: HashSet<&'static str>,
    stopwords: HashSet<&'static str>,
}

impl KeywordExtractor {
    /// Create the extractor with its built-in vocabularies
    pub fn new() -> Result<Self> {
        let legal_terms = [
            "motion", "petition", "complaint", "discovery", "deposition",
            "jurisdiction", "venue", "standing", "injunction", "damages",
            "negligence", "liability", "infringement", "indictment",
            "sentence", "probation", "warrant", "hearsay", "testimony",
            "contract", "breach", "easement", "foreclosure", "patent",
            "trademark", "copyright", "summary", "judgment", "remand",
            "certiorari", "habeas", "arbitration", "settlement",
        ]
        .into_iter()
        .collect();

        let stopwords = [
            "that", "this", "with", "from", "have", "been", "were", "their",
            "which", "shall", "would", "could", "there", "these", "those",
            "other", "under", "upon", "such", "between", "because", "court",
            "case", "states", "united", "district", "before", "after",
        ]
        .into_iter()
        .collect();

        Ok(Self {
            word_pattern: compile(r"[A-Za-z][A-Za-z'-]{3,}")?,
            legal_terms,
            stopwords,
        })
    }

    /// Extract up to `max_keywords` keywords ordered by weighted frequency.
    ///
    /// Legal-vocabulary terms are weighted above ordinary words; ties break
    /// alphabetically so results are deterministic.
    pub fn extract(&self, text: &str, max_keywords: usize) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for m in self.word_pattern.find_iter(text) {
            let word = m.as_str().to_ascii_lowercase();
            if self.stopwords.contains(word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }

        let mut scored: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(word, count)| {
                let weight = if self.legal_terms.contains(word.as_str()) {
                    count * 3
                } else {
                    count
                };
                (word, weight)
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(max_keywords);
        scored.into_iter().map(|(word, _)| word).collect()
    }
}
