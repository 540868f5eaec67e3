//! # Court-Case Enrichment Pipeline
//!
//! ## Overview
//! This library implements the document enrichment and deduplication pipeline
//! for court-case metadata and opinion text fetched from external legal-data
//! sources. Each raw document receives a stable content-addressed identity,
//! is checked against previously processed fingerprints, classified by
//! document type, and enriched by the type-appropriate stages (court
//! resolution, judge resolution, citation extraction, structural analysis,
//! keyword extraction) with per-stage failure isolation.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `identity`: Content fingerprinting for deduplication
//! - `classify`: Document-type classification against fixed profiles
//! - `court`: Court-hint resolution against the canonical court table
//! - `judge`: Priority-ordered multi-source judge resolution
//! - `citations`: Citation extraction and reporter normalization
//! - `structure`: Structural segmentation and keyword extraction
//! - `pipeline`: Orchestration, stage selection, deduplication, scoring
//! - `collector`: Per-stage error and warning accumulation
//! - `reference`: Static court/reporter/judge-initials lookup tables
//! - `source` / `storage`: External collaborator boundaries
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Raw fetched documents (opinions, orders, dockets, briefs)
//! - **Output**: Enrichment records handed to a storage sink, plus a run
//!   report with per-stage and per-type statistics
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use case_enrichment::{
//!     collector::ErrorCollector,
//!     config::Config,
//!     pipeline::EnrichmentPipeline,
//!     reference::ReferenceData,
//!     source::{BatchFilter, DocumentSource, JsonFileSource},
//!     storage::SledStorageSink,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let reference = Arc::new(ReferenceData::load(&config.reference)?);
//!     let sink = Arc::new(SledStorageSink::new(&config.storage)?);
//!     let collector = Arc::new(ErrorCollector::new());
//!     let pipeline = EnrichmentPipeline::new(
//!         config.pipeline.clone(),
//!         reference,
//!         sink,
//!         collector,
//!     )
//!     .await?;
//!
//!     let source = JsonFileSource::new("documents.json");
//!     let documents = source.fetch_batch(&BatchFilter::default()).await?;
//!     let report = pipeline.run_batch(documents).await?;
//!     println!("{} stored", report.stats.stored_new);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod citations;
pub mod classify;
pub mod collector;
pub mod config;
pub mod court;
pub mod errors;
pub mod identity;
pub mod judge;
pub mod pipeline;
pub mod reference;
pub mod source;
pub mod storage;
pub mod structure;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{EnrichError, Result};
pub use identity::ContentFingerprint;
pub use pipeline::{EnrichmentPipeline, EnrichmentRecord, RunReport};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document-type categories driving which enrichment stages are productive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Opinion,
    Order,
    Docket,
    Brief,
    Unknown,
}

impl DocumentType {
    /// Stable lowercase name used in reports and stage tables
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Opinion => "opinion",
            DocumentType::Order => "order",
            DocumentType::Docket => "docket",
            DocumentType::Brief => "brief",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Parse an untrusted source-provided type label
    pub fn from_hint(hint: &str) -> Option<DocumentType> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "opinion" | "opinions" | "lead opinion" => Some(DocumentType::Opinion),
            "order" | "orders" => Some(DocumentType::Order),
            "docket" | "dockets" | "docket entry" | "recap" => Some(DocumentType::Docket),
            "brief" | "briefs" => Some(DocumentType::Brief),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw document as fetched from the external source.
///
/// Immutable once fetched; owned by the ingestion collaborator and passed
/// by value into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Source-assigned identifier
    pub external_id: String,
    /// Raw court identifier, URL, or free-text court name
    #[serde(default)]
    pub court_hint: Option<String>,
    /// Case caption
    #[serde(default)]
    pub case_name: Option<String>,
    /// Docket number as reported by the source
    #[serde(default)]
    pub docket_number: Option<String>,
    /// Filing date
    #[serde(default)]
    pub date_filed: Option<NaiveDate>,
    /// Free text, possibly empty for body-less records
    #[serde(default)]
    pub content: String,
    /// Source-provided type label, untrusted
    #[serde(default)]
    pub document_type_hint: Option<String>,
    /// Known metadata fields plus preserved extras
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// Known metadata fields from the source's cluster/docket/search sub-objects.
///
/// Unknown extra fields are preserved in `extra` but not interpreted;
/// every field the pipeline reads is an explicit named member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Docket assigned-judge display string
    #[serde(default)]
    pub assigned_to_str: Option<String>,
    /// Docket assigned-judge alternate field
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Cluster judges field
    #[serde(default)]
    pub cluster_judges: Option<String>,
    /// Judge name from the search-result record
    #[serde(default)]
    pub search_judge: Option<String>,
    /// Opinion author string, typically only a surname
    #[serde(default)]
    pub author_str: Option<String>,
    /// Cluster panel member names
    #[serde(default)]
    pub panel_names: Vec<String>,
    /// Nature-of-suit code for docket records
    #[serde(default)]
    pub nature_of_suit: Option<String>,
    /// Fields the pipeline does not interpret, preserved verbatim
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Whether any judge-bearing metadata field is populated
    pub fn has_judge_field(&self) -> bool {
        [
            &self.assigned_to_str,
            &self.assigned_to,
            &self.cluster_judges,
            &self.search_judge,
            &self.author_str,
        ]
        .iter()
        .any(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
            || self.panel_names.iter().any(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hint_parsing() {
        assert_eq!(DocumentType::from_hint("Opinion"), Some(DocumentType::Opinion));
        assert_eq!(DocumentType::from_hint(" docket "), Some(DocumentType::Docket));
        assert_eq!(DocumentType::from_hint("press release"), None);
    }

    #[test]
    fn metadata_judge_field_detection() {
        let mut metadata = DocumentMetadata::default();
        assert!(!metadata.has_judge_field());
        metadata.assigned_to_str = Some("  ".to_string());
        assert!(!metadata.has_judge_field());
        metadata.cluster_judges = Some("Gilstrap".to_string());
        assert!(metadata.has_judge_field());
    }
}
