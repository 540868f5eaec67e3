//! # Error Collection Module
//!
//! ## Purpose
//! Accumulates structured error and warning records keyed by pipeline
//! stage and by document, and produces aggregate run statistics.
//!
//! ## Input/Output Specification
//! - **Input**: Stage failures and warnings raised during a run
//! - **Output**: Read-only summary and detailed-report projections
//!
//! ## Key Features
//! - Purely additive during a run; projections have no side effects and
//!   are callable at any time
//! - No truncation of the underlying records within a run; a long batch is
//!   bounded by the caller's batch size, not by the collector
//! - Concurrency-safe appends from concurrently processed documents

use crate::pipeline::stages::Stage;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured error classification used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No stable identity could be derived; fatal for the document
    Identity,
    /// A court or judge resolution found nothing; expected and non-fatal
    ResolutionMiss,
    /// Citation or structural extraction failed; non-fatal
    ExtractionFailure,
    /// Enrichment succeeded but the record could not be persisted
    StorageHandoff,
    /// Anything else surfaced by a collaborator
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Identity => "identity",
            ErrorKind::ResolutionMiss => "resolution_miss",
            ErrorKind::ExtractionFailure => "extraction_failure",
            ErrorKind::StorageHandoff => "storage_handoff",
            ErrorKind::Internal => "internal",
        }
    }
}

/// One recorded error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: ErrorKind,
    pub stage: Option<Stage>,
    pub document_id: Option<String>,
    pub context: String,
}

/// One recorded warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningRecord {
    pub timestamp: DateTime<Utc>,
    pub stage: Option<Stage>,
    pub document_id: Option<String>,
    pub context: String,
}

/// Aggregate view over everything collected so far
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub errors_by_kind: BTreeMap<String, usize>,
    pub errors_by_stage: BTreeMap<String, usize>,
    /// The most error-prone document IDs with their error counts
    pub top_documents: Vec<(String, usize)>,
}

/// Full dump of the collected records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedReport {
    pub errors: Vec<ErrorRecord>,
    pub warnings: Vec<WarningRecord>,
}

/// Accumulates error and warning records for the duration of one run
pub struct ErrorCollector {
    errors: Mutex<Vec<ErrorRecord>>,
    warnings: Mutex<Vec<WarningRecord>>,
    top_documents: usize,
}

impl ErrorCollector {
    /// Create a collector reporting the default number of top documents
    pub fn new() -> Self {
        Self::with_top_documents(10)
    }

    /// Create a collector reporting up to `top_documents` error-prone IDs
    pub fn with_top_documents(top_documents: usize) -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
            warnings: Mutex::new(Vec::new()),
            top_documents,
        }
    }

    /// Record an error
    pub fn add_error(
        &self,
        kind: ErrorKind,
        stage: Option<Stage>,
        document_id: Option<&str>,
        context: impl Into<String>,
    ) {
        self.errors.lock().push(ErrorRecord {
            timestamp: Utc::now(),
            kind,
            stage,
            document_id: document_id.map(str::to_string),
            context: context.into(),
        });
    }

    /// Record a warning
    pub fn add_warning(
        &self,
        stage: Option<Stage>,
        document_id: Option<&str>,
        context: impl Into<String>,
    ) {
        self.warnings.lock().push(WarningRecord {
            timestamp: Utc::now(),
            stage,
            document_id: document_id.map(str::to_string),
            context: context.into(),
        });
    }

    /// Aggregate counts by kind and stage, plus the most error-prone documents
    pub fn summary(&self) -> CollectorSummary {
        let errors = self.errors.lock();
        let warnings = self.warnings.lock();

        let mut errors_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        let mut errors_by_stage: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_document: BTreeMap<String, usize> = BTreeMap::new();

        for record in errors.iter() {
            *errors_by_kind
                .entry(record.kind.as_str().to_string())
                .or_insert(0) += 1;
            if let Some(stage) = record.stage {
                *errors_by_stage
                    .entry(stage.as_str().to_string())
                    .or_insert(0) += 1;
            }
            if let Some(document_id) = &record.document_id {
                *by_document.entry(document_id.clone()).or_insert(0) += 1;
            }
        }

        let mut top_documents: Vec<(String, usize)> = by_document.into_iter().collect();
        top_documents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_documents.truncate(self.top_documents);

        CollectorSummary {
            total_errors: errors.len(),
            total_warnings: warnings.len(),
            errors_by_kind,
            errors_by_stage,
            top_documents,
        }
    }

    /// Clone out every collected record
    pub fn detailed_report(&self) -> DetailedReport {
        DetailedReport {
            errors: self.errors.lock().clone(),
            warnings: self.warnings.lock().clone(),
        }
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}
