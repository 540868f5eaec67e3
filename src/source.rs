//! # Document Source Module
//!
//! ## Purpose
//! The consumed collaborator boundary supplying raw documents one batch at
//! a time. Pagination, retries, backoff, and rate limiting all belong to
//! the implementations behind this trait, never to the enrichment core.
//!
//! ## Input/Output Specification
//! - **Input**: A batch filter (court, date range, limit)
//! - **Output**: A batch of `RawDocument` values
//!
//! `JsonFileSource` is the one adapter shipped with the crate: it reads a
//! JSON array of raw documents from disk for the CLI and for tests.

use crate::errors::{EnrichError, Result};
use crate::RawDocument;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filter describing which documents a batch should contain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFilter {
    /// Restrict to documents whose court hint matches this canonical ID
    pub court: Option<String>,
    /// Earliest filing date, inclusive
    pub date_min: Option<NaiveDate>,
    /// Latest filing date, inclusive
    pub date_max: Option<NaiveDate>,
    /// Maximum number of documents to return
    pub limit: Option<usize>,
}

/// A source of raw documents
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short source name for logs and reports
    fn name(&self) -> &str;

    /// Fetch one batch of documents matching the filter
    async fn fetch_batch(&self, filter: &BatchFilter) -> Result<Vec<RawDocument>>;
}

/// File-backed document source reading a JSON array of raw documents
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DocumentSource for JsonFileSource {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn fetch_batch(&self, filter: &BatchFilter) -> Result<Vec<RawDocument>> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| EnrichError::Source {
                    origin: "json_file".to_string(),
                    details: format!("failed to read {:?}: {}", self.path, e),
                })?;

        let documents: Vec<RawDocument> =
            serde_json::from_str(&content).map_err(|e| EnrichError::Source {
                origin: "json_file".to_string(),
                details: format!("failed to parse {:?}: {}", self.path, e),
            })?;

        let mut filtered: Vec<RawDocument> = documents
            .into_iter()
            .filter(|doc| {
                filter.court.as_deref().map_or(true, |court| {
                    doc.court_hint
                        .as_deref()
                        .map_or(false, |hint| hint.eq_ignore_ascii_case(court))
                })
            })
            .filter(|doc| match (filter.date_min, doc.date_filed) {
                (Some(min), Some(filed)) => filed >= min,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|doc| match (filter.date_max, doc.date_filed) {
                (Some(max), Some(filed)) => filed <= max,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();

        if let Some(limit) = filter.limit {
            filtered.truncate(limit);
        }

        tracing::debug!(
            "Fetched {} documents from {:?}",
            filtered.len(),
            self.path
        );
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(documents: &serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(documents.to_string().as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_and_filters_documents() {
        let fixture = write_fixture(&serde_json::json!([
            {
                "external_id": "cl-1",
                "court_hint": "txed",
                "content": "first",
                "date_filed": "2021-03-01"
            },
            {
                "external_id": "cl-2",
                "court_hint": "ca9",
                "content": "second",
                "date_filed": "2020-01-15"
            }
        ]));

        let source = JsonFileSource::new(fixture.path());

        let all = source.fetch_batch(&BatchFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = source
            .fetch_batch(&BatchFilter {
                court: Some("txed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].external_id, "cl-1");

        let limited = source
            .fetch_batch(&BatchFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let source = JsonFileSource::new("/nonexistent/documents.json");
        let err = source.fetch_batch(&BatchFilter::default()).await.unwrap_err();
        assert_eq!(err.category(), "source");
    }
}
