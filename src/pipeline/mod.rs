//! # Enrichment Pipeline
//!
//! ## Purpose
//! Orchestrates the complete enrichment workflow per document: fingerprint,
//! deduplicate, classify, select stages, run each selected stage with
//! per-stage failure capture, score, and hand off to storage.
//!
//! ## Input/Output Specification
//! - **Input**: Batches of raw documents from a `DocumentSource`
//! - **Output**: One `EnrichmentRecord` per fresh document handed to the
//!   `StorageSink`, plus a `RunReport` with run statistics and the error
//!   summary
//! - **Workflow**: Fingerprint → Deduplicate → Classify → Select → Enrich →
//!   Score → Hand off
//!
//! ## Key Features
//! - A stage failure is recorded and lowers the completeness score; it
//!   never interrupts sibling stages or other documents
//! - Only identity and storage-handoff failures terminate a document
//! - Documents within a batch are processed concurrently; the only shared
//!   mutable state is the deduplication index and the error collector
//! - Cancellation is honored at per-document granularity

pub mod dedup;
pub mod scoring;
pub mod stages;

pub use dedup::{DedupDecision, DeduplicationManager};
pub use stages::{JudgeStrategy, Stage, StageSelector};

use crate::citations::{Citation, CitationExtractor};
use crate::classify::{Classification, DocumentCharacteristics, DocumentTypeClassifier};
use crate::collector::{CollectorSummary, ErrorCollector, ErrorKind};
use crate::config::PipelineConfig;
use crate::court::{CourtResolution, CourtResolver};
use crate::errors::Result;
use crate::identity::{self, ContentFingerprint};
use crate::judge::{JudgeCandidates, JudgeResolution, JudgeResolver};
use crate::reference::ReferenceData;
use crate::storage::{StorageOutcome, StorageSink};
use crate::structure::{KeywordExtractor, StructuralAnalysis, StructureAnalyzer};
use crate::utils::normalize_content;
use crate::{DocumentType, RawDocument};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Success or failure of one executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed(String),
}

/// Executed stage with its status, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
}

/// The per-document aggregate enrichment result.
///
/// Created once per document per run and never mutated afterwards; a
/// re-run produces a new record, and the storage sink decides upsert vs
/// skip from the fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub record_id: Uuid,
    pub external_id: String,
    pub fingerprint: ContentFingerprint,
    pub case_name: Option<String>,
    pub docket_number: Option<String>,
    pub date_filed: Option<chrono::NaiveDate>,
    pub detected_type: DocumentType,
    pub type_confidence: f64,
    pub characteristics: DocumentCharacteristics,
    /// Present when the court stage ran, resolved or not
    pub court: Option<CourtResolution>,
    /// Present when the judge stage ran and found a judge
    pub judge: Option<JudgeResolution>,
    pub citations: Vec<Citation>,
    pub structure: StructuralAnalysis,
    pub keywords: Vec<String>,
    pub stage_outcomes: Vec<StageOutcome>,
    /// Fraction of type-applicable stages that succeeded, 0-100
    pub completeness_score: f64,
    /// Type-aware weighted signal strength, 0-100
    pub quality_score: f64,
    pub enriched_at: DateTime<Utc>,
}

impl EnrichmentRecord {
    /// Empty record carrying only an external ID, for sink tests and seeds
    pub fn placeholder(external_id: &str) -> Self {
        Self {
            record_id: Uuid::nil(),
            external_id: external_id.to_string(),
            fingerprint: ContentFingerprint::from_stored(String::new()),
            case_name: None,
            docket_number: None,
            date_filed: None,
            detected_type: DocumentType::Unknown,
            type_confidence: 0.0,
            characteristics: DocumentCharacteristics::default(),
            court: None,
            judge: None,
            citations: Vec::new(),
            structure: StructuralAnalysis::default(),
            keywords: Vec::new(),
            stage_outcomes: Vec::new(),
            completeness_score: 0.0,
            quality_score: 0.0,
            enriched_at: Utc::now(),
        }
    }
}

/// Statistics for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_documents: usize,
    /// Records the sink reported as newly inserted
    pub stored_new: usize,
    /// Records the sink reported as updated re-filings
    pub stored_updated: usize,
    /// Records the sink reported as unchanged
    pub stored_unchanged: usize,
    /// Documents skipped by the deduplication index
    pub duplicates_skipped: usize,
    /// Documents that failed fingerprinting
    pub failed_identity: usize,
    /// Documents that enriched but could not be persisted
    pub failed_storage: usize,
    /// Documents skipped by cancellation
    pub cancelled: usize,
    /// Stored documents by detected type
    pub by_type: BTreeMap<String, usize>,
    /// Documents per second over the run
    pub processing_rate: f64,
}

/// End-of-run report: statistics plus the error summary.
///
/// Partial success is the expected common case, so the report is always a
/// breakdown, never a bare success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub stats: RunStats,
    pub error_summary: CollectorSummary,
}

/// Outcome of processing one document
enum DocumentOutcome {
    Stored {
        outcome: StorageOutcome,
        doc_type: DocumentType,
    },
    Duplicate,
    FailedIdentity,
    FailedStorage,
    Cancelled,
}

/// Intermediate stage results gathered while enriching one document
#[derive(Default)]
struct StageResults {
    court: Option<CourtResolution>,
    judge: Option<JudgeResolution>,
    citations: Vec<Citation>,
    structure: StructuralAnalysis,
    keywords: Vec<String>,
    outcomes: Vec<StageOutcome>,
}

/// Main enrichment pipeline
pub struct EnrichmentPipeline {
    config: PipelineConfig,
    classifier: DocumentTypeClassifier,
    court_resolver: CourtResolver,
    judge_resolver: JudgeResolver,
    citation_extractor: CitationExtractor,
    structure_analyzer: StructureAnalyzer,
    keyword_extractor: KeywordExtractor,
    dedup: DeduplicationManager,
    collector: Arc<ErrorCollector>,
    sink: Arc<dyn StorageSink>,
    cancelled: Arc<AtomicBool>,
}

impl EnrichmentPipeline {
    /// Create a pipeline over the loaded reference tables.
    ///
    /// The deduplication index is populated from the sink's existing
    /// fingerprints here, before any document is processed.
    pub async fn new(
        config: PipelineConfig,
        reference: Arc<ReferenceData>,
        sink: Arc<dyn StorageSink>,
        collector: Arc<ErrorCollector>,
    ) -> Result<Self> {
        let classifier = DocumentTypeClassifier::new(config.classifier_confidence_floor)?;
        let court_resolver = CourtResolver::new(Arc::clone(&reference));
        let judge_resolver = JudgeResolver::new(Arc::clone(&reference))?;
        let citation_extractor = CitationExtractor::new(Arc::clone(&reference))?;
        let structure_analyzer = StructureAnalyzer::new()?;
        let keyword_extractor = KeywordExtractor::new()?;
        let dedup = DeduplicationManager::load(sink.as_ref()).await;

        Ok(Self {
            config,
            classifier,
            court_resolver,
            judge_resolver,
            citation_extractor,
            structure_analyzer,
            keyword_extractor,
            dedup,
            collector,
            sink,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between documents; setting it stops the batch at
    /// per-document granularity
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Process one batch of documents, concurrently up to the configured
    /// limit, and produce the run report
    pub async fn run_batch(&self, documents: Vec<RawDocument>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total_documents = documents.len();
        tracing::info!(
            "Starting enrichment run {} with {} documents",
            run_id,
            total_documents
        );

        let concurrency = self.config.max_concurrent_documents.max(1);
        let outcomes: Vec<DocumentOutcome> = stream::iter(documents)
            .map(|doc| self.process_document(doc))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let finished_at = Utc::now();
        let mut stats = RunStats {
            run_id,
            started_at,
            finished_at,
            total_documents,
            stored_new: 0,
            stored_updated: 0,
            stored_unchanged: 0,
            duplicates_skipped: 0,
            failed_identity: 0,
            failed_storage: 0,
            cancelled: 0,
            by_type: BTreeMap::new(),
            processing_rate: 0.0,
        };

        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Stored { outcome, doc_type } => {
                    match outcome {
                        StorageOutcome::Inserted => stats.stored_new += 1,
                        StorageOutcome::Updated => stats.stored_updated += 1,
                        StorageOutcome::SkippedUnchanged => stats.stored_unchanged += 1,
                    }
                    *stats.by_type.entry(doc_type.as_str().to_string()).or_insert(0) += 1;
                }
                DocumentOutcome::Duplicate => stats.duplicates_skipped += 1,
                DocumentOutcome::FailedIdentity => stats.failed_identity += 1,
                DocumentOutcome::FailedStorage => stats.failed_storage += 1,
                DocumentOutcome::Cancelled => stats.cancelled += 1,
            }
        }

        let elapsed = (finished_at - started_at).num_milliseconds().max(1) as f64 / 1000.0;
        stats.processing_rate = total_documents as f64 / elapsed;

        tracing::info!(
            "Run {} completed: {} inserted, {} updated, {} unchanged, {} duplicates, \
             {} failed in {:.2}s",
            run_id,
            stats.stored_new,
            stats.stored_updated,
            stats.stored_unchanged,
            stats.duplicates_skipped,
            stats.failed_identity + stats.failed_storage,
            elapsed
        );

        Ok(RunReport {
            stats,
            error_summary: self.collector.summary(),
        })
    }

    /// Process a single document through the complete pipeline
    async fn process_document(&self, doc: RawDocument) -> DocumentOutcome {
        if self.cancelled.load(Ordering::Relaxed) {
            return DocumentOutcome::Cancelled;
        }

        let fingerprint = match identity::fingerprint(&doc) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                self.collector.add_error(
                    ErrorKind::Identity,
                    None,
                    Some(&doc.external_id),
                    e.to_string(),
                );
                return DocumentOutcome::FailedIdentity;
            }
        };

        if self.dedup.check_and_claim(&fingerprint) == DedupDecision::Duplicate {
            tracing::debug!("Skipping duplicate document {}", doc.external_id);
            return DocumentOutcome::Duplicate;
        }

        let content = normalize_content(&doc.content);
        let classification = self.classifier.classify(&doc, &content);
        if classification.detected_type == DocumentType::Unknown {
            self.collector.add_warning(
                None,
                Some(&doc.external_id),
                format!(
                    "ambiguous document type (confidence {:.2})",
                    classification.confidence
                ),
            );
        }

        let selected = StageSelector::stages_for(classification.detected_type);
        let results = self.run_stages(&doc, &content, &classification, selected);

        let succeeded = results
            .outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Succeeded)
            .count();
        let completeness_score = scoring::completeness_score(succeeded, selected.len());
        let quality_score = scoring::quality_score(
            classification.detected_type,
            &scoring::QualitySignals {
                court_resolved: results.court.as_ref().map_or(false, |c| c.resolved),
                judge_confidence: results.judge.as_ref().map(|j| j.confidence),
                citation_count: results.citations.len(),
                structure_count: results.structure.elements.len(),
                has_case_name: doc
                    .case_name
                    .as_deref()
                    .map_or(false, |name| !name.trim().is_empty()),
                has_date_filed: doc.date_filed.is_some(),
            },
        );

        let record = EnrichmentRecord {
            record_id: Uuid::new_v4(),
            external_id: doc.external_id.clone(),
            fingerprint: fingerprint.clone(),
            case_name: doc.case_name.clone(),
            docket_number: doc.docket_number.clone(),
            date_filed: doc.date_filed,
            detected_type: classification.detected_type,
            type_confidence: classification.confidence,
            characteristics: classification.characteristics,
            court: results.court,
            judge: results.judge,
            citations: results.citations,
            structure: results.structure,
            keywords: results.keywords,
            stage_outcomes: results.outcomes,
            completeness_score,
            quality_score,
            enriched_at: Utc::now(),
        };

        match self.sink.store(&record).await {
            Ok(outcome) => {
                // A claim becomes permanent only once the record is stored
                self.dedup.mark_processed(&fingerprint);
                DocumentOutcome::Stored {
                    outcome,
                    doc_type: record.detected_type,
                }
            }
            Err(e) => {
                self.dedup.release(&fingerprint);
                self.collector.add_error(
                    ErrorKind::StorageHandoff,
                    None,
                    Some(&doc.external_id),
                    e.to_string(),
                );
                DocumentOutcome::FailedStorage
            }
        }
    }

    /// Execute the selected stages in order, capturing each failure without
    /// interrupting the remaining stages
    fn run_stages(
        &self,
        doc: &RawDocument,
        content: &str,
        classification: &Classification,
        selected: &[Stage],
    ) -> StageResults {
        let mut results = StageResults::default();
        let document_id = doc.external_id.as_str();

        for stage in selected {
            let status = match stage {
                Stage::CourtResolution => {
                    let resolution = self
                        .court_resolver
                        .resolve(doc.court_hint.as_deref().unwrap_or(""));
                    let status = if resolution.resolved {
                        StageStatus::Succeeded
                    } else {
                        self.collector.add_error(
                            ErrorKind::ResolutionMiss,
                            Some(Stage::CourtResolution),
                            Some(document_id),
                            format!(
                                "court hint {:?} matched nothing",
                                doc.court_hint.as_deref().unwrap_or("")
                            ),
                        );
                        StageStatus::Failed("court hint unmatched".to_string())
                    };
                    results.court = Some(resolution);
                    status
                }
                Stage::JudgeResolution => {
                    let strategy =
                        StageSelector::judge_strategy_for(classification.detected_type);
                    let mut candidates = JudgeCandidates::from_document(doc);
                    if strategy == JudgeStrategy::ContentAndMetadata
                        && candidates.opinion_author_str.is_none()
                    {
                        candidates.opinion_author_str =
                            self.judge_resolver.author_from_content(content);
                    }
                    let court_id = results
                        .court
                        .as_ref()
                        .and_then(|c| c.court_id.as_deref());
                    match self.judge_resolver.resolve(&candidates, court_id) {
                        Some(resolution) => {
                            results.judge = Some(resolution);
                            StageStatus::Succeeded
                        }
                        None => {
                            self.collector.add_error(
                                ErrorKind::ResolutionMiss,
                                Some(Stage::JudgeResolution),
                                Some(document_id),
                                "no judge candidates in any field",
                            );
                            StageStatus::Failed("no judge candidates".to_string())
                        }
                    }
                }
                Stage::CitationExtraction => {
                    if content.is_empty() {
                        self.collector.add_error(
                            ErrorKind::ExtractionFailure,
                            Some(Stage::CitationExtraction),
                            Some(document_id),
                            "no content to extract citations from",
                        );
                        StageStatus::Failed("empty content".to_string())
                    } else {
                        results.citations = self.citation_extractor.extract(content);
                        StageStatus::Succeeded
                    }
                }
                Stage::StructureAnalysis => {
                    if content.is_empty() {
                        self.collector.add_error(
                            ErrorKind::ExtractionFailure,
                            Some(Stage::StructureAnalysis),
                            Some(document_id),
                            "no content to analyze",
                        );
                        StageStatus::Failed("empty content".to_string())
                    } else {
                        results.structure = self.structure_analyzer.analyze(content);
                        StageStatus::Succeeded
                    }
                }
                Stage::KeywordExtraction => {
                    results.keywords = self
                        .keyword_extractor
                        .extract(content, self.config.max_keywords);
                    StageStatus::Succeeded
                }
            };

            results.outcomes.push(StageOutcome {
                stage: *stage,
                status,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ErrorCollector;
    use crate::config::PipelineConfig;
    use crate::judge::JudgeSource;
    use crate::reference::fixtures::reference;
    use crate::storage::{MemoryStorageSink, StorageOutcome, StorageSink};
    use crate::{DocumentMetadata, RawDocument};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn make_pipeline(
        sink: Arc<dyn StorageSink>,
    ) -> (EnrichmentPipeline, Arc<ErrorCollector>) {
        let collector = Arc::new(ErrorCollector::new());
        let pipeline = EnrichmentPipeline::new(
            PipelineConfig::default(),
            Arc::new(reference()),
            sink,
            Arc::clone(&collector),
        )
        .await
        .unwrap();
        (pipeline, collector)
    }

    fn opinion_doc(external_id: &str) -> RawDocument {
        RawDocument {
            external_id: external_id.to_string(),
            court_hint: Some("txed".to_string()),
            case_name: Some("Smith v. Jones".to_string()),
            docket_number: Some("2:21-cv-00316-JRG".to_string()),
            date_filed: chrono::NaiveDate::from_ymd_opt(2021, 3, 1),
            content: format!(
                "UNITED STATES DISTRICT COURT\n\nMEMORANDUM OPINION\n\nJUDGE Gilstrap \
                 presiding.\n\nDISCUSSION\n\n{}See 410 U.S. 113 (1973); 123 F.3d 456 \
                 (9th Cir. 1997); 950 F. Supp. 2d 1120 (N.D. Cal. 2013); 800 F.2d 10; \
                 510 U.S. 200 (1994).\n\nCONCLUSION\n\nThe motion is granted.",
                "The governing standard controls this dispute. ".repeat(60)
            ),
            document_type_hint: Some("opinion".to_string()),
            metadata: DocumentMetadata {
                assigned_to_str: Some("Judge Rodney Gilstrap".to_string()),
                ..Default::default()
            },
        }
    }

    fn docket_doc(external_id: &str) -> RawDocument {
        RawDocument {
            external_id: external_id.to_string(),
            court_hint: Some("txed".to_string()),
            case_name: Some("Acme v. Widget".to_string()),
            docket_number: Some("2:21-cv-00316-JRG".to_string()),
            date_filed: chrono::NaiveDate::from_ymd_opt(2021, 3, 1),
            content: String::new(),
            document_type_hint: Some("docket".to_string()),
            metadata: DocumentMetadata {
                nature_of_suit: Some("830 Patent".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn duplicate_in_one_batch_stores_exactly_once() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;

        let report = pipeline
            .run_batch(vec![opinion_doc("cl-1"), opinion_doc("cl-1")])
            .await
            .unwrap();

        assert_eq!(sink.record_count(), 1);
        assert_eq!(report.stats.stored_new, 1);
        assert_eq!(report.stats.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn dedup_index_loads_from_prior_runs() {
        let sink = Arc::new(MemoryStorageSink::new());
        {
            let (pipeline, _collector) = make_pipeline(sink.clone()).await;
            pipeline.run_batch(vec![opinion_doc("cl-1")]).await.unwrap();
        }

        let (pipeline, _collector) = make_pipeline(sink.clone()).await;
        let report = pipeline.run_batch(vec![opinion_doc("cl-1")]).await.unwrap();
        assert_eq!(report.stats.duplicates_skipped, 1);
        assert_eq!(report.stats.stored_new, 0);
        assert_eq!(sink.record_count(), 1);
    }

    #[tokio::test]
    async fn dockets_never_run_citation_extraction() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;

        let mut doc = docket_doc("cl-docket");
        // A citation-like string hiding in uninterpreted metadata must not
        // surface as a citation count
        doc.metadata.extra.insert(
            "description".to_string(),
            serde_json::json!("cites 410 U.S. 113 (1973)"),
        );

        pipeline.run_batch(vec![doc]).await.unwrap();

        let record = sink.get("cl-docket").unwrap();
        assert_eq!(record.detected_type, DocumentType::Docket);
        assert!(record.citations.is_empty());
        assert!(record
            .stage_outcomes
            .iter()
            .all(|o| o.stage != Stage::CitationExtraction));
        assert!(record
            .stage_outcomes
            .iter()
            .all(|o| o.stage != Stage::StructureAnalysis));
    }

    #[tokio::test]
    async fn docket_suffix_resolves_judge_for_known_court() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;

        pipeline
            .run_batch(vec![docket_doc("cl-docket")])
            .await
            .unwrap();

        let record = sink.get("cl-docket").unwrap();
        let judge = record.judge.expect("judge resolved from docket suffix");
        assert_eq!(judge.name, "Rodney Gilstrap");
        assert_eq!(judge.source, JudgeSource::DocketPattern);
        assert!((judge.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn stage_failures_do_not_stop_sibling_stages_or_other_documents() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, collector) = make_pipeline(sink.clone()).await;

        let mut broken_court = opinion_doc("cl-broken");
        broken_court.court_hint = Some("Intergalactic Tribunal".to_string());
        let healthy = opinion_doc("cl-healthy");

        let report = pipeline
            .run_batch(vec![broken_court, healthy])
            .await
            .unwrap();

        assert_eq!(report.stats.stored_new, 2);

        let record = sink.get("cl-broken").unwrap();
        let court_outcome = record
            .stage_outcomes
            .iter()
            .find(|o| o.stage == Stage::CourtResolution)
            .unwrap();
        assert!(matches!(court_outcome.status, StageStatus::Failed(_)));
        assert!(record.judge.is_some());
        assert!(!record.citations.is_empty());
        assert!(record.completeness_score < 100.0);

        let healthy_record = sink.get("cl-healthy").unwrap();
        assert_eq!(healthy_record.completeness_score, 100.0);
        assert!(collector.summary().errors_by_stage["court_resolution"] >= 1);
    }

    #[tokio::test]
    async fn unresolved_court_is_reported_without_a_guessed_id() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;

        let mut doc = opinion_doc("cl-nohint");
        doc.court_hint = None;
        pipeline.run_batch(vec![doc]).await.unwrap();

        let record = sink.get("cl-nohint").unwrap();
        let court = record.court.unwrap();
        assert!(!court.resolved);
        assert!(court.court_id.is_none());
    }

    #[tokio::test]
    async fn identity_failure_is_fatal_for_that_document_only() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, collector) = make_pipeline(sink.clone()).await;

        let unidentifiable = RawDocument {
            external_id: String::new(),
            court_hint: None,
            case_name: None,
            docket_number: None,
            date_filed: None,
            content: String::new(),
            document_type_hint: None,
            metadata: DocumentMetadata::default(),
        };

        let report = pipeline
            .run_batch(vec![unidentifiable, opinion_doc("cl-good")])
            .await
            .unwrap();

        assert_eq!(report.stats.failed_identity, 1);
        assert_eq!(report.stats.stored_new, 1);
        assert_eq!(collector.summary().errors_by_kind["identity"], 1);
        assert_eq!(sink.record_count(), 1);
    }

    struct FailingSink {
        inner: MemoryStorageSink,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl StorageSink for FailingSink {
        async fn existing_fingerprints(
            &self,
        ) -> crate::errors::Result<Vec<crate::identity::ContentFingerprint>> {
            self.inner.existing_fingerprints().await
        }

        async fn store(
            &self,
            record: &EnrichmentRecord,
        ) -> crate::errors::Result<StorageOutcome> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(crate::errors::EnrichError::StorageHandoff {
                    document: record.external_id.clone(),
                    details: "sink unavailable".to_string(),
                });
            }
            self.inner.store(record).await
        }
    }

    #[tokio::test]
    async fn storage_failure_releases_the_dedup_claim() {
        let sink = Arc::new(FailingSink {
            inner: MemoryStorageSink::new(),
            fail_next: AtomicBool::new(true),
        });
        let (pipeline, collector) = make_pipeline(sink.clone()).await;

        let report = pipeline.run_batch(vec![opinion_doc("cl-1")]).await.unwrap();
        assert_eq!(report.stats.failed_storage, 1);
        assert_eq!(collector.summary().errors_by_kind["storage_handoff"], 1);

        // The claim was released, so a retry in the same process stores it
        let retry = pipeline.run_batch(vec![opinion_doc("cl-1")]).await.unwrap();
        assert_eq!(retry.stats.stored_new, 1);
        assert_eq!(retry.stats.duplicates_skipped, 0);
    }

    #[tokio::test]
    async fn cancellation_is_honored_between_documents() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;

        pipeline.cancel_handle().store(true, Ordering::Relaxed);
        let report = pipeline
            .run_batch(vec![opinion_doc("cl-1"), opinion_doc("cl-2")])
            .await
            .unwrap();

        assert_eq!(report.stats.cancelled, 2);
        assert_eq!(sink.record_count(), 0);
    }

    #[tokio::test]
    async fn changed_content_reaches_the_sink_as_an_update() {
        let sink = Arc::new(MemoryStorageSink::new());
        let (pipeline, _collector) = make_pipeline(sink.clone()).await;
        pipeline.run_batch(vec![opinion_doc("cl-1")]).await.unwrap();

        // A corrected re-filing changes the content prefix, so it carries a
        // new fingerprint and is not a duplicate
        let mut refiled = opinion_doc("cl-1");
        refiled.content = format!("CORRECTED\n\n{}", refiled.content);
        let report = pipeline.run_batch(vec![refiled]).await.unwrap();
        assert_eq!(report.stats.stored_updated, 1);
        assert_eq!(sink.record_count(), 1);
    }
}
