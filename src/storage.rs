//! # Storage Sink Module
//!
//! ## Purpose
//! The storage boundary the pipeline hands enrichment records to. The sink
//! owns the upsert decision: it compares the incoming fingerprint against
//! any stored fingerprint for the same external ID and reports whether the
//! record was inserted, updated, or skipped as unchanged.
//!
//! ## Input/Output Specification
//! - **Input**: One `EnrichmentRecord` at a time
//! - **Output**: `StorageOutcome`, plus the existing fingerprints consumed
//!   by the deduplication index at startup
//!
//! ## Key Features
//! - Embedded sled database with separate trees for records and
//!   fingerprints, bincode-encoded values
//! - In-memory implementation for tests and dry runs

use crate::config::StorageConfig;
use crate::errors::{EnrichError, Result};
use crate::identity::ContentFingerprint;
use crate::pipeline::EnrichmentRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upsert outcome decided by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOutcome {
    /// First record for this external ID
    Inserted,
    /// Existing record replaced because the fingerprint changed
    Updated,
    /// Fingerprint unchanged; nothing written
    SkippedUnchanged,
}

/// Storage boundary for enriched documents
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Fingerprints already stored, loaded once by the deduplication index
    async fn existing_fingerprints(&self) -> Result<Vec<ContentFingerprint>>;

    /// Persist one record, deciding insert vs update vs unchanged-skip by
    /// fingerprint comparison for the record's external ID
    async fn store(&self, record: &EnrichmentRecord) -> Result<StorageOutcome>;
}

/// Sled-backed storage sink
pub struct SledStorageSink {
    records: sled::Tree,
    fingerprints: sled::Tree,
    // Tree handles keep the database alive; the Db itself is retained for
    // flush on drop semantics
    _db: sled::Db,
}

impl SledStorageSink {
    /// Open (or create) the database at the configured path
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(&config.db_path)?;
        let records = db.open_tree("enrichment_records")?;
        let fingerprints = db.open_tree("fingerprints")?;

        tracing::info!(
            "Storage sink opened at {:?} with {} stored records",
            config.db_path,
            records.len()
        );

        Ok(Self {
            records,
            fingerprints,
            _db: db,
        })
    }

    /// Fetch a stored record by external ID
    pub fn get(&self, external_id: &str) -> Result<Option<EnrichmentRecord>> {
        match self.records.get(external_id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl StorageSink for SledStorageSink {
    async fn existing_fingerprints(&self) -> Result<Vec<ContentFingerprint>> {
        let mut fingerprints = Vec::with_capacity(self.fingerprints.len());
        for entry in self.fingerprints.iter() {
            let (_key, value) = entry?;
            let digest = String::from_utf8(value.to_vec()).map_err(|e| {
                EnrichError::Storage {
                    details: format!("corrupt fingerprint entry: {}", e),
                }
            })?;
            fingerprints.push(ContentFingerprint::from_stored(digest));
        }
        Ok(fingerprints)
    }

    async fn store(&self, record: &EnrichmentRecord) -> Result<StorageOutcome> {
        let key = record.external_id.as_bytes();
        let incoming = record.fingerprint.as_str().as_bytes();

        let outcome = match self.fingerprints.get(key)? {
            Some(existing) if existing.as_ref() == incoming => {
                return Ok(StorageOutcome::SkippedUnchanged);
            }
            Some(_) => StorageOutcome::Updated,
            None => StorageOutcome::Inserted,
        };

        let encoded = bincode::serialize(record)?;
        self.records.insert(key, encoded)?;
        self.fingerprints.insert(key, incoming)?;

        Ok(outcome)
    }
}

/// In-memory storage sink for tests and dry runs
#[derive(Default)]
pub struct MemoryStorageSink {
    entries: Mutex<HashMap<String, (ContentFingerprint, EnrichmentRecord)>>,
}

impl MemoryStorageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fingerprint as already stored, for dedup-index tests
    pub fn seed_fingerprint(&self, external_id: &str, fingerprint: ContentFingerprint) {
        self.entries.lock().insert(
            external_id.to_string(),
            (fingerprint, EnrichmentRecord::placeholder(external_id)),
        );
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Fetch a stored record by external ID
    pub fn get(&self, external_id: &str) -> Option<EnrichmentRecord> {
        self.entries
            .lock()
            .get(external_id)
            .map(|(_, record)| record.clone())
    }
}

#[async_trait]
impl StorageSink for MemoryStorageSink {
    async fn existing_fingerprints(&self) -> Result<Vec<ContentFingerprint>> {
        Ok(self
            .entries
            .lock()
            .values()
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect())
    }

    async fn store(&self, record: &EnrichmentRecord) -> Result<StorageOutcome> {
        let mut entries = self.entries.lock();
        let outcome = match entries.get(&record.external_id) {
            Some((existing, _)) if existing == &record.fingerprint => {
                return Ok(StorageOutcome::SkippedUnchanged);
            }
            Some(_) => StorageOutcome::Updated,
            None => StorageOutcome::Inserted,
        };
        entries.insert(
            record.external_id.clone(),
            (record.fingerprint.clone(), record.clone()),
        );
        Ok(outcome)
    }
}
