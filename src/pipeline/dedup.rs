//! # Deduplication Module
//!
//! ## Purpose
//! Maintains the set of previously seen content fingerprints and exposes
//! an at-most-once check-and-claim contract for concurrent document
//! processing.
//!
//! ## Key Features
//! - Loaded once at startup from the storage sink's existing fingerprints;
//!   a load failure fails open (proceed with an empty index) because
//!   silently skipping a real new document is worse than a redundant,
//!   idempotent re-enrichment
//! - `check_and_claim` atomically claims a fingerprint so two racing
//!   documents with the same fingerprint cannot both reach storage
//! - A claim is promoted to the seen set only after successful storage and
//!   released on handoff failure, so a crash mid-pipeline never marks an
//!   unprocessed document as done

use crate::identity::ContentFingerprint;
use crate::storage::StorageSink;
use dashmap::DashSet;

/// Outcome of a dedup check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// Unseen and now claimed by the caller
    Fresh,
    /// Already enriched, or claimed by a concurrent document
    Duplicate,
}

/// Process-lifetime index of enriched fingerprints
pub struct DeduplicationManager {
    seen: DashSet<String>,
    in_flight: DashSet<String>,
}

impl DeduplicationManager {
    /// Build an empty index
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
            in_flight: DashSet::new(),
        }
    }

    /// Load the index from the sink's already-stored fingerprints.
    ///
    /// Fails open: an unavailable sink logs a warning and yields an empty
    /// index rather than refusing to run.
    pub async fn load(sink: &dyn StorageSink) -> Self {
        let manager = Self::new();
        match sink.existing_fingerprints().await {
            Ok(fingerprints) => {
                for fingerprint in fingerprints {
                    manager.seen.insert(fingerprint.as_str().to_string());
                }
                tracing::info!(
                    "Deduplication index loaded with {} fingerprints",
                    manager.seen.len()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load existing fingerprints, proceeding without dedup history: {}",
                    e
                );
            }
        }
        manager
    }

    /// Check a fingerprint and claim it when fresh.
    ///
    /// At most one caller receives `Fresh` for a given fingerprint until
    /// that claim is released.
    pub fn check_and_claim(&self, fingerprint: &ContentFingerprint) -> DedupDecision {
        if self.seen.contains(fingerprint.as_str()) {
            return DedupDecision::Duplicate;
        }
        if self.in_flight.insert(fingerprint.as_str().to_string()) {
            DedupDecision::Fresh
        } else {
            DedupDecision::Duplicate
        }
    }

    /// Promote a claim after the record reached storage
    pub fn mark_processed(&self, fingerprint: &ContentFingerprint) {
        self.in_flight.remove(fingerprint.as_str());
        self.seen.insert(fingerprint.as_str().to_string());
    }

    /// Drop a claim after a failed handoff so a retry can proceed
    pub fn release(&self, fingerprint: &ContentFingerprint) {
        self.in_flight.remove(fingerprint.as_str());
    }

    /// Number of fingerprints known to be fully processed
    pub fn processed_count(&self) -> usize {
        self.seen.len()
    }
}

impl Default for DeduplicationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ContentFingerprint;

    fn fingerprint(tag: &str) -> ContentFingerprint {
        ContentFingerprint::from_stored(format!("digest-{}", tag))
    }

    #[test]
    fn second_claim_is_a_duplicate() {
        let manager = DeduplicationManager::new();
        let fp = fingerprint("a");
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Fresh);
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Duplicate);
    }

    #[test]
    fn marked_fingerprints_stay_duplicates() {
        let manager = DeduplicationManager::new();
        let fp = fingerprint("a");
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Fresh);
        manager.mark_processed(&fp);
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Duplicate);
        assert_eq!(manager.processed_count(), 1);
    }

    #[test]
    fn released_claims_can_be_retried() {
        let manager = DeduplicationManager::new();
        let fp = fingerprint("a");
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Fresh);
        manager.release(&fp);
        assert_eq!(manager.check_and_claim(&fp), DedupDecision::Fresh);
    }

    #[test]
    fn concurrent_claims_admit_exactly_one() {
        use std::sync::Arc;

        let manager = Arc::new(DeduplicationManager::new());
        let fp = fingerprint("contested");
        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            let fp = fp.clone();
            handles.push(std::thread::spawn(move || manager.check_and_claim(&fp)));
        }
        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|d| *d == DedupDecision::Fresh)
            .count();
        assert_eq!(fresh, 1);
    }
}
