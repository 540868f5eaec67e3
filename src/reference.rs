//! # Reference Data Module
//!
//! ## Purpose
//! Read-only lookup tables consumed by the enrichment stages: canonical
//! court records, reporter records, and judge-initials maps. Loaded once at
//! process start from JSON files and assumed static for a run.
//!
//! ## Input/Output Specification
//! - **Input**: JSON files listed in `ReferenceConfig`
//! - **Output**: Keyed lookups for courts (by ID), reporters (by base
//!   abbreviation), and judges (by court + docket-suffix initials)
//!
//! A load failure is the one batch-aborting error class: it surfaces before
//! any document is processed.

use crate::config::ReferenceConfig;
use crate::errors::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Canonical court record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtRecord {
    /// Canonical court identifier, e.g. `txed`
    pub id: String,
    /// Full court name
    pub name: String,
    /// Jurisdiction label, e.g. `F` for federal district
    #[serde(default)]
    pub jurisdiction: Option<String>,
    /// Source URL for the court resource
    #[serde(default)]
    pub url: Option<String>,
}

/// Reporter series record with its known editions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterRecord {
    /// Base abbreviation used as the table key, e.g. `F.`
    pub abbreviation: String,
    /// Canonical series name, e.g. `Federal Reporter`
    pub name: String,
    /// Canonical edition abbreviations, e.g. `["F.", "F.2d", "F.3d"]`
    #[serde(default)]
    pub editions: Vec<String>,
}

/// One `(court, initials) -> judge` mapping row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeInitialsEntry {
    /// Canonical court identifier the initials are scoped to
    pub court: String,
    /// Docket-number suffix initials, e.g. `JRG`
    pub initials: String,
    /// Full judge name
    pub name: String,
}

/// The three static lookup tables used by the enrichment stages
#[derive(Debug)]
pub struct ReferenceData {
    // BTreeMap keeps fuzzy-match iteration deterministic
    courts: BTreeMap<String, CourtRecord>,
    reporters: BTreeMap<String, ReporterRecord>,
    judge_initials: HashMap<(String, String), String>,
}

impl ReferenceData {
    /// Load all three tables from the configured JSON files
    pub fn load(config: &ReferenceConfig) -> Result<Self> {
        let courts: Vec<CourtRecord> = read_table(&config.courts_path, "courts")?;
        let reporters: Vec<ReporterRecord> = read_table(&config.reporters_path, "reporters")?;
        let initials: Vec<JudgeInitialsEntry> =
            read_table(&config.judge_initials_path, "judge_initials")?;

        tracing::info!(
            "Loaded reference data: {} courts, {} reporters, {} judge-initials entries",
            courts.len(),
            reporters.len(),
            initials.len()
        );

        Ok(Self::from_parts(courts, reporters, initials))
    }

    /// Build the tables from already-parsed rows
    pub fn from_parts(
        courts: Vec<CourtRecord>,
        reporters: Vec<ReporterRecord>,
        initials: Vec<JudgeInitialsEntry>,
    ) -> Self {
        let courts = courts
            .into_iter()
            .map(|c| (c.id.to_ascii_lowercase(), c))
            .collect();
        let reporters = reporters
            .into_iter()
            .map(|r| (r.abbreviation.clone(), r))
            .collect();
        let judge_initials = initials
            .into_iter()
            .map(|e| {
                (
                    (e.court.to_ascii_lowercase(), e.initials.to_ascii_uppercase()),
                    e.name,
                )
            })
            .collect();

        Self {
            courts,
            reporters,
            judge_initials,
        }
    }

    /// Case-insensitive court lookup by canonical ID
    pub fn court_by_id(&self, id: &str) -> Option<&CourtRecord> {
        self.courts.get(&id.trim().to_ascii_lowercase())
    }

    /// All court records in deterministic ID order
    pub fn courts(&self) -> impl Iterator<Item = &CourtRecord> {
        self.courts.values()
    }

    /// Exact-case reporter lookup by base abbreviation
    pub fn reporter(&self, abbreviation: &str) -> Option<&ReporterRecord> {
        self.reporters.get(abbreviation)
    }

    /// Case-insensitive reporter lookup, used when exact-case lookup fails
    pub fn reporter_ci(&self, abbreviation: &str) -> Option<&ReporterRecord> {
        self.reporters
            .values()
            .find(|r| r.abbreviation.eq_ignore_ascii_case(abbreviation))
    }

    /// Judge lookup by court-scoped docket-suffix initials
    pub fn judge_for_initials(&self, court_id: &str, initials: &str) -> Option<&str> {
        self.judge_initials
            .get(&(
                court_id.trim().to_ascii_lowercase(),
                initials.trim().to_ascii_uppercase(),
            ))
            .map(String::as_str)
    }
}

fn read_table<T: serde::de::DeserializeOwned>(path: &Path, table: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| EnrichError::ReferenceData {
        table: table.to_string(),
        details: format!("failed to read {:?}: {}", path, e),
    })?;
    serde_json::from_str(&content).map_err(|e| EnrichError::ReferenceData {
        table: table.to_string(),
        details: format!("failed to parse {:?}: {}", path, e),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Reference tables shared by the unit tests of the resolver modules
    pub(crate) fn reference() -> ReferenceData {
        let courts = vec![
            CourtRecord {
                id: "txed".to_string(),
                name: "United States District Court for the Eastern District of Texas".to_string(),
                jurisdiction: Some("FD".to_string()),
                url: Some("https://www.courtlistener.com/api/rest/v3/courts/txed/".to_string()),
            },
            CourtRecord {
                id: "ca9".to_string(),
                name: "United States Court of Appeals for the Ninth Circuit".to_string(),
                jurisdiction: Some("F".to_string()),
                url: Some("https://www.courtlistener.com/api/rest/v3/courts/ca9/".to_string()),
            },
            CourtRecord {
                id: "scotus".to_string(),
                name: "Supreme Court of the United States".to_string(),
                jurisdiction: Some("F".to_string()),
                url: None,
            },
        ];

        let reporters = vec![
            ReporterRecord {
                abbreviation: "F.".to_string(),
                name: "Federal Reporter".to_string(),
                editions: vec!["F.".to_string(), "F.2d".to_string(), "F.3d".to_string()],
            },
            ReporterRecord {
                abbreviation: "F. Supp.".to_string(),
                name: "Federal Supplement".to_string(),
                editions: vec![
                    "F. Supp.".to_string(),
                    "F. Supp. 2d".to_string(),
                    "F. Supp. 3d".to_string(),
                ],
            },
            ReporterRecord {
                abbreviation: "U.S.".to_string(),
                name: "United States Reports".to_string(),
                editions: vec!["U.S.".to_string()],
            },
            ReporterRecord {
                abbreviation: "S. Ct.".to_string(),
                name: "Supreme Court Reporter".to_string(),
                editions: vec!["S. Ct.".to_string()],
            },
        ];

        let initials = vec![
            JudgeInitialsEntry {
                court: "txed".to_string(),
                initials: "JRG".to_string(),
                name: "Rodney Gilstrap".to_string(),
            },
            JudgeInitialsEntry {
                court: "txed".to_string(),
                initials: "RWS".to_string(),
                name: "Robert W. Schroeder III".to_string(),
            },
        ];

        ReferenceData::from_parts(courts, reporters, initials)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::reference;

    #[test]
    fn court_lookup_is_case_insensitive() {
        let reference = reference();
        assert!(reference.court_by_id("TXED").is_some());
        assert!(reference.court_by_id(" txed ").is_some());
        assert!(reference.court_by_id("nowhere").is_none());
    }

    #[test]
    fn reporter_lookup_exact_and_ci() {
        let reference = reference();
        assert!(reference.reporter("F.").is_some());
        assert!(reference.reporter("f.").is_none());
        assert!(reference.reporter_ci("f.").is_some());
    }

    #[test]
    fn judge_initials_are_court_scoped() {
        let reference = reference();
        assert_eq!(reference.judge_for_initials("txed", "jrg"), Some("Rodney Gilstrap"));
        assert_eq!(reference.judge_for_initials("ca9", "JRG"), None);
    }
}
