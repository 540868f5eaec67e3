//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the enrichment pipeline, supporting TOML
//! files and environment-variable overrides with validation and type-safe
//! access to all settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`CASE_ENRICHMENT_*`)
//! 2. Configuration file
//! 3. Default values
//!
//! ## Usage
//! ```rust,no_run
//! use case_enrichment::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("batch size: {}", config.pipeline.batch_size);
//! ```

use crate::errors::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference-table locations
    pub reference: ReferenceConfig,
    /// Pipeline behavior
    pub pipeline: PipelineConfig,
    /// Storage sink settings
    pub storage: StorageConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Locations of the three static reference tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Canonical court records (JSON array)
    pub courts_path: PathBuf,
    /// Reporter records with editions (JSON array)
    pub reporters_path: PathBuf,
    /// `(court, initials) -> judge` rows (JSON array)
    pub judge_initials_path: PathBuf,
}

/// Pipeline behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Documents fetched per batch by the CLI
    pub batch_size: usize,
    /// Documents processed concurrently within a batch
    pub max_concurrent_documents: usize,
    /// Classifier confidence floor for the type-hint fallback
    pub classifier_confidence_floor: f64,
    /// Keywords retained per document
    pub max_keywords: usize,
    /// Error-prone document IDs listed in the run summary
    pub report_top_documents: usize,
}

/// Storage sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Sled database path
    pub db_path: PathBuf,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference: ReferenceConfig::default(),
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            courts_path: PathBuf::from("./data/reference/courts.json"),
            reporters_path: PathBuf::from("./data/reference/reporters.json"),
            judge_initials_path: PathBuf::from("./data/reference/judge_initials.json"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrent_documents: num_cpus::get(),
            classifier_confidence_floor: 0.3,
            max_keywords: 12,
            report_top_documents: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/enrichment.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| EnrichError::Config {
                message: format!("Failed to read config file {:?}: {}", path, e),
            })?;
            toml::from_str(&content).map_err(|e| EnrichError::Config {
                message: format!("Failed to parse config file {:?}: {}", path, e),
            })?
        } else {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(db_path) = std::env::var("CASE_ENRICHMENT_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(level) = std::env::var("CASE_ENRICHMENT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(concurrency) = std::env::var("CASE_ENRICHMENT_CONCURRENCY") {
            self.pipeline.max_concurrent_documents =
                concurrency.parse().map_err(|_| EnrichError::Config {
                    message: "Invalid value in CASE_ENRICHMENT_CONCURRENCY".to_string(),
                })?;
        }
        if let Ok(reference_dir) = std::env::var("CASE_ENRICHMENT_REFERENCE_DIR") {
            let dir = PathBuf::from(reference_dir);
            self.reference.courts_path = dir.join("courts.json");
            self.reference.reporters_path = dir.join("reporters.json");
            self.reference.judge_initials_path = dir.join("judge_initials.json");
        }
        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.pipeline.batch_size == 0 {
            return Err(EnrichError::Config {
                message: "pipeline.batch_size must be greater than zero".to_string(),
            });
        }
        if self.pipeline.max_concurrent_documents == 0 {
            return Err(EnrichError::Config {
                message: "pipeline.max_concurrent_documents must be greater than zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.pipeline.classifier_confidence_floor) {
            return Err(EnrichError::Config {
                message: "pipeline.classifier_confidence_floor must be within 0.0..=1.0"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Get configuration as a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EnrichError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}
