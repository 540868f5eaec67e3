//! # Utilities Module
//!
//! ## Purpose
//! Common text and timing helpers used throughout the enrichment pipeline.
//!
//! ## Key Features
//! - Content normalization preserving line structure
//! - Char-safe truncation and whitespace collapsing
//! - Performance timing helper

use std::time::Instant;
use unicode_normalization::UnicodeNormalization;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// Normalize document content for downstream analysis.
///
/// Applies NFC normalization, strips control characters, and collapses runs
/// of horizontal whitespace. Line breaks are preserved: section-marker
/// detection matches headings on their own line.
pub fn normalize_content(text: &str) -> String {
    let nfc: String = text.nfc().collect();

    let mut out = String::with_capacity(nfc.len());
    let mut pending_space = false;
    for ch in nfc.chars() {
        match ch {
            '\n' => {
                pending_space = false;
                out.push('\n');
            }
            c if c == ' ' || c == '\t' || c == '\r' => {
                pending_space = true;
            }
            c if c.is_control() => {}
            c => {
                if pending_space && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    out.trim().to_string()
}

/// Collapse all whitespace runs (including line breaks) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate text to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Strip leading and trailing punctuation and whitespace from a name fragment
pub fn trim_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '.'))
}
