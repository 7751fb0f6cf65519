//! Repair result with statistics.

use crate::model::LayoutMode;
use serde::{Deserialize, Serialize};

/// Result of running the repair passes over a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairResult {
    /// The repaired LaTeX text
    pub content: String,

    /// Layout the image rewriter used
    pub layout: LayoutMode,

    /// Repair statistics
    pub stats: RepairStats,
}

impl RepairResult {
    /// Create a new repair result.
    pub fn new(content: String, layout: LayoutMode, stats: RepairStats) -> Self {
        Self {
            content,
            layout,
            stats,
        }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics collected by the table and image passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStats {
    /// Table regions discovered across both sweeps
    pub tables_found: u32,

    /// Content tables that were cleaned
    pub tables_rewritten: u32,

    /// Regions left verbatim because they hold algorithm listings
    pub algorithms_skipped: u32,

    /// Header lines dropped from content tables
    pub headers_dropped: u32,

    /// Image directives rewritten
    pub images_rewritten: u32,

    /// Images wrapped in a new figure environment
    pub images_wrapped: u32,
}

impl RepairStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of statistics to this one.
    pub fn merge(&mut self, other: &RepairStats) {
        self.tables_found += other.tables_found;
        self.tables_rewritten += other.tables_rewritten;
        self.algorithms_skipped += other.algorithms_skipped;
        self.headers_dropped += other.headers_dropped;
        self.images_rewritten += other.images_rewritten;
        self.images_wrapped += other.images_wrapped;
    }

    /// Check if the passes changed nothing.
    pub fn is_empty(&self) -> bool {
        self.tables_rewritten == 0 && self.images_rewritten == 0
    }
}
