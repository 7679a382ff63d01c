//! Replacement plan entries.

use super::span::EntityLabel;
use serde::Serialize;

/// A single accepted replacement over the normalized text.
///
/// Entries are created by the planner and never mutated after safety
/// acceptance. Within a plan all entries are pairwise disjoint and
/// `original_text == normalized[start..end]`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    /// Start byte offset in the normalized text (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Text being replaced
    pub original_text: String,

    /// Generated replacement
    pub replacement_text: String,

    /// Owning cluster, when the span was linked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    /// Label of the underlying span
    pub label: EntityLabel,

    /// Detector that produced the underlying span
    pub source: &'static str,

    /// Detection confidence carried through for the audit
    pub confidence: f64,

    /// Safety-guard regeneration attempts consumed by this entry
    pub retries: u32,

    /// Why this entry looks the way it does, oldest first
    /// (e.g. "rejected: matches sensitive value", "fallback placeholder")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_trail: Vec<String>,
}

impl PlanEntry {
    /// Length change introduced by this replacement.
    pub fn length_delta(&self) -> isize {
        self.replacement_text.len() as isize - self.original_text.len() as isize
    }
}
