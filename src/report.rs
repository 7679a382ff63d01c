//! Audit bundle assembly and report serialization.
//!
//! The audit intentionally records the original text of every replacement
//! alongside the pseudonym, so audit files contain PII and must stay local.
//! Verification and plan artifacts are PII-free (the plan's minimal form
//! still includes original offsets, not original text). The seed secret
//! never appears in any artifact, only the `seed_present` flag.

use crate::models::{EntityLabel, PlanEntry};
use crate::preprocess::CharMap;
use crate::verify::VerificationReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One applied replacement, with offsets in both coordinate systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub label: EntityLabel,
    pub original: String,
    pub replacement: String,
    /// Offsets into the original document
    pub start_orig: usize,
    pub end_orig: usize,
    /// Offsets into the normalized text
    pub start_norm: usize,
    pub end_norm: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub confidence: f64,
    pub detector: String,
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason: Vec<String>,
}

/// Run-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub run_id: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub total_replacements: usize,
    pub counts_by_label: BTreeMap<String, usize>,
    pub length_delta_total: isize,
    /// Hex digest of the input document, for correlation
    pub doc_hash: String,
    pub seed_present: bool,
}

/// Everything a caller needs to audit one redaction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditBundle {
    pub entries: Vec<AuditEntry>,
    pub summary: AuditSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Minimal plan form without original text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    pub replacement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

/// Build audit entries from the applied plan.
pub fn build_audit(
    plan: &[PlanEntry],
    char_map: &CharMap,
    doc_hash: &[u8; 32],
    seed_present: bool,
    warnings: Vec<String>,
) -> AuditBundle {
    let mut entries = Vec::with_capacity(plan.len());
    let mut counts_by_label: BTreeMap<String, usize> = BTreeMap::new();
    let mut length_delta_total = 0isize;

    for (idx, p) in plan.iter().enumerate() {
        let (start_orig, end_orig) = char_map.to_original_range(p.start, p.end);
        *counts_by_label
            .entry(p.label.as_str().to_string())
            .or_insert(0) += 1;
        length_delta_total += p.length_delta();
        entries.push(AuditEntry {
            id: format!("r{:04}", idx + 1),
            label: p.label,
            original: p.original_text.clone(),
            replacement: p.replacement_text.clone(),
            start_orig,
            end_orig,
            start_norm: p.start,
            end_norm: p.end,
            cluster_id: p.cluster_id.clone(),
            confidence: p.confidence,
            detector: p.source.to_string(),
            retries: p.retries,
            reason: p.reason_trail.clone(),
        });
    }

    let summary = AuditSummary {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now(),
        total_replacements: entries.len(),
        counts_by_label,
        length_delta_total,
        doc_hash: hex(doc_hash),
        seed_present,
    };

    AuditBundle {
        entries,
        summary,
        warnings,
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Minimal plan records for `plan.json`.
pub fn plan_records(plan: &[PlanEntry]) -> Vec<PlanRecord> {
    plan.iter()
        .map(|p| PlanRecord {
            start: p.start,
            end: p.end,
            label: p.label,
            replacement: p.replacement_text.clone(),
            cluster_id: p.cluster_id.clone(),
        })
        .collect()
}

/// Human-readable one-screen summary.
pub fn text_summary(audit: &AuditBundle, verification: &VerificationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Redaction run {}\n  replacements: {}\n",
        audit.summary.run_id, audit.summary.total_replacements
    ));
    for (label, count) in &audit.summary.counts_by_label {
        out.push_str(&format!("    {label}: {count}\n"));
    }
    out.push_str(&format!(
        "  residuals: {} (leakage score {})\n",
        verification.residuals.len(),
        verification.leakage_score
    ));
    for residual in &verification.residuals {
        out.push_str(&format!(
            "    {} {:?} at {}..{}\n",
            residual.label.as_str(),
            residual.text,
            residual.start,
            residual.end
        ));
    }
    if !audit.warnings.is_empty() {
        out.push_str("  warnings:\n");
        for w in &audit.warnings {
            out.push_str(&format!("    {w}\n"));
        }
    }
    out
}
