//! Replacement planning and application.
//!
//! The planner walks the merged, non-overlapping spans, asks the generator
//! for a replacement, and runs each candidate through the safety guard.
//! Rejected candidates trigger regeneration with an incremented retry salt
//! (two retries); a span that never yields a safe candidate falls back to
//! an opaque `[REDACTED_<LABEL>]` placeholder, or fails the run in strict
//! mode. Every rejection is recorded on the entry's reason trail for the
//! audit.
//!
//! The applier validates disjointness and offsets, then rebuilds the text
//! in one pass. Re-applying a plan to text whose spans already hold the
//! generated pseudonyms is a no-op.

use crate::config::{AliasPolicy, Config};
use crate::error::{RedactError, Result};
use crate::models::{EntityCluster, EntityLabel, PlanEntry, Span};
use crate::pseudo::PseudonymGenerator;
use crate::safety::SafetyGuard;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 2;

/// Whether policy says this span stays in the output verbatim.
fn skip_replacement(span: &Span, config: &Config) -> bool {
    match span.label {
        EntityLabel::DateGeneric => !config.redact.generic_dates,
        EntityLabel::AliasLabel => {
            span.attrs.is_role && config.redact.alias_labels == AliasPolicy::KeepRoles
        }
        _ => false,
    }
}

fn find_cluster<'a>(
    clusters: &'a [EntityCluster],
    span: &Span,
) -> Option<&'a EntityCluster> {
    let id = span.cluster_id.as_deref()?;
    clusters.iter().find(|c| c.cluster_id == id)
}

/// Build the replacement plan for `merged` spans.
pub fn build_plan(
    text: &str,
    merged: &[Span],
    clusters: &[EntityCluster],
    generator: &PseudonymGenerator,
    guard: &SafetyGuard,
    config: &Config,
) -> Result<Vec<PlanEntry>> {
    let strict = config.verification.fail_on_residual;
    let mut entries: Vec<PlanEntry> = Vec::new();

    for span in merged {
        if skip_replacement(span, config) {
            debug!(label = %span.label, "span retained by policy");
            continue;
        }
        debug_assert_eq!(&text[span.start..span.end], span.text);

        let cluster = find_cluster(clusters, span);
        let mut reason_trail: Vec<String> = Vec::new();
        let mut accepted: Option<(String, u32)> = None;

        for salt in 0..=MAX_RETRIES {
            let Some(candidate) = generator.replacement_for(span, cluster, salt) else {
                reason_trail.push("generator produced no shaped candidate".into());
                break;
            };
            match guard.validate(span, &candidate) {
                Ok(()) => {
                    accepted = Some((candidate, salt));
                    break;
                }
                Err(rejection) => {
                    reason_trail.push(format!("attempt {salt} rejected: {rejection}"));
                }
            }
        }

        let (replacement_text, retries) = match accepted {
            Some((candidate, salt)) => (candidate, salt),
            None => {
                if strict {
                    return Err(RedactError::Pseudonym {
                        label: span.label.as_str().to_string(),
                        retries: MAX_RETRIES,
                        reason: reason_trail.join("; "),
                    });
                }
                warn!(label = %span.label, "no safe pseudonym, using placeholder");
                reason_trail.push("fallback placeholder".into());
                (format!("[REDACTED_{}]", span.label.as_str()), MAX_RETRIES)
            }
        };

        entries.push(PlanEntry {
            start: span.start,
            end: span.end,
            original_text: span.text.clone(),
            replacement_text,
            cluster_id: span.cluster_id.clone(),
            label: span.label,
            source: span.source,
            confidence: span.confidence,
            retries,
            reason_trail,
        });
    }

    entries.sort_by_key(|e| e.start);
    Ok(entries)
}

/// A plan entry applied to the output, with its range in the sanitized
/// text. The verifier uses these ranges to ignore re-detections inside
/// generated replacements.
#[derive(Debug, Clone)]
pub struct AppliedEntry {
    pub entry: PlanEntry,
    /// Half-open range of the replacement in the sanitized text.
    pub out_start: usize,
    pub out_end: usize,
}

fn validate_plan(text: &str, plan: &[PlanEntry]) -> Result<Vec<PlanEntry>> {
    let mut sorted = plan.to_vec();
    sorted.sort_by_key(|e| (e.start, e.end));
    let mut prev_end = 0usize;
    for entry in &sorted {
        if entry.start > entry.end || entry.start > text.len() {
            return Err(RedactError::Plan(format!(
                "entry out of bounds: {}..{}",
                entry.start, entry.end
            )));
        }
        if entry.start < prev_end {
            return Err(RedactError::Plan(format!(
                "entries overlap at {}",
                entry.start
            )));
        }
        prev_end = entry.end;
    }
    Ok(sorted)
}

/// Apply `plan` to `text`.
///
/// Replacement ranges are located right-to-left so each edit leaves the
/// offsets of earlier entries untouched. If the target range already holds
/// the replacement (a re-application), the entry is a no-op.
pub fn apply_plan(text: &str, plan: &[PlanEntry]) -> Result<(String, Vec<AppliedEntry>)> {
    if plan.is_empty() {
        return Ok((text.to_string(), Vec::new()));
    }
    let sorted = validate_plan(text, plan)?;

    // Resolve the real range of each entry from the tail backwards.
    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    let mut last = text.len();
    for entry in sorted.iter().rev() {
        let seg_start = entry.start.min(last);
        let repl = entry.replacement_text.as_str();
        let original_in_place = entry.end <= text.len()
            && text.get(entry.start..entry.end) == Some(entry.original_text.as_str());
        let (real_start, real_end) = if original_in_place {
            (entry.start, entry.end)
        } else if let Some(pos) = text[seg_start..last].rfind(repl) {
            // Already applied: replace the replacement with itself.
            (seg_start + pos, seg_start + pos + repl.len())
        } else {
            return Err(RedactError::Plan(format!(
                "entry at {}..{} does not match the text",
                entry.start, entry.end
            )));
        };
        ranges.push((real_start, real_end));
        last = real_start;
    }
    ranges.reverse();

    let mut out = String::with_capacity(text.len());
    let mut applied = Vec::with_capacity(sorted.len());
    let mut cursor = 0usize;
    for (entry, &(real_start, real_end)) in sorted.iter().zip(&ranges) {
        out.push_str(&text[cursor..real_start]);
        let out_start = out.len();
        out.push_str(&entry.replacement_text);
        applied.push(AppliedEntry {
            entry: entry.clone(),
            out_start,
            out_end: out.len(),
        });
        cursor = real_end;
    }
    out.push_str(&text[cursor..]);
    Ok((out, applied))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: usize, end: usize, original: &str, replacement: &str) -> PlanEntry {
        PlanEntry {
            start,
            end,
            original_text: original.to_string(),
            replacement_text: replacement.to_string(),
            cluster_id: None,
            label: EntityLabel::Person,
            source: "test",
            confidence: 0.9,
            retries: 0,
            reason_trail: Vec::new(),
        }
    }

    #[test]
    fn applies_in_order() {
        let text = "John met Jane at noon.";
        let plan = vec![entry(0, 4, "John", "Alan"), entry(9, 13, "Jane", "Ruth")];
        let (out, applied) = apply_plan(text, &plan).unwrap();
        assert_eq!(out, "Alan met Ruth at noon.");
        assert_eq!(applied.len(), 2);
        assert_eq!(&out[applied[1].out_start..applied[1].out_end], "Ruth");
    }

    #[test]
    fn length_changes_do_not_corrupt_offsets() {
        let text = "Jo called Jonathan.";
        let plan = vec![
            entry(0, 2, "Jo", "Maximilian"),
            entry(10, 18, "Jonathan", "Al"),
        ];
        let (out, _) = apply_plan(text, &plan).unwrap();
        assert_eq!(out, "Maximilian called Al.");
    }

    #[test]
    fn reapplication_is_noop() {
        let text = "John met Jane at noon.";
        let plan = vec![entry(0, 4, "John", "Alan"), entry(9, 13, "Jane", "Ruth")];
        let (once, _) = apply_plan(text, &plan).unwrap();
        let (twice, _) = apply_plan(&once, &plan).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn overlap_is_a_plan_error() {
        let text = "John Doe";
        let plan = vec![entry(0, 5, "John ", "X"), entry(4, 8, " Doe", "Y")];
        assert!(matches!(
            apply_plan(text, &plan),
            Err(RedactError::Plan(_))
        ));
    }

    #[test]
    fn mismatched_original_is_a_plan_error() {
        let text = "John Doe";
        let plan = vec![entry(0, 4, "Jane", "X")];
        assert!(matches!(
            apply_plan(text, &plan),
            Err(RedactError::Plan(_))
        ));
    }

    #[test]
    fn empty_plan_returns_text() {
        let (out, applied) = apply_plan("unchanged", &[]).unwrap();
        assert_eq!(out, "unchanged");
        assert!(applied.is_empty());
    }
}
