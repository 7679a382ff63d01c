//! Global overlap resolution by precedence and deterministic tie-breaks.
//!
//! The merger selects a single non-overlapping set of spans:
//!
//! 1. Defensively drop empty or inverted ranges.
//! 2. Collapse exact `[start, end)` + label duplicates, keeping the highest
//!    confidence (then the lexicographically smaller source).
//! 3. Order candidates by `(precedence, -length, -confidence, start,
//!    hash(source, label))` and sweep greedily, keeping a span only when it
//!    does not overlap an already accepted one.
//! 4. A partially overlapped loser is truncated to its free remainder when
//!    the remainder is still a syntactically valid span of its label;
//!    otherwise it is dropped.
//!
//! The merger is a pure function of its input, so detector parallelism
//! upstream cannot change the outcome.

use crate::detect::person::is_probable_person_name;
use crate::models::{EntityLabel, Span};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

fn tie_hash(source: &str, label: EntityLabel) -> u64 {
    let digest = Sha256::digest(format!("{source}:{}", label.as_str()).as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}

fn priority_key(span: &Span) -> (u8, std::cmp::Reverse<usize>, std::cmp::Reverse<u64>, usize, u64) {
    // Confidence is compared through a fixed-point projection so the key is
    // totally ordered.
    let confidence_fp = (span.confidence * 1_000_000.0).round() as u64;
    (
        span.label.precedence(),
        std::cmp::Reverse(span.len()),
        std::cmp::Reverse(confidence_fp),
        span.start,
        tie_hash(span.source, span.label),
    )
}

/// Whether a truncated remainder still reads as a valid span of `label`.
fn truncated_valid(label: EntityLabel, text: &str) -> bool {
    match label {
        EntityLabel::Person => is_probable_person_name(text),
        // Identifiers, dates, and contact handles lose their syntax when
        // cut; organizations lose their suffix. Drop them instead.
        _ => false,
    }
}

/// Resolve overlaps and return spans sorted by start.
pub fn merge_spans(text: &str, spans: &[Span]) -> Vec<Span> {
    let valid = spans.iter().filter(|s| s.start < s.end && s.end <= text.len());

    // Collapse identical ranges per label.
    let mut best: HashMap<(usize, usize, EntityLabel), &Span> = HashMap::new();
    for span in valid {
        best.entry((span.start, span.end, span.label))
            .and_modify(|prev| {
                let stronger = span.confidence > prev.confidence
                    || (span.confidence == prev.confidence && span.source < prev.source);
                if stronger {
                    *prev = span;
                }
            })
            .or_insert(span);
    }

    let mut ordered: Vec<Span> = best.into_values().cloned().collect();
    ordered.sort_by(|a, b| priority_key(a).cmp(&priority_key(b)));

    let mut kept: Vec<Span> = Vec::new();
    for mut cand in ordered {
        let overlapping: Vec<&Span> = kept.iter().filter(|k| k.overlaps(&cand)).collect();
        if overlapping.is_empty() {
            kept.push(cand);
            continue;
        }

        // Try to truncate to the free remainder on one side.
        let mut start = cand.start;
        let mut end = cand.end;
        for k in &overlapping {
            if k.start <= start {
                start = start.max(k.end);
            }
            if k.end >= end {
                end = end.min(k.start);
            }
        }
        if start >= end {
            continue;
        }
        // A middle cut leaves two fragments; treat as dropped.
        if kept.iter().any(|k| k.start < end && start < k.start) {
            continue;
        }
        while start < end && !text.is_char_boundary(start) {
            start += 1;
        }
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let trimmed = text[start..end].trim();
        if trimmed.is_empty() || !truncated_valid(cand.label, trimmed) {
            continue;
        }
        let offset = text[start..end].len() - text[start..end].trim_start().len();
        cand.start = start + offset;
        cand.end = cand.start + trimmed.len();
        cand.text = trimmed.to_string();
        kept.push(cand);
    }

    kept.sort_by_key(|s| s.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpanAttrs;

    fn span(start: usize, end: usize, text: &str, label: EntityLabel, conf: f64) -> Span {
        Span::new(start, end, text, label, "test", conf)
    }

    #[test]
    fn address_block_absorbs_lines() {
        let text = "1600 Pennsylvania Ave NW\nWashington, DC 20500";
        let line1 = span(0, 24, &text[0..24], EntityLabel::AddressLine, 0.95);
        let line2 = span(25, 45, &text[25..45], EntityLabel::AddressLine, 0.94);
        let block = span(0, 45, text, EntityLabel::AddressBlock, 0.96);
        let merged = merge_spans(text, &[line1, line2, block]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label, EntityLabel::AddressBlock);
    }

    #[test]
    fn identical_ranges_collapse_to_one() {
        let text = "July 4, 1982";
        let a = span(0, 12, text, EntityLabel::DateGeneric, 0.97);
        let b = span(0, 12, text, EntityLabel::DateGeneric, 0.94);
        let merged = merge_spans(text, &[a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, 0.97);
    }

    #[test]
    fn dob_outranks_generic_date_on_same_range() {
        let text = "July 4, 1982";
        let generic = span(0, 12, text, EntityLabel::DateGeneric, 0.97);
        let dob = span(0, 12, text, EntityLabel::Dob, 0.99);
        let merged = merge_spans(text, &[generic, dob]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label, EntityLabel::Dob);
    }

    #[test]
    fn longer_span_wins_within_tier() {
        let text = "Chase Bank, N.A.";
        let short = span(0, 10, &text[0..10], EntityLabel::BankOrg, 0.92);
        let long = span(0, 16, text, EntityLabel::BankOrg, 0.92);
        let merged = merge_spans(text, &[short, long]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Chase Bank, N.A.");
    }

    #[test]
    fn partial_overlap_truncates_person_when_still_valid() {
        // Email wins its range; the person span loses its tail but the
        // remaining two tokens still form a name.
        let text = "Mary Anne Smith smith@example.com";
        let person = span(0, 21, &text[0..21], EntityLabel::Person, 0.75);
        let email = Span {
            attrs: SpanAttrs::default(),
            ..span(16, 33, &text[16..33], EntityLabel::Email, 0.99)
        };
        let merged = merge_spans(text, &[person, email]);
        assert_eq!(merged.len(), 2);
        let kept_person = merged.iter().find(|s| s.label == EntityLabel::Person).unwrap();
        assert_eq!(kept_person.text, "Mary Anne Smith");
    }

    #[test]
    fn partial_overlap_drops_invalid_remainder() {
        let text = "DE89370400440532013000 paid";
        let account = span(0, 22, &text[0..22], EntityLabel::AccountId, 0.99);
        let clipped = span(10, 27, &text[10..27], EntityLabel::GenericOrg, 0.8);
        let merged = merge_spans(text, &[account, clipped]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label, EntityLabel::AccountId);
    }

    #[test]
    fn result_is_disjoint_and_sorted() {
        let text = "John Doe jane@acme.com 123-45-6789 July 4, 1982";
        let spans = vec![
            span(0, 8, "John Doe", EntityLabel::Person, 0.75),
            span(9, 22, "jane@acme.com", EntityLabel::Email, 0.99),
            span(5, 22, &text[5..22], EntityLabel::GenericOrg, 0.6),
            span(23, 34, "123-45-6789", EntityLabel::AccountId, 0.99),
            span(35, 47, "July 4, 1982", EntityLabel::DateGeneric, 0.97),
        ];
        let merged = merge_spans(text, &spans);
        for pair in merged.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
