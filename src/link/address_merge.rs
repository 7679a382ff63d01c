//! Merge contiguous address lines into `ADDRESS_BLOCK` spans.
//!
//! Blocks are anchored on a city-state-ZIP or PO-Box line and extended
//! upward through street, unit, and PO-Box lines, tolerating a single blank
//! line between members. The constituent line spans are kept; the global
//! merger drops them later because blocks rank higher and cover them.

use crate::models::{AddressLineKind, EntityLabel, Span, SpanAttrs};

use super::{build_line_index, line_for_offset};

/// Append merged `ADDRESS_BLOCK` spans for qualifying line runs.
pub fn merge_address_lines(text: &str, spans: &mut Vec<Span>) {
    let lines = build_line_index(text);

    // Address line spans indexed by their line number.
    let mut by_line: Vec<(usize, usize)> = Vec::new(); // (line_no, span index)
    for (idx, span) in spans.iter().enumerate() {
        if span.label == EntityLabel::AddressLine {
            by_line.push((line_for_offset(&lines, span.start), idx));
        }
    }
    by_line.sort_unstable();

    let kind_of = |span_idx: usize, spans: &[Span]| -> Option<AddressLineKind> {
        spans[span_idx].attrs.line_kind
    };

    let mut blocks: Vec<Span> = Vec::new();
    let mut used_lines: Vec<usize> = Vec::new();

    for &(anchor_line, anchor_idx) in by_line.iter().rev() {
        let anchor_kind = kind_of(anchor_idx, spans);
        if anchor_kind != Some(AddressLineKind::CityStateZip) {
            continue;
        }
        if used_lines.contains(&anchor_line) {
            continue;
        }

        // Walk upward collecting member lines.
        let mut members: Vec<usize> = vec![anchor_idx];
        let mut member_lines: Vec<usize> = vec![anchor_line];
        let mut current_line = anchor_line;
        loop {
            let prev = by_line
                .iter()
                .rev()
                .find(|&&(line_no, idx)| {
                    line_no < current_line
                        && !used_lines.contains(&line_no)
                        && matches!(
                            kind_of(idx, spans),
                            Some(
                                AddressLineKind::Street
                                    | AddressLineKind::Unit
                                    | AddressLineKind::PoBox
                            )
                        )
                })
                .copied();
            let Some((line_no, idx)) = prev else { break };
            let gap = current_line - line_no;
            let blank_between = gap == 2 && lines[current_line - 1].2.trim().is_empty();
            if gap != 1 && !blank_between {
                break;
            }
            members.insert(0, idx);
            member_lines.insert(0, line_no);
            current_line = line_no;
        }

        if members.len() < 2 {
            continue;
        }
        let kinds: Vec<AddressLineKind> = members
            .iter()
            .filter_map(|&i| kind_of(i, spans))
            .collect();
        let has_street = kinds.contains(&AddressLineKind::Street);
        let has_po_box = kinds.contains(&AddressLineKind::PoBox);
        if !has_street && !has_po_box {
            continue;
        }

        let start = spans[members[0]].start;
        let end = spans[*members.last().unwrap()].end;
        let confidence = members
            .iter()
            .map(|&i| spans[i].confidence)
            .fold(0.0_f64, f64::max)
            + 0.01;
        let zip_plus_four = spans[anchor_idx].attrs.zip_plus_four;
        let attrs = SpanAttrs {
            line_kinds: kinds,
            zip_plus_four,
            ..Default::default()
        };
        blocks.push(
            Span::new(
                start,
                end,
                &text[start..end],
                EntityLabel::AddressBlock,
                "address_block_merge",
                confidence.min(0.99),
            )
            .with_attrs(attrs),
        );
        used_lines.extend(member_lines);
    }

    spans.extend(blocks);
    spans.sort_by_key(|s| (s.start, s.end));
}
