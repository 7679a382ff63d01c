//! Address line detector (US postal conventions).
//!
//! Classifies whole lines as street, unit, city-state-ZIP, or PO-Box lines
//! and emits one `ADDRESS_LINE` span per match. Multi-line blocks are
//! assembled later by the address merger.

use crate::models::{AddressLineKind, EntityLabel, Span, SpanAttrs};
use regex::Regex;

pub struct AddressLineDetector {
    street: Regex,
    unit: Regex,
    city_state_zip: Regex,
    po_box: Regex,
}

impl AddressLineDetector {
    pub fn new() -> Self {
        let street = Regex::new(
            r"(?x)^
            \d{1,6}\x20
            (?:[NSEW]{1,2}\.?\x20)?
            (?:[A-Z0-9][A-Za-z0-9.'-]*\x20){1,4}
            (?:St|Street|Ave|Avenue|Rd|Road|Blvd|Boulevard|Ln|Lane|Dr|Drive|Ct|Court|Way|Pl|Place|Ter|Terrace|Pkwy|Parkway|Cir|Circle)\.?
            (?:\x20[NSEW]{1,2}\.?)?
            (?:,?\x20(?:Apt|Apartment|Suite|Ste|Unit|\#)\.?\x20?[A-Za-z0-9-]+)?
            $",
        )
        .unwrap();
        let unit = Regex::new(r"(?x)^(?:Apt|Apartment|Suite|Ste|Unit|\#)\.?\x20?[A-Za-z0-9-]+$")
            .unwrap();
        let city_state_zip = Regex::new(
            r"(?x)^
            [A-Z][A-Za-z.'-]*(?:\x20[A-Z][A-Za-z.'-]*)*
            ,\x20?[A-Z]{2}\x20\d{5}(?:-\d{4})?
            $",
        )
        .unwrap();
        let po_box = Regex::new(r"(?ix)^P\.?\s?O\.?\s?Box\x20\d+$").unwrap();
        Self {
            street,
            unit,
            city_state_zip,
            po_box,
        }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut pos = 0;
        for raw_line in text.split_inclusive('\n') {
            let line_start = pos;
            pos += raw_line.len();
            let line = raw_line.trim_end_matches(['\n', '\r']);
            let leading = line.len() - line.trim_start().len();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let start = line_start + leading;
            let end = start + trimmed.len();

            let (kind, confidence) = if self.po_box.is_match(trimmed) {
                (AddressLineKind::PoBox, 0.96)
            } else if self.city_state_zip.is_match(trimmed) {
                (AddressLineKind::CityStateZip, 0.94)
            } else if self.street.is_match(trimmed) {
                (AddressLineKind::Street, 0.95)
            } else if self.unit.is_match(trimmed) {
                (AddressLineKind::Unit, 0.90)
            } else {
                continue;
            };

            let zip_plus_four = kind == AddressLineKind::CityStateZip
                && trimmed
                    .rsplit(' ')
                    .next()
                    .is_some_and(|z| z.len() == 10 && z.contains('-'));

            let attrs = SpanAttrs {
                line_kind: Some(kind),
                zip_plus_four,
                ..Default::default()
            };
            spans.push(
                Span::new(
                    start,
                    end,
                    trimmed,
                    EntityLabel::AddressLine,
                    "address_line",
                    confidence,
                )
                .with_attrs(attrs),
            );
        }
        spans
    }
}

impl Default for AddressLineDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<AddressLineKind> {
        AddressLineDetector::new()
            .detect(text)
            .into_iter()
            .map(|s| s.attrs.line_kind.unwrap())
            .collect()
    }

    #[test]
    fn classifies_street_lines() {
        assert_eq!(kinds("1600 Pennsylvania Ave NW"), vec![AddressLineKind::Street]);
        assert_eq!(kinds("42 Oak St"), vec![AddressLineKind::Street]);
        assert_eq!(
            kinds("123 N Main Street, Apt 4B"),
            vec![AddressLineKind::Street]
        );
    }

    #[test]
    fn classifies_city_state_zip() {
        assert_eq!(
            kinds("Washington, DC 20500"),
            vec![AddressLineKind::CityStateZip]
        );
        let spans = AddressLineDetector::new().detect("Cedar Grove, NJ 07009-1234");
        assert!(spans[0].attrs.zip_plus_four);
    }

    #[test]
    fn classifies_unit_and_po_box() {
        assert_eq!(kinds("Suite 210"), vec![AddressLineKind::Unit]);
        assert_eq!(kinds("P.O. Box 1297"), vec![AddressLineKind::PoBox]);
        assert_eq!(kinds("PO Box 42"), vec![AddressLineKind::PoBox]);
    }

    #[test]
    fn ignores_prose_lines() {
        assert!(kinds("The premises shall be delivered broom clean.").is_empty());
        assert!(kinds("Dated July 4, 1982").is_empty());
    }

    #[test]
    fn spans_cover_trimmed_line() {
        let text = "Remit to:\n  1600 Pennsylvania Ave NW\nWashington, DC 20500\n";
        let spans = AddressLineDetector::new().detect(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "1600 Pennsylvania Ave NW");
        assert_eq!(
            &text[spans[0].start..spans[0].end],
            "1600 Pennsylvania Ave NW"
        );
    }
}
