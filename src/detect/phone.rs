//! Phone number detector.
//!
//! Covers North American Numbering Plan forms with common punctuation and
//! compact E.164 strings. Sequences whose digits are all identical are
//! rejected, as are NANP numbers whose area code or exchange starts with
//! 0 or 1.

use super::rtrim_index;
use crate::models::{EntityLabel, Span, SpanAttrs};
use regex::Regex;

pub struct PhoneDetector {
    nanp: Regex,
    e164: Regex,
}

impl PhoneDetector {
    pub fn new() -> Self {
        // (212) 555-0147 / 212-555-0147 / 212.555.0147 / +1 212 555 0147
        let nanp = Regex::new(
            r"(?x)
            (?:\+1[\s.-]?)?
            (?:\(\d{3}\)\s?|\d{3}[\s.-])
            \d{3}[\s.-]\d{4}\b",
        )
        .unwrap();
        // Compact international form.
        let e164 = Regex::new(r"\+[1-9]\d{7,14}\b").unwrap();
        Self { nanp, e164 }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();

        for m in self.nanp.find_iter(text) {
            // A match starting right after a digit is the tail of a longer
            // number (likely a card or account), not a phone.
            if text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit())
            {
                continue;
            }
            let end = rtrim_index(text, m.end());
            let matched = &text[m.start()..end];
            let digits: String = matched.chars().filter(char::is_ascii_digit).collect();
            if !Self::valid_nanp(&digits) {
                continue;
            }
            spans.push(Self::span(m.start(), end, matched, &digits));
        }

        for m in self.e164.find_iter(text) {
            let end = rtrim_index(text, m.end());
            let matched = &text[m.start()..end];
            let digits: String = matched.chars().filter(char::is_ascii_digit).collect();
            if Self::all_same_digit(&digits) {
                continue;
            }
            if spans.iter().any(|s| s.start < end && m.start() < s.end) {
                continue;
            }
            spans.push(Self::span(m.start(), end, matched, &digits));
        }

        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }

    fn span(start: usize, end: usize, matched: &str, digits: &str) -> Span {
        let attrs = SpanAttrs {
            normalized: Some(digits.to_string()),
            ..Default::default()
        };
        Span::new(start, end, matched, EntityLabel::Phone, "phone", 0.98).with_attrs(attrs)
    }

    fn all_same_digit(digits: &str) -> bool {
        let mut chars = digits.chars();
        match chars.next() {
            Some(first) => chars.all(|c| c == first),
            None => true,
        }
    }

    fn valid_nanp(digits: &str) -> bool {
        let national = match digits.len() {
            10 => digits,
            11 if digits.starts_with('1') => &digits[1..],
            _ => return false,
        };
        if Self::all_same_digit(national) {
            return false;
        }
        let area = national.as_bytes()[0];
        let exchange = national.as_bytes()[3];
        (b'2'..=b'9').contains(&area) && (b'2'..=b'9').contains(&exchange)
    }
}

impl Default for PhoneDetector {
    fn default() -> Self {
        Self::new()
    }
}
