//! Email address detector.
//!
//! Matches RFC-5322-compatible local and domain parts with a mandatory dot
//! in the domain. Trailing sentence punctuation is excluded from the span.

use super::rtrim_index;
use crate::models::{EntityLabel, Span, SpanAttrs};
use regex::Regex;

pub struct EmailDetector {
    pattern: Regex,
}

impl EmailDetector {
    pub fn new() -> Self {
        // Local part: atext plus dots; domain: labels joined by dots with an
        // alphabetic TLD of at least two characters.
        let pattern = Regex::new(
            r"\b[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}\b",
        )
        .unwrap();
        Self { pattern }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        for m in self.pattern.find_iter(text) {
            let end = rtrim_index(text, m.end());
            if end <= m.start() {
                continue;
            }
            let matched = &text[m.start()..end];
            // The dot requirement can be trimmed away; re-check.
            let Some(at) = matched.find('@') else { continue };
            if !matched[at..].contains('.') {
                continue;
            }
            let attrs = SpanAttrs {
                normalized: Some(matched.to_ascii_lowercase()),
                ..Default::default()
            };
            spans.push(
                Span::new(m.start(), end, matched, EntityLabel::Email, "email", 0.99)
                    .with_attrs(attrs),
            );
        }
        spans
    }
}

impl Default for EmailDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_plain_address() {
        let d = EmailDetector::new();
        let spans = d.detect("Contact jane.doe@acme-corp.com for details.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "jane.doe@acme-corp.com");
    }

    #[test]
    fn excludes_trailing_punctuation() {
        let d = EmailDetector::new();
        let spans = d.detect("Email: jane@acme.com, thanks.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "jane@acme.com");
    }

    #[test]
    fn requires_dot_in_domain() {
        let d = EmailDetector::new();
        assert!(d.detect("user@localhost is not enough").is_empty());
    }

    #[test]
    fn accepts_plus_tags() {
        let d = EmailDetector::new();
        let spans = d.detect("billing+invoices@example.co.uk");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "billing+invoices@example.co.uk");
    }
}
