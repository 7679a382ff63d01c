//! Alias label detector.
//!
//! Finds legal alias definitions in two surface families:
//!
//! * trigger phrases: `hereinafter [referred to as]`, `a/k/a`, `f/k/a`,
//!   `d/b/a`, `also known as`, followed by a quoted or title-cased term;
//! * parenthetical definitions: `(the "Buyer")`, `("Morgan")`.
//!
//! Only the alias term itself is captured as the span. The preceding
//! subject name is recorded as an attribute guess when present; the linker
//! later anchors the definition to an actual subject span.

use crate::models::{EntityLabel, Span, SpanAttrs};
use regex::Regex;

/// Role words that may be preserved under the `keep_roles` policy.
pub const ROLE_TERMS: [&str; 9] = [
    "buyer", "seller", "lessee", "lessor", "landlord", "tenant", "employer", "employee",
    "party",
];

/// Whether an alias term is a pure role label.
pub fn is_role_term(term: &str) -> bool {
    ROLE_TERMS.contains(&term.trim().to_ascii_lowercase().as_str())
}

pub struct AliasDetector {
    triggered_quoted: Regex,
    triggered_bare: Regex,
    parenthetical: Regex,
    subject_tail: Regex,
}

impl AliasDetector {
    pub fn new() -> Self {
        let trigger = r#"(?:hereinafter(?:\s+referred\s+to\s+as)?|a/k/a|f/k/a|d/b/a|also\s+known\s+as)"#;
        let triggered_quoted = Regex::new(&format!(
            r#"(?i)\b{trigger}[\s,]*(?:the\s+)?"(?P<term>[^"\n]{{1,40}})""#
        ))
        .unwrap();
        let triggered_bare = Regex::new(&format!(
            r"(?i)\b{trigger}[\s,]+(?:the\s+)?(?P<term>\p{{Lu}}[\w'-]*(?:\s+\p{{Lu}}[\w'-]*){{0,3}})"
        ))
        .unwrap();
        let parenthetical =
            Regex::new(r#"\(\s*(?:the\s+)?"(?P<term>[A-Z][^"\n]{0,38})"\s*\)"#).unwrap();
        // Trailing name-like run in the text preceding a definition.
        let subject_tail = Regex::new(
            r"([A-Z][A-Za-z'&.-]*(?:\s+(?:[A-Z][A-Za-z'&.-]*|of|and)){0,5})[\s,]*\(?$",
        )
        .unwrap();
        Self {
            triggered_quoted,
            triggered_bare,
            parenthetical,
            subject_tail,
        }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        for pattern in [&self.triggered_quoted, &self.parenthetical, &self.triggered_bare] {
            for caps in pattern.captures_iter(text) {
                let term = caps.name("term").unwrap();
                if spans
                    .iter()
                    .any(|s| s.start < term.end() && term.start() < s.end)
                {
                    continue;
                }
                let surface = term.as_str().trim();
                if surface.is_empty() {
                    continue;
                }
                let leading = term.as_str().len() - term.as_str().trim_start().len();
                let start = term.start() + leading;
                let whole_start = caps.get(0).unwrap().start();
                let attrs = SpanAttrs {
                    alias_term: Some(surface.to_string()),
                    alias_subject: self.subject_before(text, whole_start),
                    is_role: is_role_term(surface),
                    ..Default::default()
                };
                spans.push(
                    Span::new(
                        start,
                        start + surface.len(),
                        surface,
                        EntityLabel::AliasLabel,
                        "aliases",
                        0.97,
                    )
                    .with_attrs(attrs),
                );
            }
        }
        spans.sort_by_key(|s| s.start);
        spans
    }

    /// Best-effort subject guess: a trailing title-cased run on the same
    /// line, right before the definition.
    fn subject_before(&self, text: &str, def_start: usize) -> Option<String> {
        let line_start = text[..def_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let window_start = def_start.saturating_sub(80).max(line_start);
        let window = text[window_start..def_start].trim_end();
        let caps = self.subject_tail.captures(window)?;
        let guess = caps.get(1)?.as_str().trim();
        (!guess.is_empty()).then(|| guess.to_string())
    }
}

impl Default for AliasDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Span> {
        AliasDetector::new().detect(text)
    }

    #[test]
    fn parenthetical_role_definition() {
        let spans = detect(r#"John Doe (the "Buyer") agrees to purchase."#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Buyer");
        assert!(spans[0].attrs.is_role);
        assert_eq!(spans[0].attrs.alias_subject.as_deref(), Some("John Doe"));
    }

    #[test]
    fn parenthetical_nickname() {
        let spans = detect(r#"John Doe ("Morgan") signed below."#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Morgan");
        assert!(!spans[0].attrs.is_role);
    }

    #[test]
    fn hereinafter_quoted() {
        let spans = detect(r#"Acme Widgets LLC, hereinafter referred to as the "Supplier", shall..."#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Supplier");
        assert_eq!(
            spans[0].attrs.alias_subject.as_deref(),
            Some("Acme Widgets LLC")
        );
    }

    #[test]
    fn aka_bare_term() {
        let spans = detect("Robert Jones a/k/a Bobby Jones was present.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Bobby Jones");
    }

    #[test]
    fn dba_quoted() {
        let spans = detect(r#"Jane Roe d/b/a "Roe Consulting" invoices monthly."#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Roe Consulting");
    }

    #[test]
    fn no_false_positive_on_plain_parens() {
        assert!(detect("the amount (USD 500) is due").is_empty());
    }
}
