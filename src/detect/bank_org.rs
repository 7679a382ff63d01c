//! Lexicon-driven organization and bank detector.
//!
//! Proper-noun sequences carrying a legal suffix (`Inc`, `LLC`, `N.A.`,
//! `Ltd`, `GmbH`, `S.A.`, ...) are emitted as `GENERIC_ORG`. Names built
//! around bank-indicative keywords (`Bank`, `Trust`, `Savings`,
//! `Credit Union`) are emitted as `BANK_ORG` whether or not a suffix is
//! present, and the suffix stays inside the span so the generator can
//! preserve it.

use crate::models::{EntityLabel, Span, SpanAttrs};
use regex::Regex;

const BANK_KEYWORDS: [&str; 5] = ["Bank", "Banc", "Trust", "Savings", "Bancorp"];

pub struct BankOrgDetector {
    suffixed: Regex,
    bankish: Regex,
}

impl BankOrgDetector {
    pub fn new() -> Self {
        let suffixed = Regex::new(
            r"(?x)
            \b(
                [A-Z][A-Za-z&'.-]*
                (?:\x20(?:[A-Z][A-Za-z&'.-]*|of|the|and|&)){0,5}
            )
            ,?\x20
            (Corporation|Incorporated|Company|Corp\.?|Inc\.?|LLC|LLP|Ltd\.?|PLC|GmbH|S\.A\.|N\.A\.|Co\.)",
        )
        .unwrap();
        let bankish = Regex::new(
            r"(?x)
            \b(
                (?:[A-Z][A-Za-z&'-]*\x20){1,4}
                (?:Bank|Banc|Bancorp|Trust|Savings|Credit\x20Union)
                (?:\x20(?:of|for)(?:\x20[A-Z][A-Za-z'-]*){1,3})?
            )\b",
        )
        .unwrap();
        Self { suffixed, bankish }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut candidates: Vec<Span> = Vec::new();

        for caps in self.suffixed.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let core = caps.get(1).unwrap().as_str();
            let label = if Self::is_bankish(core) {
                EntityLabel::BankOrg
            } else {
                EntityLabel::GenericOrg
            };
            let confidence = if label == EntityLabel::BankOrg { 0.93 } else { 0.90 };
            let attrs = SpanAttrs {
                normalized: Some(whole.as_str().to_string()),
                ..Default::default()
            };
            candidates.push(
                Span::new(
                    whole.start(),
                    whole.end(),
                    whole.as_str(),
                    label,
                    "bank_org",
                    confidence,
                )
                .with_attrs(attrs),
            );
        }

        for m in self.bankish.find_iter(text) {
            let attrs = SpanAttrs {
                normalized: Some(m.as_str().to_string()),
                ..Default::default()
            };
            candidates.push(
                Span::new(
                    m.start(),
                    m.end(),
                    m.as_str(),
                    EntityLabel::BankOrg,
                    "bank_org",
                    0.92,
                )
                .with_attrs(attrs),
            );
        }

        // The two patterns overlap on suffixed bank names; keep the longer
        // span, preferring BANK_ORG on equal length.
        candidates.sort_by_key(|s| {
            (
                std::cmp::Reverse(s.end - s.start),
                s.label != EntityLabel::BankOrg,
                s.start,
            )
        });
        let mut kept: Vec<Span> = Vec::new();
        for cand in candidates {
            if kept.iter().any(|k| k.overlaps(&cand)) {
                continue;
            }
            kept.push(cand);
        }
        kept.sort_by_key(|s| s.start);
        kept
    }

    fn is_bankish(core: &str) -> bool {
        core.split_whitespace()
            .any(|tok| BANK_KEYWORDS.contains(&tok.trim_matches(|c: char| !c.is_alphanumeric())))
            || core.contains("Credit Union")
    }
}

impl Default for BankOrgDetector {
    fn default() -> Self {
        Self::new()
    }
}
