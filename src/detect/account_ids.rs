//! Account and identifier detector.
//!
//! Finds financial and personal account numbers with high precision.
//! Detection proceeds in subtype passes, each combining a shape regex with
//! the subtype's checksum or structural validator. Supported subtypes, in
//! precedence order for overlap resolution:
//!
//! `iban` > `bic` > `aba` > `cc` > `ssn` > `ein` > `generic`
//!
//! Heuristics keep the false-positive rate down: ABA routing numbers
//! require a nearby routing keyword, purely alphabetic BIC candidates
//! require a SWIFT/BIC keyword, and generic account numbers only match when
//! anchored by an explicit account keyword.

use super::{rtrim_index, DetectContext};
use crate::models::{AccountSubtype, EntityLabel, Span, SpanAttrs};
use regex::Regex;

// ---------------------------------------------------------------------------
// Checksum validators, shared with the pseudonym generator and safety guard
// ---------------------------------------------------------------------------

/// Luhn checksum over a digit string.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        let mut d = (b - b'0') as u32;
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// ABA routing checksum: 3·d1 + 7·d2 + 1·d3 + ... mod 10 == 0.
pub fn aba_valid(digits: &str) -> bool {
    if digits.len() != 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let d: Vec<u32> = digits.bytes().map(|b| (b - b'0') as u32).collect();
    let sum = 3 * (d[0] + d[3] + d[6]) + 7 * (d[1] + d[4] + d[7]) + (d[2] + d[5] + d[8]);
    sum % 10 == 0
}

/// IBAN mod-97 check over the compact (no spaces) form.
pub fn iban_valid(compact: &str) -> bool {
    if !(15..=34).contains(&compact.len()) {
        return false;
    }
    let bytes = compact.as_bytes();
    if !bytes[0].is_ascii_alphabetic()
        || !bytes[1].is_ascii_alphabetic()
        || !bytes[2].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
    {
        return false;
    }
    // Move the first four characters to the end, then A=10 ... Z=35.
    let rearranged = compact[4..]
        .bytes()
        .chain(compact[..4].bytes())
        .collect::<Vec<u8>>();
    let mut rem: u32 = 0;
    for b in rearranged {
        let b = b.to_ascii_uppercase();
        if b.is_ascii_digit() {
            rem = (rem * 10 + (b - b'0') as u32) % 97;
        } else if b.is_ascii_uppercase() {
            let v = (b - b'A') as u32 + 10;
            rem = (rem * 100 + v) % 97;
        } else {
            return false;
        }
    }
    rem == 1
}

/// SSN structural validity: rejects 000/666/9xx areas, 00 group, 0000 serial.
pub fn ssn_valid(digits: &str) -> bool {
    if digits.len() != 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let area = &digits[..3];
    let group = &digits[3..5];
    let serial = &digits[5..];
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

const ROUTING_KEYWORDS: [&str; 3] = ["routing", "aba", "rtn"];
const BIC_KEYWORDS: [&str; 2] = ["bic", "swift"];
const CONTEXT_WINDOW: usize = 40;

/// Card scheme prefixes.
const SCHEMES: [(&str, &str); 6] = [
    ("visa", r"^4"),
    ("mastercard", r"^(5[1-5]|222[1-9]|22[3-9]\d|2[3-6]\d{2}|27[01]\d|2720)"),
    ("amex", r"^3[47]"),
    ("discover", r"^(6011|65|64[4-9])"),
    ("jcb", r"^35"),
    ("diners", r"^(36|38)"),
];

/// ISO 3166 alpha-2 codes accepted in IBAN and BIC country positions.
const COUNTRY_CODES: [&str; 52] = [
    "AD", "AT", "AU", "BE", "BG", "BH", "BR", "CA", "CH", "CN", "CY", "CZ", "DE", "DK", "EE",
    "ES", "FI", "FR", "GB", "GI", "GR", "HK", "HR", "HU", "IE", "IL", "IN", "IS", "IT", "JP",
    "KR", "KW", "LI", "LT", "LU", "LV", "MC", "MT", "MX", "NL", "NO", "NZ", "PL", "PT", "QA",
    "RO", "SA", "SE", "SG", "SK", "TR", "US",
];

struct Candidate {
    span: Span,
    rank: u8,
}

pub struct AccountIdDetector {
    iban: Regex,
    bic: Regex,
    aba: Regex,
    cc: Regex,
    ssn: Regex,
    ein: Regex,
    generic: Regex,
    schemes: Vec<(&'static str, Regex)>,
}

impl AccountIdDetector {
    pub fn new() -> Self {
        Self {
            iban: Regex::new(r"\b[A-Z]{2}[0-9]{2}(?: ?[A-Z0-9]{1,4}){2,}\b").unwrap(),
            bic: Regex::new(r"\b[A-Z]{6}[A-Z0-9]{2}(?:[A-Z0-9]{3})?\b").unwrap(),
            aba: Regex::new(r"\b[0-9]{9}\b").unwrap(),
            cc: Regex::new(r"\b\d(?:[ -]?\d){12,18}\b").unwrap(),
            ssn: Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(),
            ein: Regex::new(r"\b\d{2}-\d{7}\b").unwrap(),
            // Space-separated continuation chunks must start with a digit so
            // the capture stops before following prose.
            generic: Regex::new(
                r"(?i)\b(?:acct|account|a/c|ref|reference)\s*(?:#|no\.?|number)?\s*[:#]?\s*([A-Za-z0-9][A-Za-z0-9-]{3,}(?: \d[A-Za-z0-9-]*)*)",
            )
            .unwrap(),
            schemes: SCHEMES
                .iter()
                .map(|(name, pat)| (*name, Regex::new(pat).unwrap()))
                .collect(),
        }
    }

    pub fn detect(&self, text: &str, ctx: &DetectContext<'_>) -> Vec<Span> {
        let mut candidates: Vec<Candidate> = Vec::new();

        self.detect_iban(text, &mut candidates);
        self.detect_bic(text, &mut candidates);
        self.detect_aba(text, &mut candidates);
        self.detect_cc(text, &mut candidates);
        self.detect_ssn(text, &mut candidates);
        self.detect_ein(text, &mut candidates);
        if ctx.config.detectors.account_ids.generic {
            self.detect_generic(text, &mut candidates);
        }

        // Resolve overlaps by subtype precedence, then position.
        candidates.sort_by_key(|c| (c.rank, c.span.start, c.span.end));
        let mut kept: Vec<Span> = Vec::new();
        for cand in candidates {
            if kept.iter().any(|k| k.overlaps(&cand.span)) {
                continue;
            }
            kept.push(cand.span);
        }
        kept.sort_by_key(|s| s.start);
        kept
    }

    fn has_context_keyword(text: &str, start: usize, keywords: &[&str]) -> bool {
        let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let window_start = start.saturating_sub(CONTEXT_WINDOW).max(line_start);
        let context = text[window_start..start].to_ascii_lowercase();
        keywords.iter().any(|k| context.contains(k))
    }

    fn push(
        candidates: &mut Vec<Candidate>,
        start: usize,
        end: usize,
        text: &str,
        subtype: AccountSubtype,
        normalized: String,
        scheme: Option<String>,
        confidence: f64,
    ) {
        let attrs = SpanAttrs {
            subtype: Some(subtype),
            normalized: Some(normalized),
            scheme,
            ..Default::default()
        };
        let span = Span::new(
            start,
            end,
            &text[start..end],
            EntityLabel::AccountId,
            "account_ids",
            confidence,
        )
        .with_attrs(attrs);
        candidates.push(Candidate {
            span,
            rank: subtype.rank(),
        });
    }

    fn detect_iban(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.iban.find_iter(text) {
            let end = rtrim_index(text, m.end());
            let raw = &text[m.start()..end];
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let country = &compact[..2];
            if !COUNTRY_CODES.contains(&country) || !iban_valid(&compact) {
                continue;
            }
            Self::push(
                out,
                m.start(),
                end,
                text,
                AccountSubtype::Iban,
                compact.to_ascii_uppercase(),
                None,
                0.99,
            );
        }
    }

    fn detect_bic(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.bic.find_iter(text) {
            let end = rtrim_index(text, m.end());
            let raw = &text[m.start()..end];
            if raw.len() != 8 && raw.len() != 11 {
                continue;
            }
            let country = &raw[4..6];
            if !COUNTRY_CODES.contains(&country) {
                continue;
            }
            // All-letter candidates look like ordinary words; demand context.
            if raw.bytes().all(|b| b.is_ascii_alphabetic())
                && !Self::has_context_keyword(text, m.start(), &BIC_KEYWORDS)
            {
                continue;
            }
            Self::push(
                out,
                m.start(),
                end,
                text,
                AccountSubtype::Bic,
                raw.to_string(),
                None,
                0.98,
            );
        }
    }

    fn detect_aba(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.aba.find_iter(text) {
            if !Self::has_context_keyword(text, m.start(), &ROUTING_KEYWORDS) {
                continue;
            }
            let raw = &text[m.start()..m.end()];
            if !aba_valid(raw) {
                continue;
            }
            Self::push(
                out,
                m.start(),
                m.end(),
                text,
                AccountSubtype::Aba,
                raw.to_string(),
                None,
                0.99,
            );
        }
    }

    fn detect_cc(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.cc.find_iter(text) {
            let end = rtrim_index(text, m.end());
            let raw = &text[m.start()..end];
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            if !(13..=19).contains(&digits.len()) || !luhn_valid(&digits) {
                continue;
            }
            let scheme = self
                .schemes
                .iter()
                .find(|(_, pat)| pat.is_match(&digits))
                .map(|(name, _)| name.to_string());
            Self::push(
                out,
                m.start(),
                end,
                text,
                AccountSubtype::Cc,
                digits,
                scheme,
                0.99,
            );
        }
    }

    fn detect_ssn(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.ssn.find_iter(text) {
            let raw = &text[m.start()..m.end()];
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            if !ssn_valid(&digits) {
                continue;
            }
            Self::push(
                out,
                m.start(),
                m.end(),
                text,
                AccountSubtype::Ssn,
                digits,
                None,
                0.99,
            );
        }
    }

    fn detect_ein(&self, text: &str, out: &mut Vec<Candidate>) {
        for m in self.ein.find_iter(text) {
            let raw = &text[m.start()..m.end()];
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            Self::push(
                out,
                m.start(),
                m.end(),
                text,
                AccountSubtype::Ein,
                digits,
                None,
                0.97,
            );
        }
    }

    fn detect_generic(&self, text: &str, out: &mut Vec<Candidate>) {
        for caps in self.generic.captures_iter(text) {
            let m = caps.get(1).unwrap();
            let end = rtrim_index(text, m.end());
            if end <= m.start() {
                continue;
            }
            let raw = text[m.start()..end].trim_end();
            let end = m.start() + raw.len();
            let compact: String = raw
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_uppercase();
            let digit_count = compact.bytes().filter(|b| b.is_ascii_digit()).count();
            if digit_count < 6 || compact.len() > 34 {
                continue;
            }
            Self::push(
                out,
                m.start(),
                end,
                text,
                AccountSubtype::Generic,
                compact,
                None,
                0.90,
            );
        }
    }
}

impl Default for AccountIdDetector {
    fn default() -> Self {
        Self::new()
    }
}
