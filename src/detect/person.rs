//! Person-name heuristics and detector.
//!
//! A small, dependency-free scorer decides whether a capitalized token run
//! resembles a personal name. The rules are deterministic and intentionally
//! high precision; no gender inference is performed.
//!
//! Scoring:
//! * +0.45: at least two core tokens, or initials with a surname.
//! * +0.15: two or more core tokens; each additional core token up to two
//!   more adds another +0.15.
//! * +0.15: one or two initials alongside a core surname token.
//! * +0.10: recognized particle between given and surname (`de`, `van`, ...).
//! * +0.05: common suffix (`Jr.`, `III`, `Esq.`, `Ph.D.`, ...).
//! * -0.25: any token contains a digit.
//! * -0.20: all tokens uppercase and any token is a legal role/stopword.
//! * -0.30: a single token matching the role lexicon (`Buyer`, ...).
//!
//! The final score is clamped to `[0, 1]`; spans are emitted at `>= 0.60`.

use crate::models::{EntityLabel, Span};
use regex::Regex;

const PARTICLES: [&str; 17] = [
    "de", "del", "della", "di", "da", "van", "von", "der", "den", "dos", "das", "du", "la",
    "le", "of", "bin", "ibn",
];

const SUFFIXES: [&str; 12] = [
    "JR", "SR", "II", "III", "IV", "ESQ", "ESQUIRE", "PHD", "MD", "JD", "LLM", "CPA",
];

const HONORIFICS: [&str; 13] = [
    "mr", "ms", "mrs", "mx", "dr", "prof", "hon", "sir", "dame", "rev", "fr", "judge",
    "justice",
];

const ROLE_LEXICON: [&str; 8] = [
    "buyer",
    "seller",
    "plaintiff",
    "defendant",
    "appellant",
    "appellee",
    "petitioner",
    "respondent",
];

/// Organization words that never count as core name tokens.
const ORG_STOPWORDS: [&str; 17] = [
    "bank", "company", "co", "corp", "corporation", "inc", "llc", "llp", "ltd", "plc",
    "university", "college", "hospital", "association", "agency", "department", "section",
];

const UPPER_STOPWORDS: [&str; 14] = [
    "BUYER",
    "SELLER",
    "PLAINTIFF",
    "DEFENDANT",
    "APPELLANT",
    "APPELLEE",
    "PETITIONER",
    "RESPONDENT",
    "UNITED",
    "STATES",
    "BANK",
    "SECTION",
    "OF",
    "AMERICA",
];

/// Street designators; a candidate ending in one is an address, not a person.
const STREET_SUFFIXES: [&str; 18] = [
    "St", "Street", "Ave", "Avenue", "Rd", "Road", "Blvd", "Boulevard", "Ln", "Lane", "Dr",
    "Drive", "Ct", "Court", "Way", "Pl", "Place", "NW",
];

/// Capitalized prose words trimmed from candidate edges before scoring.
const COMMON_WORDS: [&str; 46] = [
    "Dear", "Sincerely", "Regards", "Thanks", "Hello", "The", "This", "That", "These",
    "Those", "Please", "Note", "Shall", "Will", "May", "Must", "Upon", "Whereas", "Witness",
    "Agreement", "Contract", "Section", "Article", "Exhibit", "Schedule", "Party", "Parties",
    "Court", "State", "County", "City", "United", "States", "America", "Date", "Effective",
    "From", "Subject", "Attention", "Office", "Power", "Attorney", "Notary", "Public",
    "Later", "Meanwhile",
];

fn is_initial_group(tok: &str) -> bool {
    // "J." or "J.D." style
    let mut rest = tok;
    let mut seen = 0;
    while !rest.is_empty() {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), Some('.')) if c.is_ascii_uppercase() => {
                seen += 1;
                rest = &rest[2..];
            }
            _ => return false,
        }
    }
    seen >= 1
}

fn is_particle(tok: &str) -> bool {
    PARTICLES.contains(&tok)
}

fn normalize_suffix(tok: &str) -> String {
    tok.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn is_suffix(tok: &str) -> bool {
    SUFFIXES.contains(&normalize_suffix(tok).as_str())
}

fn is_honorific(tok: &str) -> bool {
    HONORIFICS.contains(&tok.trim_end_matches('.').to_ascii_lowercase().as_str())
}

fn is_core_name_token(tok: &str) -> bool {
    if tok.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if ORG_STOPWORDS.contains(&tok.to_ascii_lowercase().as_str()) {
        return false;
    }
    let letters: String = tok.chars().filter(|&c| c != '-' && c != '\'').collect();
    if letters.is_empty() || !letters.chars().all(char::is_alphabetic) {
        return false;
    }
    tok.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Score a candidate string in `[0, 1]`.
pub fn score_person_name(text: &str) -> f64 {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let core: Vec<&&str> = tokens.iter().filter(|t| is_core_name_token(t)).collect();
    let initials: Vec<&&str> = tokens.iter().filter(|t| is_initial_group(t)).collect();
    let particles: Vec<&&str> = tokens.iter().filter(|t| is_particle(t)).collect();
    let suffixes: Vec<&&str> = tokens.iter().filter(|t| is_suffix(t)).collect();

    let mut score = 0.0_f64;

    if core.len() >= 2 || (!core.is_empty() && !initials.is_empty()) {
        score += 0.45;
        if core.len() >= 2 {
            score += 0.15;
            let additional = core.len().saturating_sub(2).min(2);
            score += additional as f64 * 0.15;
        }
    }

    if (1..=2).contains(&initials.len()) && !core.is_empty() {
        score += 0.15;
    }

    if !particles.is_empty() {
        score += 0.10;
    }

    if !suffixes.is_empty() {
        score += 0.05;
    }

    if tokens
        .iter()
        .any(|t| t.chars().any(|c| c.is_ascii_digit()))
    {
        score -= 0.25;
    }

    let all_upper = tokens
        .iter()
        .all(|t| t.chars().all(|c| !c.is_lowercase()));
    if all_upper
        && tokens.len() > 1
        && tokens
            .iter()
            .any(|t| UPPER_STOPWORDS.contains(&normalize_suffix(t).as_str()))
    {
        score -= 0.20;
    }

    if tokens.len() == 1 && ROLE_LEXICON.contains(&tokens[0].to_ascii_lowercase().as_str()) {
        score -= 0.30;
    }

    score.clamp(0.0, 1.0)
}

/// Whether `text` plausibly represents a personal name (score >= 0.60).
pub fn is_probable_person_name(text: &str) -> bool {
    score_person_name(text) >= 0.60
}

/// Parsed name structure used by the shape-preserving generator.
#[derive(Debug, Default, Clone)]
pub struct ParsedName {
    pub honorifics: Vec<String>,
    pub given: Vec<String>,
    pub particles: Vec<String>,
    pub surname: Vec<String>,
    pub suffixes: Vec<String>,
}

/// Split a name into honorifics, given tokens, particles, surname, suffixes.
pub fn parse_person_name(text: &str) -> ParsedName {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let mut parsed = ParsedName::default();

    while let Some(first) = tokens.first() {
        if is_honorific(first) {
            parsed.honorifics.push(first.to_string());
            tokens.remove(0);
        } else {
            break;
        }
    }
    while let Some(last) = tokens.last() {
        let trimmed = last.trim_start_matches(',');
        if is_suffix(trimmed) {
            parsed.suffixes.insert(0, last.to_string());
            tokens.pop();
        } else {
            break;
        }
    }

    if tokens.is_empty() {
        return parsed;
    }

    if let Some(first_particle) = tokens.iter().position(|t| is_particle(t)) {
        let mut last_particle = first_particle;
        while last_particle + 1 < tokens.len() && is_particle(tokens[last_particle + 1]) {
            last_particle += 1;
        }
        parsed.given = tokens[..first_particle].iter().map(|s| s.to_string()).collect();
        parsed.particles = tokens[first_particle..=last_particle]
            .iter()
            .map(|s| s.to_string())
            .collect();
        parsed.surname = tokens[last_particle + 1..].iter().map(|s| s.to_string()).collect();
    } else {
        let split = tokens.len().saturating_sub(1);
        parsed.given = tokens[..split].iter().map(|s| s.to_string()).collect();
        parsed.surname = tokens[split..].iter().map(|s| s.to_string()).collect();
    }
    parsed
}

/// Pattern-based person detector over capitalized token runs.
pub struct PersonDetector {
    candidate: Regex,
}

impl PersonDetector {
    pub fn new() -> Self {
        let candidate = Regex::new(
            r"(?x)
            (?:\b(?:Mr|Ms|Mrs|Mx|Dr|Prof|Hon|Judge|Justice)\.?\x20)?
            \b(?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+)
            (?:\x20(?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+|de|del|della|di|da|van|von|der|den|dos|das|du|la|le|bin|ibn)){1,4}
            (?:,?\x20(?:Jr\.?|Sr\.?|III\b|IV\b|II\b|Esq\.?|Ph\.D\.|M\.D\.|J\.D\.|CPA\b))?",
        )
        .unwrap();
        Self { candidate }
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        for m in self.candidate.find_iter(text) {
            let Some((start, end)) = Self::trim_candidate(text, m.start(), m.end()) else {
                continue;
            };
            let surface = &text[start..end];
            let tokens: Vec<&str> = surface.split_whitespace().collect();
            if tokens.len() < 2 {
                continue;
            }
            if let Some(last) = tokens.last() {
                if STREET_SUFFIXES.contains(&last.trim_end_matches('.')) {
                    continue;
                }
            }
            // Mostly-prose runs are headings or sentence onsets, not names.
            let common = tokens
                .iter()
                .filter(|t| COMMON_WORDS.contains(&t.trim_end_matches(['.', ','])))
                .count();
            if common * 2 >= tokens.len() {
                continue;
            }
            let score = score_person_name(surface);
            if score < 0.60 {
                continue;
            }
            spans.push(Span::new(
                start,
                end,
                surface,
                EntityLabel::Person,
                "person",
                score.min(0.95),
            ));
        }
        spans
    }

    /// Strip leading/trailing common prose words from the candidate range.
    fn trim_candidate(text: &str, mut start: usize, mut end: usize) -> Option<(usize, usize)> {
        loop {
            let surface = &text[start..end];
            let mut tokens = surface.split_whitespace();
            let first = tokens.next()?;
            if COMMON_WORDS.contains(&first.trim_end_matches(['.', ','])) {
                start += first.len();
                start += text[start..end].len() - text[start..end].trim_start().len();
                continue;
            }
            break;
        }
        loop {
            let surface = &text[start..end];
            let last = surface.split_whitespace().next_back()?;
            if COMMON_WORDS.contains(&last.trim_end_matches(['.', ','])) {
                end = start + surface.trim_end().len() - last.len();
                end = start + text[start..end].trim_end().len();
                continue;
            }
            break;
        }
        (start < end).then_some((start, end))
    }
}

impl Default for PersonDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_simple_names() {
        assert!(is_probable_person_name("John Doe"));
        assert!(is_probable_person_name("Mary Anne Smith"));
        assert!(is_probable_person_name("J. D. Salinger"));
        assert!(is_probable_person_name("Ludwig van Beethoven"));
    }

    #[test]
    fn rejects_non_names() {
        assert!(!is_probable_person_name("Buyer"));
        assert!(!is_probable_person_name("Acme Bank"));
        assert!(!is_probable_person_name("agreement"));
        assert!(!is_probable_person_name("Route 66"));
    }

    #[test]
    fn suffix_and_particle_bonus() {
        let base = score_person_name("John Smith");
        assert!(score_person_name("John Smith Jr.") > base);
        assert!(score_person_name("John van Smith") > base);
    }

    #[test]
    fn detects_name_in_prose() {
        let d = PersonDetector::new();
        let spans = d.detect("Whereas John Doe (the \"Buyer\") agrees to purchase.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "John Doe");
    }

    #[test]
    fn skips_street_lines() {
        let d = PersonDetector::new();
        assert!(d.detect("1600 Pennsylvania Ave").is_empty());
    }

    #[test]
    fn skips_prose_onsets() {
        let d = PersonDetector::new();
        assert!(d.detect("Please Note That payment is due.").is_empty());
        assert!(d.detect("Dear Sir,").is_empty());
    }

    #[test]
    fn parses_name_components() {
        let p = parse_person_name("Dr. John van der Berg Jr.");
        assert_eq!(p.honorifics, vec!["Dr."]);
        assert_eq!(p.given, vec!["John"]);
        assert_eq!(p.particles, vec!["van", "der"]);
        assert_eq!(p.surname, vec!["Berg"]);
        assert_eq!(p.suffixes, vec!["Jr."]);
    }
}
