//! Person and organization name synthesis.
//!
//! Small curated corpora of neutral given names, surnames, and organization
//! roots are embedded directly so the generator works fully offline. Token
//! picks prefer candidates of comparable length (within two characters) so
//! replacements keep roughly the same visual weight as the originals.

use super::shape::{apply_case, case_class, CaseClass};
use crate::detect::person::parse_person_name;
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

pub const GIVEN_NAMES: [&str; 96] = [
    "Alex", "Taylor", "Jordan", "Morgan", "Casey", "Jamie", "Riley", "Avery", "Cameron",
    "Devin", "Sydney", "Quinn", "Drew", "Reese", "Peyton", "Rowan", "Hayden", "Skyler",
    "Corey", "Robin", "Jesse", "Leslie", "Tracy", "Kerry", "Logan", "Harley", "Blair",
    "Dana", "Sage", "Kendall", "Bailey", "Emerson", "Finley", "Hunter", "Parker", "Dakota",
    "Adrian", "Sam", "Charlie", "Lee", "Noel", "James", "John", "Robert", "Michael",
    "William", "David", "Richard", "Joseph", "Thomas", "Charles", "Daniel", "Matthew",
    "Anthony", "Mark", "Steven", "Paul", "Andrew", "Joshua", "Kenneth", "Kevin", "Brian",
    "George", "Timothy", "Edward", "Jason", "Ryan", "Jacob", "Eric", "Stephen", "Jonathan",
    "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan", "Jessica",
    "Sarah", "Karen", "Nancy", "Lisa", "Margaret", "Sandra", "Ashley", "Kimberly", "Emily",
    "Donna", "Michelle", "Carol", "Amanda", "Melissa", "Rebecca", "Laura", "Grace",
];

pub const SURNAMES: [&str; 96] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
    "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young",
    "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green",
    "Adams", "Nelson", "Baker", "Hall", "Rivera", "Campbell", "Mitchell", "Carter",
    "Roberts", "Gomez", "Phillips", "Evans", "Turner", "Diaz", "Parker", "Cruz",
    "Edwards", "Collins", "Reyes", "Stewart", "Morris", "Morales", "Murphy", "Cook",
    "Rogers", "Gutierrez", "Ortiz", "Morgan", "Cooper", "Peterson", "Bailey", "Reed",
    "Kelly", "Howard", "Ramos", "Kim", "Cox", "Ward", "Richardson", "Watson", "Brooks",
    "Chavez", "Wood", "Bennett", "Gray", "Mendoza", "Ruiz", "Hughes", "Price", "Alvarez",
    "Castillo", "Sanders", "Patel", "Myers", "Long",
];

pub const ORG_ROOTS: [&str; 33] = [
    "Apex", "Summit", "Horizon", "Atlas", "Vector", "Nimbus", "Pioneer", "Vertex",
    "Northbridge", "Fairview", "Sterling", "Evergreen", "Crescent", "Cascade", "Frontier",
    "Liberty", "Heritage", "Vanguard", "Momentum", "Aurora", "Legacy", "Prestige",
    "Endeavor", "Zenith", "Vista", "Union", "Beacon", "Guardian", "Foundry", "Ridge",
    "Lakeside", "Cedar", "Oak",
];

fn org_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Bank designators (Trust, Credit Union) are not legal suffixes;
        // the bank generator rebuilds those from the core instead.
        Regex::new(
            r"(?i)(,?\s+(?:Inc\.?|LLC|LLP|Ltd\.?|PLC|GmbH|S\.A\.|N\.A\.|Corp\.?|Corporation|Company|Co\.))+\s*$",
        )
        .unwrap()
    })
}

fn simplified(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Pick a pool token of comparable length (±2 chars when possible).
fn pick<'a>(pool: &[&'a str], target_len: usize, rng: &mut StdRng) -> &'a str {
    let near: Vec<&'a str> = pool
        .iter()
        .copied()
        .filter(|w| w.len().abs_diff(target_len) <= 2)
        .collect();
    let source: &[&'a str] = if near.is_empty() { pool } else { &near };
    source[rng.gen_range(0..source.len())]
}

fn is_initial_group(tok: &str) -> bool {
    let mut rest = tok;
    let mut seen = 0;
    while !rest.is_empty() {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), Some('.')) if c.is_ascii_alphabetic() => {
                seen += 1;
                rest = &rest[2..];
            }
            _ => return false,
        }
    }
    seen >= 1
}

fn random_initials(tok: &str, rng: &mut StdRng) -> String {
    tok.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                (b'A' + rng.gen_range(0..26u8)) as char
            } else {
                c
            }
        })
        .collect()
}

/// Replace one name token, preserving casing and interior punctuation.
fn replace_token(tok: &str, pool: &[&str], rng: &mut StdRng) -> String {
    if is_initial_group(tok) {
        return random_initials(tok, rng);
    }
    let class = case_class(tok);
    let mut out = String::new();
    for (i, segment) in tok.split(['-', '\'']).enumerate() {
        if i > 0 {
            // Reinstate the separator that preceded this segment.
            let consumed: usize = tok
                .split(['-', '\''])
                .take(i)
                .map(|s| s.len() + 1)
                .sum::<usize>()
                - 1;
            out.push(tok.as_bytes()[consumed] as char);
        }
        if segment.is_empty() {
            continue;
        }
        let picked = pick(pool, segment.len(), rng);
        out.push_str(&apply_case(
            if class == CaseClass::Mixed {
                case_class(segment)
            } else {
                class
            },
            picked,
        ));
    }
    out
}

/// Person-like pseudonym shaped like `source`.
///
/// Token counts mirror the source; honorifics, particles, and suffixes are
/// preserved verbatim while given and surname tokens are replaced.
pub fn person_like(source: &str, rng: &mut StdRng) -> String {
    let parsed = parse_person_name(source);

    let mut parts: Vec<String> = Vec::new();
    parts.extend(parsed.honorifics.iter().cloned());
    for tok in &parsed.given {
        parts.push(replace_token(tok, &GIVEN_NAMES, rng));
    }
    parts.extend(parsed.particles.iter().cloned());
    for tok in &parsed.surname {
        parts.push(replace_token(tok, &SURNAMES, rng));
    }
    parts.extend(parsed.suffixes.iter().cloned());

    let candidate = parts.join(" ");
    if candidate.trim().is_empty() {
        source.to_string()
    } else {
        candidate
    }
}

/// Split an organization name into its core and trailing legal suffix.
pub fn split_org_suffix(source: &str) -> (String, String) {
    match org_suffix_re().find(source.trim_end()) {
        Some(m) => (
            source[..m.start()].trim_end().to_string(),
            source[m.start()..].trim().to_string(),
        ),
        None => (source.trim_end().to_string(), String::new()),
    }
}

/// Organization-like pseudonym: plausible made-up roots, suffix verbatim.
pub fn org_like(source: &str, rng: &mut StdRng) -> String {
    let (core, suffix) = split_org_suffix(source);
    let token_count = core.split_whitespace().count().clamp(1, 3);
    let tokens: Vec<&str> = (0..token_count)
        .map(|_| ORG_ROOTS[rng.gen_range(0..ORG_ROOTS.len())])
        .collect();
    assemble_org(&tokens.join(" "), &core, &suffix)
}

/// Bank-like pseudonym: `Bank` and trust designators are preserved.
pub fn bank_like(source: &str, rng: &mut StdRng) -> String {
    let (core, suffix) = split_org_suffix(source);
    let lower = core.to_lowercase();
    let needs_trust_company = lower.contains("trust company");
    let needs_trust = lower.contains("trust");
    let is_credit_union = lower.contains("credit union");
    let non_keyword_tokens = core
        .split_whitespace()
        .filter(|t| {
            !matches!(
                simplified(t).as_str(),
                "bank" | "banc" | "bancorp" | "trust" | "savings" | "credit" | "union"
            )
        })
        .count()
        .clamp(1, 2);

    let base: Vec<&str> = (0..non_keyword_tokens)
        .map(|_| ORG_ROOTS[rng.gen_range(0..ORG_ROOTS.len())])
        .collect();
    let has_bank = lower.contains("bank");
    let mut name = base.join(" ");
    if is_credit_union {
        name.push_str(" Credit Union");
    } else if has_bank {
        name.push_str(" Bank");
        if needs_trust_company {
            name.push_str(" Trust Company");
        } else if needs_trust {
            name.push_str(" & Trust");
        }
    } else if needs_trust_company {
        name.push_str(" Trust Company");
    } else if needs_trust {
        name.push_str(" Trust");
    } else {
        name.push_str(" Bank");
    }
    assemble_org(&name, &core, &suffix)
}

fn assemble_org(name: &str, source_core: &str, suffix: &str) -> String {
    let mut assembled = if case_class(source_core) == CaseClass::Upper {
        name.to_uppercase()
    } else {
        name.to_string()
    };
    if !suffix.is_empty() {
        if !suffix.starts_with(',') {
            assembled.push(' ');
            assembled.push_str(suffix);
        } else {
            assembled.push_str(suffix);
        }
    }
    assembled
}
