//! Address synthesis.
//!
//! Generates plausible but fictitious address elements from small curated
//! lists. House numbers stay within ±50% of the original magnitude while
//! keeping the same digit count, ZIP codes keep their digit count and
//! formatting, and unit identifiers are regenerated character-class by
//! character-class.

use crate::models::AddressLineKind;
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

pub const STREET_NAMES: [&str; 40] = [
    "Oak", "Maple", "Pine", "Cedar", "Elm", "Walnut", "Willow", "Birch", "Spruce",
    "Chestnut", "Ash", "Holly", "Magnolia", "Sycamore", "Poplar", "Hickory", "Laurel",
    "Juniper", "Aspen", "Alder", "Beech", "Cypress", "Hemlock", "Linden", "Redwood",
    "Fir", "Briar", "Brook", "Meadow", "Sunset", "Ridge", "Valley", "River", "Forest",
    "Hill", "Lake", "Park", "Stone", "Glen", "Highland",
];

pub const STREET_SUFFIXES: [&str; 9] = ["St", "Ave", "Rd", "Blvd", "Ln", "Dr", "Ct", "Way", "Pl"];

pub const CITY_NAMES: [&str; 20] = [
    "Fairview", "Riverton", "Hillcrest", "Lakeside", "Brookfield", "Westfield",
    "Meadowview", "Oakdale", "Pinehurst", "Cedar Grove", "Clearwater", "Grandview",
    "Highland", "Mapleton", "Northfield", "Pleasantville", "Rosewood", "Silverton",
    "Springfield", "Woodland",
];

pub const STATE_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV",
    "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN",
    "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY",
];

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(Apt|Apartment|Suite|Ste|Unit|#)\b\.?").unwrap())
}

fn house_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,6}").unwrap())
}

/// House number within ±50% of the original, with the same digit count.
fn house_number_like(original: u64, rng: &mut StdRng) -> u64 {
    let digits = original.max(1).ilog10() + 1;
    let floor = if digits == 1 { 1 } else { 10u64.pow(digits - 1) };
    let ceil = 10u64.pow(digits) - 1;
    let lo = (original / 2).max(floor);
    let hi = (original + original / 2).min(ceil);
    if lo >= hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

fn digits_like(count: usize, rng: &mut StdRng) -> String {
    (0..count).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

/// Regenerate `ident` character-class by character-class.
fn mutate_ident(ident: &str, rng: &mut StdRng) -> String {
    ident
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                (b'A' + rng.gen_range(0..26u8)) as char
            } else if c.is_ascii_lowercase() {
                (b'a' + rng.gen_range(0..26u8)) as char
            } else if c.is_ascii_digit() {
                char::from(b'0' + rng.gen_range(0..10u8))
            } else {
                c
            }
        })
        .collect()
}

/// Street line shaped like `source`.
pub fn street_line_like(source: &str, rng: &mut StdRng) -> String {
    let unit_part = unit_re()
        .find(source)
        .map(|m| source[m.start()..].trim().to_string());
    let core = match unit_re().find(source) {
        Some(m) => source[..m.start()].trim_end_matches([',', ' ']),
        None => source.trim(),
    };

    let number = house_number_re()
        .find(core)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(100);
    let rest = house_number_re().replace(core, "");
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let pre_dir = tokens
        .first()
        .filter(|t| is_directional(t))
        .map(|t| t.to_string());
    let post_dir = tokens
        .last()
        .filter(|t| is_directional(t))
        .map(|t| t.to_string());

    let mut line = format!("{}", house_number_like(number, rng));
    if let Some(d) = &pre_dir {
        line.push(' ');
        line.push_str(d);
    }
    line.push(' ');
    line.push_str(STREET_NAMES[rng.gen_range(0..STREET_NAMES.len())]);
    line.push(' ');
    line.push_str(STREET_SUFFIXES[rng.gen_range(0..STREET_SUFFIXES.len())]);
    if let Some(d) = &post_dir {
        line.push(' ');
        line.push_str(d);
    }
    if let Some(unit) = unit_part {
        line.push_str(", ");
        line.push_str(&unit_line_like(&unit, rng));
    }
    line
}

fn is_directional(tok: &str) -> bool {
    let t = tok.trim_end_matches('.');
    (1..=2).contains(&t.len()) && t.chars().all(|c| "NSEW".contains(c))
}

/// Unit/apartment line shaped like `source`.
pub fn unit_line_like(source: &str, rng: &mut StdRng) -> String {
    match unit_re().find(source) {
        Some(m) => {
            let keyword = m.as_str();
            let ident = source[m.end()..].trim();
            let new_ident = mutate_ident(ident, rng);
            if new_ident.is_empty() {
                keyword.to_string()
            } else if keyword.ends_with('#') {
                format!("{keyword}{new_ident}")
            } else {
                format!("{keyword} {new_ident}")
            }
        }
        None => mutate_ident(source, rng),
    }
}

/// City, state, ZIP line with ZIP digit count preserved.
pub fn city_state_zip_like(source: &str, rng: &mut StdRng) -> String {
    let city = CITY_NAMES[rng.gen_range(0..CITY_NAMES.len())];
    let state = STATE_CODES[rng.gen_range(0..STATE_CODES.len())];
    let zip9 = source
        .rsplit(' ')
        .next()
        .is_some_and(|z| z.len() == 10 && z.contains('-'));
    let zip = if zip9 {
        format!("{}-{}", digits_like(5, rng), digits_like(4, rng))
    } else {
        digits_like(5, rng)
    };
    format!("{city}, {state} {zip}")
}

/// PO Box line preserving the label shape.
pub fn po_box_like(source: &str, rng: &mut StdRng) -> String {
    let digit_count = source.chars().filter(char::is_ascii_digit).count().clamp(3, 5);
    let prefix_end = source
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(source.len());
    let prefix = source[..prefix_end].trim_end();
    let mut number = digits_like(digit_count, rng);
    // Box numbers do not start with zero.
    if number.starts_with('0') {
        number.replace_range(0..1, "1");
    }
    format!("{prefix} {number}")
}

/// Classify a line when the detector did not record its kind.
pub fn classify_line(line: &str) -> AddressLineKind {
    if unit_re().find(line).is_some_and(|m| m.start() == 0) {
        AddressLineKind::Unit
    } else if line.to_lowercase().contains("box") {
        AddressLineKind::PoBox
    } else if line.contains(',') && line.chars().filter(char::is_ascii_digit).count() >= 5 {
        AddressLineKind::CityStateZip
    } else {
        AddressLineKind::Street
    }
}

/// Address block: each line pseudonymized per its recorded kind.
pub fn block_like(source: &str, line_kinds: &[AddressLineKind], rng: &mut StdRng) -> String {
    let mut out_lines: Vec<String> = Vec::new();
    let mut kind_idx = 0;
    for line in source.lines() {
        if line.trim().is_empty() {
            out_lines.push(String::new());
            continue;
        }
        let kind = line_kinds
            .get(kind_idx)
            .copied()
            .unwrap_or_else(|| classify_line(line));
        kind_idx += 1;
        let replaced = match kind {
            AddressLineKind::Street => street_line_like(line, rng),
            AddressLineKind::Unit => unit_line_like(line.trim(), rng),
            AddressLineKind::CityStateZip => city_state_zip_like(line, rng),
            AddressLineKind::PoBox => po_box_like(line, rng),
        };
        out_lines.push(replaced);
    }
    out_lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudo::seed::{KeyScope, SeedMaterial};

    fn rng() -> StdRng {
        SeedMaterial::derive(Some("test-secret"), KeyScope::PerDocument, "doc")
            .cluster_key("address", "block")
            .mention_rng("sig", 0)
    }

    #[test]
    fn house_number_keeps_digit_count() {
        let mut r = rng();
        for original in [7u64, 42, 850, 1600, 99999] {
            let digits = original.to_string().len();
            for _ in 0..20 {
                let n = house_number_like(original, &mut r);
                assert_eq!(n.to_string().len(), digits, "digit count changed for {original}");
            }
        }
    }

    #[test]
    fn street_line_keeps_directionals() {
        let mut r = rng();
        let out = street_line_like("1600 Pennsylvania Ave NW", &mut r);
        assert!(out.ends_with(" NW"), "directional lost: {out}");
        assert!(!out.contains("Pennsylvania"));
        let number: u64 = out.split(' ').next().unwrap().parse().unwrap();
        assert_eq!(number.to_string().len(), 4);
    }

    #[test]
    fn unit_line_keeps_keyword() {
        let mut r = rng();
        let out = unit_line_like("Suite 210", &mut r);
        assert!(out.starts_with("Suite "));
        assert_eq!(out.len(), "Suite 210".len());
    }

    #[test]
    fn city_state_zip_keeps_zip_width() {
        let mut r = rng();
        let out5 = city_state_zip_like("Washington, DC 20500", &mut r);
        assert!(Regex::new(r"^[A-Za-z .]+, [A-Z]{2} \d{5}$").unwrap().is_match(&out5));
        let out9 = city_state_zip_like("Cedar Grove, NJ 07009-1234", &mut r);
        assert!(out9.ends_with(|c: char| c.is_ascii_digit()));
        assert!(Regex::new(r"\d{5}-\d{4}$").unwrap().is_match(&out9));
    }

    #[test]
    fn po_box_keeps_label() {
        let mut r = rng();
        let out = po_box_like("P.O. Box 1297", &mut r);
        assert!(out.starts_with("P.O. Box "), "label lost: {out}");
    }

    #[test]
    fn block_replaces_every_line() {
        let mut r = rng();
        let source = "1600 Pennsylvania Ave NW\nWashington, DC 20500";
        let out = block_like(
            source,
            &[AddressLineKind::Street, AddressLineKind::CityStateZip],
            &mut r,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(!out.contains("Pennsylvania"));
        assert!(!out.contains("Washington"));
        assert!(!out.contains("20500"));
    }
}
