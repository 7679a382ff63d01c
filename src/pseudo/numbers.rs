//! Numeric identifier, phone, and email synthesis.
//!
//! Replacements preserve the visible formatting of the original (spacing,
//! dashes, parentheses) while regenerating the digits. Checksummed subtypes
//! are regenerated to satisfy their own checksum, with leading digits forced
//! away from real issuer ranges.

use crate::detect::account_ids::{aba_valid, iban_valid, luhn_valid, ssn_valid};
use crate::models::AccountSubtype;
use rand::rngs::StdRng;
use rand::Rng;

/// Pour `digits` into the digit positions of `template`, leaving all other
/// characters in place.
pub fn format_digits_like(template: &str, digits: &str) -> String {
    let mut source = digits.chars();
    template
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                source.next().unwrap_or('0')
            } else {
                c
            }
        })
        .collect()
}

fn random_digits(count: usize, rng: &mut StdRng) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn random_upper(count: usize, rng: &mut StdRng) -> String {
    (0..count)
        .map(|_| (b'A' + rng.gen_range(0..26u8)) as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Checksummed identifiers
// ---------------------------------------------------------------------------

/// Luhn-valid card number of the same length and formatting.
///
/// The leading digit is forced to `9` (shared/national use, not a real
/// issuer range) and the check digit recomputed.
pub fn cc_like(source: &str, rng: &mut StdRng) -> String {
    let length = source.chars().filter(|c| c.is_ascii_digit()).count();
    let mut digits = String::from("9");
    digits.push_str(&random_digits(length - 2, rng));
    digits.push('0');
    let check = luhn_check_digit(&digits[..length - 1]);
    digits.replace_range(length - 1.., &check.to_string());
    debug_assert!(luhn_valid(&digits));
    format_digits_like(source, &digits)
}

fn luhn_check_digit(payload: &str) -> u32 {
    // Checksum of payload + "0", then the digit that cancels it.
    let mut sum = 0u32;
    for (i, b) in payload.bytes().rev().enumerate() {
        let mut d = (b - b'0') as u32;
        if i % 2 == 0 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    (10 - sum % 10) % 10
}

/// ABA routing number with a valid 3-7-1 checksum.
pub fn aba_like(source: &str, rng: &mut StdRng) -> String {
    let mut d: Vec<u32> = (0..8).map(|_| rng.gen_range(0..10)).collect();
    // First two digits form the Federal Reserve district; 99 is unassigned.
    d[0] = 9;
    d[1] = 9;
    let partial = 3 * (d[0] + d[3] + d[6]) + 7 * (d[1] + d[4] + d[7]) + (d[2] + d[5]);
    let last = (10 - partial % 10) % 10;
    d.push(last);
    let digits: String = d.iter().map(|n| char::from(b'0' + *n as u8)).collect();
    debug_assert!(aba_valid(&digits));
    format_digits_like(source, &digits)
}

/// IBAN of the same length and country, mod-97 valid, with a different bank
/// code.
pub fn iban_like(source: &str, rng: &mut StdRng) -> String {
    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    let country: String = compact.chars().take(2).collect();
    let bban: String = compact.chars().skip(4).collect();
    // Regenerate the BBAN per character class; letters stay letters so the
    // national format keeps its shape.
    let new_bban: String = bban
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                char::from(b'0' + rng.gen_range(0..10u8))
            } else if c.is_ascii_alphabetic() {
                (b'A' + rng.gen_range(0..26u8)) as char
            } else {
                c
            }
        })
        .collect();
    let check = iban_check_digits(&country, &new_bban);
    let rebuilt = format!("{country}{check:02}{new_bban}");
    debug_assert!(iban_valid(&rebuilt));
    // Re-flow into the source's grouping (spaces every 4 in display forms).
    let mut out = String::with_capacity(source.len());
    let mut chars = rebuilt.chars();
    for c in source.chars() {
        if c.is_whitespace() {
            out.push(c);
        } else {
            out.push(chars.next().unwrap_or('0'));
        }
    }
    out
}

fn iban_check_digits(country: &str, bban: &str) -> u32 {
    let mut rem: u32 = 0;
    let sequence = bban
        .bytes()
        .chain(country.bytes())
        .chain(*b"00");
    for b in sequence {
        let b = b.to_ascii_uppercase();
        if b.is_ascii_digit() {
            rem = (rem * 10 + (b - b'0') as u32) % 97;
        } else {
            rem = (rem * 100 + (b - b'A') as u32 + 10) % 97;
        }
    }
    98 - rem
}

/// Syntactically valid SSN avoiding forbidden prefixes.
pub fn ssn_like(source: &str, rng: &mut StdRng) -> String {
    loop {
        let area = rng.gen_range(1..=899u32);
        if area == 666 {
            continue;
        }
        let group = rng.gen_range(1..=99u32);
        let serial = rng.gen_range(1..=9999u32);
        let digits = format!("{area:03}{group:02}{serial:04}");
        if ssn_valid(&digits) {
            return format_digits_like(source, &digits);
        }
    }
}

/// EIN-shaped replacement.
pub fn ein_like(source: &str, rng: &mut StdRng) -> String {
    format_digits_like(source, &random_digits(9, rng))
}

/// BIC with a random bank code, preserving length and the country position.
pub fn bic_like(source: &str, rng: &mut StdRng) -> String {
    let country: String = source.chars().skip(4).take(2).collect();
    let location: String = source
        .chars()
        .skip(6)
        .map(|c| {
            if c.is_ascii_digit() {
                char::from(b'0' + rng.gen_range(0..10u8))
            } else {
                (b'A' + rng.gen_range(0..26u8)) as char
            }
        })
        .collect();
    format!("{}{}{}", random_upper(4, rng), country, location)
}

/// Generic identifier: regenerate digits, keep letters and punctuation.
pub fn generic_id_like(source: &str, rng: &mut StdRng) -> String {
    let digit_count = source.chars().filter(|c| c.is_ascii_digit()).count();
    format_digits_like(source, &random_digits(digit_count, rng))
}

/// Dispatch on account subtype.
pub fn account_like(subtype: AccountSubtype, source: &str, rng: &mut StdRng) -> String {
    match subtype {
        AccountSubtype::Cc => cc_like(source, rng),
        AccountSubtype::Aba => aba_like(source, rng),
        AccountSubtype::Iban => iban_like(source, rng),
        AccountSubtype::Ssn => ssn_like(source, rng),
        AccountSubtype::Ein => ein_like(source, rng),
        AccountSubtype::Bic => bic_like(source, rng),
        AccountSubtype::Generic => generic_id_like(source, rng),
    }
}

// ---------------------------------------------------------------------------
// Phones and emails
// ---------------------------------------------------------------------------

/// Phone number in the 555 family with the source formatting preserved.
pub fn phone_like(source: &str, rng: &mut StdRng) -> String {
    let digit_count = source.chars().filter(|c| c.is_ascii_digit()).count();
    let exchange = rng.gen_range(200..=999u32);
    let line = rng.gen_range(0..=9999u32);
    let national = format!("555{exchange:03}{line:04}");
    let digits = if digit_count > 10 {
        // Leading country code digits (e.g. the 1 in +1) stay.
        let prefix: String = source
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(digit_count - 10)
            .collect();
        format!("{prefix}{national}")
    } else {
        national
    };
    format_digits_like(source, &digits)
}

/// Email with a shape-preserving local part and a reserved example domain.
pub fn email_like(source: &str, rng: &mut StdRng) -> String {
    const DOMAINS: [&str; 3] = ["example.org", "example.com", "example.net"];
    let local_src = source.split('@').next().unwrap_or(source);
    let (base, tag) = match local_src.split_once('+') {
        Some((b, t)) => (b, Some(t)),
        None => (local_src, None),
    };
    let local: String = base
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
        .collect();
    let domain = DOMAINS[rng.gen_range(0..DOMAINS.len())];
    match tag {
        Some(t) => format!("{local}+{t}@{domain}"),
        None => format!("{local}@{domain}"),
    }
}
