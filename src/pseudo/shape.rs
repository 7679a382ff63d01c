//! Shape signatures and casing preservation.
//!
//! A shape signature is a compact rendering of a mention's surface: letters
//! collapse to `A`/`a`, digits to `9`, and everything else stays verbatim.
//! Signatures key the mention RNG so that two mentions with the same shape
//! in one cluster receive the same pseudonym, while differently-shaped
//! mentions ("JOHN DOE" vs "John Doe") may differ in rendering yet share
//! the cluster identity.

/// Casing class of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseClass {
    /// all lowercase
    Lower,
    /// First letter uppercase, rest lowercase
    Title,
    /// ALL UPPERCASE
    Upper,
    /// anything else (mIxEd, O'Brien-like internals decide per char)
    Mixed,
}

/// Classify the casing of `token`, considering only its letters.
pub fn case_class(token: &str) -> CaseClass {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return CaseClass::Mixed;
    }
    if letters.iter().all(|c| c.is_lowercase()) {
        return CaseClass::Lower;
    }
    if letters.iter().all(|c| c.is_uppercase()) {
        return CaseClass::Upper;
    }
    let mut iter = letters.iter();
    let first_upper = iter.next().is_some_and(|c| c.is_uppercase());
    if first_upper && iter.all(|c| c.is_lowercase()) {
        CaseClass::Title
    } else {
        CaseClass::Mixed
    }
}

/// Re-case `word` (assumed lowercase or Title) according to `class`.
pub fn apply_case(class: CaseClass, word: &str) -> String {
    match class {
        CaseClass::Lower => word.to_lowercase(),
        CaseClass::Upper => word.to_uppercase(),
        CaseClass::Title | CaseClass::Mixed => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        }
    }
}

/// Compact surface shape: `A` for uppercase letters, `a` for lowercase,
/// `9` for digits, other characters verbatim.
pub fn shape_signature(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_uppercase() {
                'A'
            } else if c.is_lowercase() {
                'a'
            } else if c.is_ascii_digit() {
                '9'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_casing() {
        assert_eq!(case_class("smith"), CaseClass::Lower);
        assert_eq!(case_class("Smith"), CaseClass::Title);
        assert_eq!(case_class("SMITH"), CaseClass::Upper);
        assert_eq!(case_class("McBride"), CaseClass::Mixed);
        assert_eq!(case_class("J.D."), CaseClass::Upper);
    }

    #[test]
    fn applies_casing() {
        assert_eq!(apply_case(CaseClass::Upper, "smith"), "SMITH");
        assert_eq!(apply_case(CaseClass::Lower, "Smith"), "smith");
        assert_eq!(apply_case(CaseClass::Title, "smith"), "Smith");
    }

    #[test]
    fn signature_keeps_punctuation() {
        assert_eq!(shape_signature("John Doe"), "Aaaa Aaa");
        assert_eq!(shape_signature("J.D. 555-0147"), "A.A. 999-9999");
        assert_eq!(shape_signature("O'Brien"), "A'Aaaaa");
    }
}
