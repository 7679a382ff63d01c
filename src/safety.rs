//! Safety guard for generated replacements.
//!
//! Every candidate replacement is validated before its plan entry is
//! accepted. A rejected candidate causes the generator to be re-invoked
//! with an incremented retry salt (at most two retries); the planner then
//! falls back to an opaque placeholder or fails the run in strict mode.

use crate::config::Config;
use crate::detect::account_ids::{aba_valid, iban_valid, luhn_valid, ssn_valid};
use crate::models::{AccountSubtype, EntityLabel, Span};

const ALLOWED_EMAIL_DOMAINS: [&str; 3] = ["example.org", "example.com", "example.net"];

/// Card prefixes assigned to real issuers; generated cards must avoid them.
const REAL_CC_PREFIXES: [&str; 8] = ["4", "51", "52", "53", "54", "55", "34", "37"];

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EqualsOriginal,
    SensitiveValue(String),
    BadEmailDomain,
    BadPhonePrefix,
    ChecksumInvalid,
    RealIssuerPrefix,
    TooSimilar,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::EqualsOriginal => write!(f, "replacement equals original"),
            Rejection::SensitiveValue(v) => write!(f, "matches sensitive value {v:?}"),
            Rejection::BadEmailDomain => write!(f, "email domain outside the example set"),
            Rejection::BadPhonePrefix => write!(f, "phone outside the 555 family"),
            Rejection::ChecksumInvalid => write!(f, "checksum invalid"),
            Rejection::RealIssuerPrefix => write!(f, "identifier uses a real issuer prefix"),
            Rejection::TooSimilar => write!(f, "first half of digits unchanged"),
        }
    }
}

pub struct SafetyGuard {
    sensitive_lower: Vec<String>,
}

impl SafetyGuard {
    pub fn new(config: &Config) -> Self {
        Self {
            sensitive_lower: config
                .safety
                .sensitive_values
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
        }
    }

    /// Validate `candidate` as a replacement for `span`.
    pub fn validate(&self, span: &Span, candidate: &str) -> Result<(), Rejection> {
        if candidate.to_lowercase() == span.text.to_lowercase() {
            return Err(Rejection::EqualsOriginal);
        }

        let candidate_lower = candidate.to_lowercase();
        for value in &self.sensitive_lower {
            if !value.is_empty() && candidate_lower.contains(value) {
                return Err(Rejection::SensitiveValue(value.clone()));
            }
        }

        match span.label {
            EntityLabel::Email => self.check_email(candidate),
            EntityLabel::Phone => self.check_phone(candidate),
            EntityLabel::AccountId => {
                let subtype = span.attrs.subtype.unwrap_or(AccountSubtype::Generic);
                self.check_account(subtype, span, candidate)
            }
            _ => Ok(()),
        }
    }

    fn check_email(&self, candidate: &str) -> Result<(), Rejection> {
        let domain = candidate.rsplit('@').next().unwrap_or("").to_lowercase();
        if ALLOWED_EMAIL_DOMAINS.contains(&domain.as_str()) {
            Ok(())
        } else {
            Err(Rejection::BadEmailDomain)
        }
    }

    fn check_phone(&self, candidate: &str) -> Result<(), Rejection> {
        let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        // National significant number must sit in the 555 area family.
        let national = if digits.len() > 10 {
            &digits[digits.len() - 10..]
        } else {
            &digits[..]
        };
        if national.starts_with("555") {
            Ok(())
        } else {
            Err(Rejection::BadPhonePrefix)
        }
    }

    fn check_account(
        &self,
        subtype: AccountSubtype,
        span: &Span,
        candidate: &str,
    ) -> Result<(), Rejection> {
        let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        let original_digits: String = span.text.chars().filter(|c| c.is_ascii_digit()).collect();

        match subtype {
            AccountSubtype::Cc => {
                if !luhn_valid(&digits) {
                    return Err(Rejection::ChecksumInvalid);
                }
                if REAL_CC_PREFIXES.iter().any(|p| digits.starts_with(p)) {
                    return Err(Rejection::RealIssuerPrefix);
                }
            }
            AccountSubtype::Aba => {
                if !aba_valid(&digits) {
                    return Err(Rejection::ChecksumInvalid);
                }
            }
            AccountSubtype::Iban => {
                let compact: String =
                    candidate.chars().filter(|c| !c.is_whitespace()).collect();
                if !iban_valid(&compact) {
                    return Err(Rejection::ChecksumInvalid);
                }
                let original_compact: String =
                    span.text.chars().filter(|c| !c.is_whitespace()).collect();
                if compact.len() >= 8
                    && original_compact.len() >= 8
                    && compact[4..8].eq_ignore_ascii_case(&original_compact[4..8])
                {
                    return Err(Rejection::RealIssuerPrefix);
                }
            }
            AccountSubtype::Ssn => {
                if !ssn_valid(&digits) {
                    return Err(Rejection::ChecksumInvalid);
                }
            }
            AccountSubtype::Ein | AccountSubtype::Bic | AccountSubtype::Generic => {}
        }

        // Any numeric identifier must change early: at least one digit in
        // the first half has to differ from the original.
        if !digits.is_empty() && digits.len() == original_digits.len() {
            let half = digits.len().div_ceil(2);
            if digits[..half] == original_digits[..half] {
                return Err(Rejection::TooSimilar);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpanAttrs;

    fn guard() -> SafetyGuard {
        let config = Config::builder()
            .sensitive_values(vec!["First National Bank".into()])
            .build();
        SafetyGuard::new(&config)
    }

    fn span(text: &str, label: EntityLabel) -> Span {
        Span::new(0, text.len(), text, label, "test", 0.9)
    }

    fn account_span(text: &str, subtype: AccountSubtype) -> Span {
        span(text, EntityLabel::AccountId).with_attrs(SpanAttrs {
            subtype: Some(subtype),
            ..Default::default()
        })
    }

    #[test]
    fn rejects_identity_replacement() {
        let g = guard();
        let s = span("John Doe", EntityLabel::Person);
        assert_eq!(g.validate(&s, "JOHN DOE"), Err(Rejection::EqualsOriginal));
        assert!(g.validate(&s, "Alan Smith").is_ok());
    }

    #[test]
    fn rejects_sensitive_values() {
        let g = guard();
        let s = span("Chase Bank", EntityLabel::BankOrg);
        assert!(matches!(
            g.validate(&s, "First National Bank, N.A."),
            Err(Rejection::SensitiveValue(_))
        ));
    }

    #[test]
    fn enforces_email_domains() {
        let g = guard();
        let s = span("jane@acme.com", EntityLabel::Email);
        assert!(g.validate(&s, "kbyq@example.org").is_ok());
        assert_eq!(
            g.validate(&s, "kbyq@gmail.com"),
            Err(Rejection::BadEmailDomain)
        );
    }

    #[test]
    fn enforces_phone_family() {
        let g = guard();
        let s = span("(212) 555-0147", EntityLabel::Phone);
        assert!(g.validate(&s, "(555) 284-0199").is_ok());
        assert_eq!(
            g.validate(&s, "(212) 555-0100"),
            Err(Rejection::BadPhonePrefix)
        );
    }

    #[test]
    fn enforces_cc_checksum_and_issuer() {
        let g = guard();
        let s = account_span("4111 1111 1111 1111", AccountSubtype::Cc);
        // 9-prefixed Luhn-valid card.
        assert!(g.validate(&s, "9111 1111 1111 1110").is_ok());
        // Luhn-valid but a real issuer prefix.
        assert_eq!(
            g.validate(&s, "4539 5787 6362 1486"),
            Err(Rejection::RealIssuerPrefix)
        );
        assert_eq!(
            g.validate(&s, "9111 1111 1111 1111"),
            Err(Rejection::ChecksumInvalid)
        );
    }

    #[test]
    fn requires_first_half_change() {
        let g = guard();
        let s = account_span("99-1234567", AccountSubtype::Ein);
        assert_eq!(
            g.validate(&s, "99-1239999"),
            Err(Rejection::TooSimilar)
        );
        assert!(g.validate(&s, "12-9876543").is_ok());
    }
}
