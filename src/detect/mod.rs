//! Entity detectors.
//!
//! Each detector is an independent, pure scanner over the normalized text.
//! Overlaps across detectors are allowed; the global span merger resolves
//! them later. New detectors extend the closed [`Detector`] enum rather than
//! registering through dynamic dispatch, so the full set is known at compile
//! time.

pub mod account_ids;
pub mod address;
pub mod aliases;
pub mod bank_org;
pub mod dates;
pub mod email;
pub mod ner;
pub mod person;
pub mod phone;

use crate::config::Config;
use crate::error::{RedactError, Result};
use crate::models::Span;
use rayon::prelude::*;
use tracing::{debug, warn};

pub use ner::{NerLabel, NerProvider, NerSpan, Providers};

/// Punctuation trimmed from the right edge of matches that regexes tend to
/// swallow in prose ("call 555-0147." should not include the period).
const RIGHT_TRIM: &[char] = &[')', ']', '}', ';', ':', ',', '.', '!', '?', '>', '"', '\''];

/// Move `end` left past trailing trim characters.
pub(crate) fn rtrim_index(text: &str, mut end: usize) -> usize {
    while end > 0 {
        match text[..end].chars().next_back() {
            Some(c) if RIGHT_TRIM.contains(&c) => end -= c.len_utf8(),
            _ => break,
        }
    }
    end
}

/// Shared context passed to every detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectContext<'a> {
    pub config: &'a Config,
}

/// Closed set of rule detectors.
pub enum Detector {
    Email(email::EmailDetector),
    Phone(phone::PhoneDetector),
    AccountIds(account_ids::AccountIdDetector),
    BankOrg(bank_org::BankOrgDetector),
    Person(person::PersonDetector),
    Address(address::AddressLineDetector),
    Dates(dates::DateDetector),
    Aliases(aliases::AliasDetector),
}

impl Detector {
    /// Short, stable identifier for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Detector::Email(_) => "email",
            Detector::Phone(_) => "phone",
            Detector::AccountIds(_) => "account_ids",
            Detector::BankOrg(_) => "bank_org",
            Detector::Person(_) => "person",
            Detector::Address(_) => "address_line",
            Detector::Dates(_) => "dates",
            Detector::Aliases(_) => "aliases",
        }
    }

    /// Run the detector over `text`.
    pub fn detect(&self, text: &str, ctx: &DetectContext<'_>) -> Vec<Span> {
        match self {
            Detector::Email(d) => d.detect(text),
            Detector::Phone(d) => d.detect(text),
            Detector::AccountIds(d) => d.detect(text, ctx),
            Detector::BankOrg(d) => d.detect(text),
            Detector::Person(d) => d.detect(text),
            Detector::Address(d) => d.detect(text),
            Detector::Dates(d) => d.detect(text),
            Detector::Aliases(d) => d.detect(text),
        }
    }
}

/// Construct the full rule-detector set.
pub fn all_detectors() -> Vec<Detector> {
    vec![
        Detector::Email(email::EmailDetector::new()),
        Detector::Phone(phone::PhoneDetector::new()),
        Detector::AccountIds(account_ids::AccountIdDetector::new()),
        Detector::BankOrg(bank_org::BankOrgDetector::new()),
        Detector::Person(person::PersonDetector::new()),
        Detector::Address(address::AddressLineDetector::new()),
        Detector::Dates(dates::DateDetector::new()),
        Detector::Aliases(aliases::AliasDetector::new()),
    ]
}

/// Run every detector and the optional NER provider over `text`.
///
/// Detectors execute in parallel; the combined output is sorted by
/// `(start, end, precedence, source)` so the schedule never changes the
/// result. Provider failures are recoverable warnings unless the provider
/// is marked `require` in the configuration.
pub fn run_detectors(
    text: &str,
    config: &Config,
    providers: &Providers,
) -> Result<(Vec<Span>, Vec<String>)> {
    let ctx = DetectContext { config };
    let detectors = all_detectors();

    let mut spans: Vec<Span> = detectors
        .par_iter()
        .flat_map_iter(|d| {
            let found = d.detect(text, &ctx);
            debug!(detector = d.name(), spans = found.len(), "detector done");
            found
        })
        .collect();

    let mut warnings = Vec::new();

    if config.detectors.ner.enable {
        match providers.ner.as_deref() {
            Some(provider) if provider.probe() => match provider.spans(text) {
                Ok(ner_spans) => spans.extend(ner::ingest(ner_spans, text)),
                Err(e) => {
                    if config.detectors.ner.require {
                        return Err(RedactError::Detector {
                            detector: "ner".into(),
                            message: e.to_string(),
                        });
                    }
                    warn!("NER provider failed, continuing without it: {e}");
                    warnings.push(format!("ner provider failed: {e}"));
                }
            },
            _ => {
                if config.detectors.ner.require {
                    return Err(RedactError::Detector {
                        detector: "ner".into(),
                        message: "provider required but unavailable".into(),
                    });
                }
                if providers.ner.is_some() {
                    warnings.push("ner provider did not probe ready".into());
                }
            }
        }
    }

    // Deterministic order regardless of detector scheduling.
    spans.sort_by(|a, b| {
        (a.start, a.end, a.label.precedence(), a.source).cmp(&(
            b.start,
            b.end,
            b.label.precedence(),
            b.source,
        ))
    });

    Ok((spans, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityLabel;

    #[test]
    fn rtrim_strips_prose_punctuation() {
        let text = "call 555-0147.),";
        assert_eq!(rtrim_index(text, text.len()), "call 555-0147".len());
        assert_eq!(rtrim_index("abc", 3), 3);
        assert_eq!(rtrim_index("", 0), 0);
    }

    #[test]
    fn run_is_deterministic_across_invocations() {
        let config = Config::default();
        let providers = Providers::default();
        let text = "Email jane@acme.com or call (212) 555-0147. SSN 123-45-6789.";
        let (a, _) = run_detectors(text, &config, &providers).unwrap();
        let (b, _) = run_detectors(text, &config, &providers).unwrap();
        let key = |spans: &[Span]| {
            spans
                .iter()
                .map(|s| (s.start, s.end, s.label))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&a), key(&b));
        assert!(a.iter().any(|s| s.label == EntityLabel::Email));
        assert!(a.iter().any(|s| s.label == EntityLabel::Phone));
        assert!(a.iter().any(|s| s.label == EntityLabel::AccountId));
    }
}
