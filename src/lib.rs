//! redactor - offline PII redaction with deterministic, shape-preserving
//! pseudonyms.
//!
//! The pipeline normalizes the input, runs independent detectors, merges
//! address lines into blocks, links mentions into entity clusters, resolves
//! overlaps by precedence, generates keyed pseudonyms, validates them
//! through a safety guard, applies the replacement plan, and verifies the
//! output for residual PII. The core performs no I/O and reads no
//! environment variables; the CLI boundary supplies text, configuration,
//! and the seed secret.

pub mod config;
pub mod detect;
pub mod error;
pub mod link;
pub mod models;
pub mod plan;
pub mod preprocess;
pub mod pseudo;
pub mod report;
pub mod safety;
pub mod verify;

pub use config::{AliasPolicy, Config};
pub use error::{RedactError, Result};
pub use models::{EntityCluster, EntityLabel, PlanEntry, Span};
pub use report::AuditBundle;
pub use verify::VerificationReport;

use detect::Providers;
use pseudo::{doc_hash, KeyScope, PseudonymGenerator};
use safety::SafetyGuard;
use tracing::{debug, info};

/// Result of one redaction run.
pub struct RedactionOutcome {
    /// The sanitized document
    pub sanitized_text: String,
    /// Per-replacement audit (contains original PII)
    pub audit: AuditBundle,
    /// Residual scan of the sanitized text
    pub verification: VerificationReport,
    /// The applied plan
    pub plan: Vec<PlanEntry>,
}

/// Main pipeline entry point.
pub struct Redactor {
    config: Config,
    secret: Option<String>,
    providers: Providers,
}

impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("config", &self.config)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Redactor {
    /// Create a redactor. Fails when the configuration demands a secret
    /// and none was supplied.
    pub fn new(config: Config, secret: Option<String>) -> Result<Self> {
        if config.pseudonyms.require_secret && secret.as_deref().map_or(true, str::is_empty) {
            return Err(RedactError::MissingSecret(
                config.pseudonyms.seed.secret_env.clone(),
            ));
        }
        Ok(Self {
            config,
            secret,
            providers: Providers::default(),
        })
    }

    /// Inject optional NER/coref providers.
    pub fn with_providers(mut self, providers: Providers) -> Self {
        self.providers = providers;
        self
    }

    /// Redact `raw_text` and return the sanitized text with its audit and
    /// verification artifacts.
    pub fn redact(&self, raw_text: &str) -> Result<RedactionOutcome> {
        let pre = preprocess::normalize(raw_text);
        let text = &pre.text;
        debug!(normalized = text.len(), changed = pre.changed, "preprocessed");

        let (mut spans, mut warnings) =
            detect::run_detectors(text, &self.config, &self.providers)?;
        info!(candidates = spans.len(), "detection complete");

        link::merge_address_lines(text, &mut spans);
        let (clusters, link_warnings) =
            link::link_entities(text, &mut spans, &self.config, &self.providers);
        warnings.extend(link_warnings);

        let merged = link::merge_spans(text, &spans);
        debug!(merged = merged.len(), clusters = clusters.len(), "linked and merged");

        let scope = if self.config.pseudonyms.cross_doc_consistency {
            KeyScope::CrossDocument
        } else {
            KeyScope::PerDocument
        };
        let generator = PseudonymGenerator::new(self.secret.as_deref(), scope, raw_text);
        let guard = SafetyGuard::new(&self.config);

        let plan = plan::build_plan(text, &merged, &clusters, &generator, &guard, &self.config)?;
        let (sanitized_text, applied) = plan::apply_plan(text, &plan)?;

        let verification = verify::verify_output(
            &sanitized_text,
            &applied,
            &self.config,
            generator.seed_present(),
        )?;

        if self.config.verification.fail_on_residual && !verification.clean() {
            return Err(RedactError::Verification {
                residuals: verification.residuals.len(),
                score: verification.leakage_score,
            });
        }

        let audit = report::build_audit(
            &plan,
            &pre.char_map,
            &doc_hash(raw_text),
            generator.seed_present(),
            warnings,
        );
        info!(
            replacements = plan.len(),
            leakage = verification.leakage_score,
            "redaction complete"
        );

        Ok(RedactionOutcome {
            sanitized_text,
            audit,
            verification,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountSubtype;

    fn redact(text: &str, config: Config) -> RedactionOutcome {
        Redactor::new(config, Some("pipeline-test-secret".into()))
            .unwrap()
            .redact(text)
            .unwrap()
    }

    fn default_outcome(text: &str) -> RedactionOutcome {
        redact(text, Config::default())
    }

    #[test]
    fn empty_input_empty_plan() {
        let outcome = default_outcome("");
        assert_eq!(outcome.sanitized_text, "");
        assert!(outcome.plan.is_empty());
        assert!(outcome.verification.clean());
    }

    #[test]
    fn whitespace_only_unchanged() {
        let outcome = default_outcome("   \n\t\n  ");
        assert_eq!(outcome.sanitized_text, "   \n\t\n  ");
        assert!(outcome.plan.is_empty());
    }

    #[test]
    fn requires_secret_when_configured() {
        let config = Config::builder().require_secret(true).build();
        let err = Redactor::new(config, None).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    // S1: person + role alias + DOB.
    #[test]
    fn scenario_person_role_and_dob() {
        let config = Config::builder()
            .alias_labels(AliasPolicy::KeepRoles)
            .build();
        let text = r#"John Doe (the "Buyer") was born on July 4, 1982."#;
        let outcome = redact(text, config);

        assert!(!outcome.sanitized_text.contains("John Doe"));
        assert!(
            outcome.sanitized_text.contains("Buyer"),
            "role must be retained under keep_roles: {}",
            outcome.sanitized_text
        );
        assert!(!outcome.sanitized_text.contains("July 4, 1982"));

        let person = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::Person)
            .expect("person entry");
        assert_eq!(person.original_text, "John Doe");
        assert_eq!(person.replacement_text.split_whitespace().count(), 2);

        let dob = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::Dob)
            .expect("dob entry");
        let re = regex::Regex::new(r"^[A-Z][a-z]+ \d{1,2}, \d{4}$").unwrap();
        assert!(re.is_match(&dob.replacement_text), "{}", dob.replacement_text);
        assert!(outcome.verification.clean());
    }

    // S2: email + IBAN.
    #[test]
    fn scenario_email_and_iban() {
        let text = "Email: jane@acme.com, IBAN: DE89370400440532013000";
        let outcome = default_outcome(text);

        let email = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::Email)
            .expect("email entry");
        let domain = email.replacement_text.rsplit('@').next().unwrap();
        assert!(["example.org", "example.com", "example.net"].contains(&domain));

        let iban = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::AccountId)
            .expect("iban entry");
        assert_eq!(iban.replacement_text.len(), "DE89370400440532013000".len());
        assert!(detect::account_ids::iban_valid(&iban.replacement_text));
        assert_ne!(
            &iban.replacement_text[4..8],
            "3704",
            "issuer prefix must change"
        );
        assert!(outcome.verification.clean());
    }

    // S3: SSN + card.
    #[test]
    fn scenario_ssn_and_card() {
        let text = "SSN 123-45-6789 and card 4111 1111 1111 1111";
        let outcome = default_outcome(text);

        let ssn = outcome
            .plan
            .iter()
            .find(|e| subtype_of(e) == Some(AccountSubtype::Ssn))
            .expect("ssn entry");
        let ssn_digits: String = ssn
            .replacement_text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        assert!(detect::account_ids::ssn_valid(&ssn_digits));

        let cc = outcome
            .plan
            .iter()
            .find(|e| subtype_of(e) == Some(AccountSubtype::Cc))
            .expect("cc entry");
        let cc_digits: String = cc
            .replacement_text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        assert_eq!(cc_digits.len(), 16);
        assert!(detect::account_ids::luhn_valid(&cc_digits));
        assert_ne!(cc_digits, "4111111111111111");
        assert_eq!(cc.replacement_text.matches(' ').count(), 3);
    }

    // S4: bank + multi-line address block.
    #[test]
    fn scenario_bank_and_address_block() {
        let text = "Chase Bank, N.A.\n1600 Pennsylvania Ave NW\nWashington, DC 20500";
        let outcome = default_outcome(text);

        let block = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::AddressBlock)
            .expect("address block entry");
        assert!(block.original_text.contains('\n'), "block must span lines");
        assert_eq!(block.replacement_text.lines().count(), 2);
        assert!(!outcome.sanitized_text.contains("Pennsylvania"));
        assert!(!outcome.sanitized_text.contains("20500"));

        let bank = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::BankOrg)
            .expect("bank entry");
        assert!(bank.replacement_text.ends_with(", N.A."));
        assert!(!bank.replacement_text.contains("Chase"));
    }

    // S5: nickname alias consistency.
    #[test]
    fn scenario_alias_consistency() {
        let text = r#"John Doe ("Morgan") leased the unit. Morgan signed the contract."#;
        let outcome = default_outcome(text);

        assert!(!outcome.sanitized_text.contains("John Doe"));
        assert!(!outcome.sanitized_text.contains("Morgan"));

        let alias_entries: Vec<&PlanEntry> = outcome
            .plan
            .iter()
            .filter(|e| e.label == EntityLabel::AliasLabel)
            .collect();
        assert_eq!(alias_entries.len(), 2, "both Morgan mentions replaced");
        assert_eq!(
            alias_entries[0].replacement_text,
            alias_entries[1].replacement_text,
            "alias mentions must stay consistent"
        );
        let person = outcome
            .plan
            .iter()
            .find(|e| e.label == EntityLabel::Person)
            .unwrap();
        assert_eq!(person.cluster_id, alias_entries[0].cluster_id);
    }

    // S6: strict mode rejects residuals.
    #[test]
    fn scenario_strict_mode_residual() {
        let config = Config::builder().fail_on_residual(true).build();
        // A sensitive-looking email the detectors will re-find but that no
        // plan entry produced: simulate by running verification directly.
        let sanitized = "leftover contact real.person@gmail.com remains";
        let report = verify::verify_output(sanitized, &[], &config, true).unwrap();
        assert!(!report.clean());

        let err = RedactError::Verification {
            residuals: report.residuals.len(),
            score: report.leakage_score,
        };
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn determinism_across_runs() {
        let text = "Jane Smith (jane@acme.com, 212-555-0147) met John Smith on 7/4/1982. \
                    SSN 123-45-6789. Chase Bank, N.A. holds the escrow.";
        let a = default_outcome(text);
        let b = default_outcome(text);
        assert_eq!(a.sanitized_text, b.sanitized_text);
        let key = |p: &[PlanEntry]| {
            p.iter()
                .map(|e| (e.start, e.end, e.replacement_text.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&a.plan), key(&b.plan));
    }

    #[test]
    fn different_secrets_change_pseudonyms() {
        let text = "Jane Smith wired funds to jane@acme.com.";
        let config = Config::default();
        let a = Redactor::new(config.clone(), Some("secret-one".into()))
            .unwrap()
            .redact(text)
            .unwrap();
        let b = Redactor::new(config, Some("secret-two".into()))
            .unwrap()
            .redact(text)
            .unwrap();
        assert_ne!(a.sanitized_text, b.sanitized_text);
    }

    #[test]
    fn plan_entries_are_disjoint_and_anchored() {
        let text = "Jane Smith (jane@acme.com) pays 4111 1111 1111 1111 from \
                    1600 Pennsylvania Ave NW\nWashington, DC 20500 on July 4, 1982.";
        let outcome = default_outcome(text);
        let normalized = preprocess::normalize(text).text;
        for pair in outcome.plan.windows(2) {
            assert!(pair[0].end <= pair[1].start, "plan entries overlap");
        }
        for entry in &outcome.plan {
            assert_eq!(&normalized[entry.start..entry.end], entry.original_text);
        }
    }

    /// Re-derive the account subtype of a plan entry from its original
    /// surface, for assertions.
    fn subtype_of(entry: &PlanEntry) -> Option<AccountSubtype> {
        if entry.label != EntityLabel::AccountId {
            return None;
        }
        let digits: String = entry
            .original_text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if entry.original_text.contains('-') && digits.len() == 9 {
            Some(AccountSubtype::Ssn)
        } else if digits.len() >= 13 {
            Some(AccountSubtype::Cc)
        } else {
            Some(AccountSubtype::Generic)
        }
    }
}
