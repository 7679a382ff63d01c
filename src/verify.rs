//! Output verification.
//!
//! The verifier re-runs the rule detectors over the sanitized text. A
//! detected span is ignored when it sits inside a range the applier just
//! wrote, when its exact text matches a generated pseudonym from the plan
//! (a multiset, so duplicates are only excused as many times as they were
//! produced), or when it is safe by construction (reserved email domains,
//! 555-family phones). Everything left is a residual and contributes to
//! the weighted leakage score.

use crate::config::{AliasPolicy, Config};
use crate::detect::{run_detectors, Providers};
use crate::error::Result;
use crate::models::{EntityLabel, Span};
use crate::plan::AppliedEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const SAFE_EMAIL_DOMAINS: [&str; 3] = ["example.org", "example.com", "example.net"];

/// A suspicious span remaining in the sanitized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Residual {
    pub label: EntityLabel,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Surrounding text for triage
    pub context: String,
}

/// Verification result for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub counts_by_label: BTreeMap<String, usize>,
    pub leakage_score: u32,
    pub residuals: Vec<Residual>,
    /// Whether a non-empty seed secret was configured. The secret itself
    /// never appears in any report.
    pub seed_present: bool,
}

impl VerificationReport {
    pub fn clean(&self) -> bool {
        self.residuals.is_empty()
    }
}

fn label_weight(label: EntityLabel) -> u32 {
    match label {
        EntityLabel::Email | EntityLabel::Phone | EntityLabel::AccountId | EntityLabel::Dob => 3,
        EntityLabel::Person | EntityLabel::AddressBlock => 2,
        _ => 1,
    }
}

fn safe_by_construction(span: &Span) -> bool {
    match span.label {
        EntityLabel::Email => {
            let domain = span.text.rsplit('@').next().unwrap_or("").to_lowercase();
            SAFE_EMAIL_DOMAINS.contains(&domain.as_str())
        }
        EntityLabel::Phone => {
            let digits: String = span.text.chars().filter(|c| c.is_ascii_digit()).collect();
            let national = if digits.len() > 10 {
                &digits[digits.len() - 10..]
            } else {
                &digits[..]
            };
            national.starts_with("555")
        }
        _ => false,
    }
}

fn context_around(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(20);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + 20).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].to_string()
}

/// Scan `sanitized` for residual PII.
pub fn verify_output(
    sanitized: &str,
    applied: &[AppliedEntry],
    config: &Config,
    seed_present: bool,
) -> Result<VerificationReport> {
    // Verification is rule-only; provider output on synthetic text would
    // add noise, not signal.
    let providers = Providers::default();
    let mut scan_config = config.clone();
    scan_config.detectors.ner.enable = false;
    scan_config.detectors.ner.require = false;
    scan_config.detectors.coref.enable = false;
    let (spans, _) = run_detectors(sanitized, &scan_config, &providers)?;

    let mut pseudonym_budget: HashMap<&str, usize> = HashMap::new();
    for a in applied {
        *pseudonym_budget
            .entry(a.entry.replacement_text.as_str())
            .or_insert(0) += 1;
    }

    let mut residuals = Vec::new();
    for span in &spans {
        // Generic dates are only findings when the policy redacts them.
        if span.label == EntityLabel::DateGeneric && !config.redact.generic_dates {
            continue;
        }
        // Role alias labels are intentionally retained under keep_roles.
        if span.label == EntityLabel::AliasLabel
            && span.attrs.is_role
            && config.redact.alias_labels == AliasPolicy::KeepRoles
        {
            continue;
        }
        // Address lines are reported through their blocks.
        if span.label == EntityLabel::AddressLine
            && spans
                .iter()
                .any(|b| b.label == EntityLabel::AddressBlock && b.overlaps(span))
        {
            continue;
        }
        if applied
            .iter()
            .any(|a| a.out_start <= span.start && span.end <= a.out_end)
        {
            continue;
        }
        if let Some(budget) = pseudonym_budget.get_mut(span.text.as_str()) {
            if *budget > 0 {
                *budget -= 1;
                continue;
            }
        }
        if safe_by_construction(span) {
            continue;
        }
        residuals.push(Residual {
            label: span.label,
            text: span.text.clone(),
            start: span.start,
            end: span.end,
            context: context_around(sanitized, span.start, span.end),
        });
    }

    let mut counts_by_label: BTreeMap<String, usize> = BTreeMap::new();
    let mut leakage_score = 0;
    for residual in &residuals {
        *counts_by_label
            .entry(residual.label.as_str().to_string())
            .or_insert(0) += 1;
        leakage_score += label_weight(residual.label);
    }

    Ok(VerificationReport {
        counts_by_label,
        leakage_score,
        residuals,
        seed_present,
    })
}
