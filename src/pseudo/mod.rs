//! Deterministic, shape-preserving pseudonym generation.
//!
//! [`PseudonymGenerator`] owns the run's master key and produces
//! replacements for merged spans. Per cluster, replacements depend only on
//! the cluster identity, the mention's surface shape, and the seed key,
//! never on surrounding entries, so mentions of one subject stay
//! consistent across the document while differently-cased surfaces render
//! accordingly.

pub mod address;
pub mod dates;
pub mod names;
pub mod numbers;
pub mod seed;
pub mod shape;

pub use seed::{doc_hash, KeyScope, SeedMaterial};

use crate::link::canonicalize_key;
use crate::models::{
    AccountSubtype, AddressLineKind, EntityCluster, EntityKind, EntityLabel, Span,
};
use rand::Rng;
use shape::{apply_case, case_class, shape_signature};

pub struct PseudonymGenerator {
    seed: SeedMaterial,
}

impl PseudonymGenerator {
    /// Derive the generator for one document.
    pub fn new(secret: Option<&str>, scope: KeyScope, raw_text: &str) -> Self {
        Self {
            seed: SeedMaterial::derive(secret, scope, raw_text),
        }
    }

    /// Whether a non-empty secret seeds this generator.
    pub fn seed_present(&self) -> bool {
        self.seed.seed_present()
    }

    /// Produce the replacement for `span`.
    ///
    /// `retry_salt` selects an independent candidate after a safety
    /// rejection. Returns `None` when no shaped replacement can be built
    /// (e.g. a date that never normalized); the planner falls back to an
    /// opaque placeholder.
    pub fn replacement_for(
        &self,
        span: &Span,
        cluster: Option<&EntityCluster>,
        retry_salt: u32,
    ) -> Option<String> {
        let (kind, canonical) = match cluster {
            Some(c) => (c.kind.as_str().to_string(), canonicalize_key(&c.canonical_form)),
            None => (
                format!("value:{}", span.label.as_str()),
                canonicalize_key(span.attrs.normalized.as_deref().unwrap_or(&span.text)),
            ),
        };
        let key = self.seed.cluster_key(&kind, &canonical);
        let mut rng = key.mention_rng(&shape_signature(&span.text), retry_salt);

        let replacement = match span.label {
            EntityLabel::Person => names::person_like(&span.text, &mut rng),
            EntityLabel::GenericOrg => names::org_like(&span.text, &mut rng),
            EntityLabel::BankOrg => names::bank_like(&span.text, &mut rng),
            EntityLabel::AliasLabel => match cluster.map(|c| c.kind) {
                Some(EntityKind::Bank) => names::bank_like(&span.text, &mut rng),
                Some(EntityKind::Org) => names::org_like(&span.text, &mut rng),
                _ => names::person_like(&span.text, &mut rng),
            },
            EntityLabel::Email => numbers::email_like(&span.text, &mut rng),
            EntityLabel::Phone => numbers::phone_like(&span.text, &mut rng),
            EntityLabel::AccountId => {
                let subtype = span.attrs.subtype.unwrap_or(AccountSubtype::Generic);
                numbers::account_like(subtype, &span.text, &mut rng)
            }
            EntityLabel::Dob | EntityLabel::DateGeneric => {
                let normalized = span.attrs.normalized_date.as_deref()?;
                let format = span.attrs.date_format?;
                dates::shifted_date_like(&span.text, normalized, format, &mut rng)?
            }
            EntityLabel::AddressBlock => {
                address::block_like(&span.text, &span.attrs.line_kinds, &mut rng)
            }
            EntityLabel::AddressLine => {
                let kind = span
                    .attrs
                    .line_kind
                    .unwrap_or_else(|| address::classify_line(&span.text));
                match kind {
                    AddressLineKind::Street => address::street_line_like(&span.text, &mut rng),
                    AddressLineKind::Unit => address::unit_line_like(&span.text, &mut rng),
                    AddressLineKind::CityStateZip => {
                        address::city_state_zip_like(&span.text, &mut rng)
                    }
                    AddressLineKind::PoBox => address::po_box_like(&span.text, &mut rng),
                }
            }
            EntityLabel::Location => {
                let city =
                    address::CITY_NAMES[rng.gen_range(0..address::CITY_NAMES.len())];
                apply_case(case_class(&span.text), city)
            }
        };
        Some(replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpanAttrs;

    fn generator() -> PseudonymGenerator {
        PseudonymGenerator::new(Some("test-secret"), KeyScope::PerDocument, "document body")
    }

    fn person_span(start: usize, text: &str) -> Span {
        Span::new(start, start + text.len(), text, EntityLabel::Person, "person", 0.8)
    }

    #[test]
    fn cluster_mentions_share_identity() {
        let generator = generator();
        let cluster = EntityCluster::new("c1", EntityKind::Person, "John Doe");
        // Same shape, different offsets: identical replacement.
        let a = generator
            .replacement_for(&person_span(0, "John Doe"), Some(&cluster), 0)
            .unwrap();
        let b = generator
            .replacement_for(&person_span(100, "John Doe"), Some(&cluster), 0)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_clusters_differ() {
        let generator = generator();
        let c1 = EntityCluster::new("c1", EntityKind::Person, "John Doe");
        let c2 = EntityCluster::new("c2", EntityKind::Person, "Jane Roe");
        let a = generator
            .replacement_for(&person_span(0, "John Doe"), Some(&c1), 0)
            .unwrap();
        let b = generator
            .replacement_for(&person_span(0, "John Doe"), Some(&c2), 0)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn retry_salt_yields_new_candidate() {
        let generator = generator();
        let cluster = EntityCluster::new("c1", EntityKind::Person, "John Doe");
        let a = generator
            .replacement_for(&person_span(0, "John Doe"), Some(&cluster), 0)
            .unwrap();
        let b = generator
            .replacement_for(&person_span(0, "John Doe"), Some(&cluster), 1)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unnormalized_date_returns_none() {
        let generator = generator();
        let span = Span::new(0, 10, "2021-02-30", EntityLabel::Dob, "dates", 0.99).with_attrs(
            SpanAttrs {
                date_format: Some(crate::models::DateFormat::Iso),
                normalized_date: None,
                ..Default::default()
            },
        );
        assert!(generator.replacement_for(&span, None, 0).is_none());
    }
}
