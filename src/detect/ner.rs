//! Optional ML provider interfaces.
//!
//! The pipeline treats NER and coreference models as capability-bearing
//! injected providers. Both are probed before use and the pipeline is fully
//! functional when they are absent; only the rule detectors are required.

use crate::models::{EntityLabel, Span};

/// Labels an external NER provider may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerLabel {
    Person,
    Org,
    Loc,
}

/// A candidate span from an external NER model.
#[derive(Debug, Clone)]
pub struct NerSpan {
    /// Byte offsets into the normalized text
    pub start: usize,
    pub end: usize,
    pub label: NerLabel,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
}

/// External named-entity recognition provider.
pub trait NerProvider: Send + Sync {
    /// Short identifier for logs and warnings.
    fn name(&self) -> &'static str;

    /// Whether the provider is ready to serve requests.
    fn probe(&self) -> bool;

    /// Candidate spans over `text`.
    fn spans(&self, text: &str) -> anyhow::Result<Vec<NerSpan>>;
}

/// External coreference provider: groups of mention ranges that refer to the
/// same subject.
pub trait CorefProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn probe(&self) -> bool;

    /// Mention chains as byte ranges over the normalized text.
    fn chains(&self, text: &str) -> anyhow::Result<Vec<Vec<(usize, usize)>>>;
}

/// Injected provider set. Defaults to none.
#[derive(Default)]
pub struct Providers {
    pub ner: Option<Box<dyn NerProvider>>,
    pub coref: Option<Box<dyn CorefProvider>>,
}

/// Convert provider output into pipeline spans, dropping anything that does
/// not line up with character boundaries of `text`.
pub fn ingest(ner_spans: Vec<NerSpan>, text: &str) -> Vec<Span> {
    ner_spans
        .into_iter()
        .filter(|s| {
            s.start < s.end
                && s.end <= text.len()
                && text.is_char_boundary(s.start)
                && text.is_char_boundary(s.end)
        })
        .map(|s| {
            let label = match s.label {
                NerLabel::Person => EntityLabel::Person,
                NerLabel::Org => EntityLabel::GenericOrg,
                NerLabel::Loc => EntityLabel::Location,
            };
            Span::new(
                s.start,
                s.end,
                &text[s.start..s.end],
                label,
                "ner",
                s.confidence.clamp(0.0, 1.0),
            )
        })
        .collect()
}
