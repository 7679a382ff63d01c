//! Core span model shared by all detectors.
//!
//! Spans follow the half-open interval convention `[start, end)` where
//! `start` is inclusive and `end` is exclusive. Offsets are byte positions
//! into the *normalized* text. Detectors must not emit spans that cross the
//! text bounds; overlap resolution is deferred to the span merger.

use serde::{Deserialize, Serialize};

/// Closed set of entity labels recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Email,
    Phone,
    AccountId,
    BankOrg,
    GenericOrg,
    Person,
    AddressLine,
    AddressBlock,
    DateGeneric,
    Dob,
    AliasLabel,
    Location,
}

impl EntityLabel {
    /// Merge precedence rank; lower is stronger.
    pub fn precedence(&self) -> u8 {
        match self {
            EntityLabel::AddressBlock => 0,
            EntityLabel::AccountId => 1,
            EntityLabel::Email => 2,
            EntityLabel::Phone => 3,
            EntityLabel::Dob => 4,
            EntityLabel::AliasLabel => 5,
            EntityLabel::BankOrg => 6,
            EntityLabel::Person => 7,
            EntityLabel::GenericOrg => 8,
            EntityLabel::Location => 9,
            EntityLabel::AddressLine => 10,
            EntityLabel::DateGeneric => 11,
        }
    }

    /// Stable uppercase name used in reports and redaction placeholders.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Email => "EMAIL",
            EntityLabel::Phone => "PHONE",
            EntityLabel::AccountId => "ACCOUNT_ID",
            EntityLabel::BankOrg => "BANK_ORG",
            EntityLabel::GenericOrg => "GENERIC_ORG",
            EntityLabel::Person => "PERSON",
            EntityLabel::AddressLine => "ADDRESS_LINE",
            EntityLabel::AddressBlock => "ADDRESS_BLOCK",
            EntityLabel::DateGeneric => "DATE_GENERIC",
            EntityLabel::Dob => "DOB",
            EntityLabel::AliasLabel => "ALIAS_LABEL",
            EntityLabel::Location => "LOCATION",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account identifier subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSubtype {
    Iban,
    Bic,
    Aba,
    Cc,
    Ssn,
    Ein,
    Generic,
}

impl AccountSubtype {
    /// Overlap precedence among account subtypes; lower is stronger.
    pub fn rank(&self) -> u8 {
        match self {
            AccountSubtype::Iban => 0,
            AccountSubtype::Bic => 1,
            AccountSubtype::Aba => 2,
            AccountSubtype::Cc => 3,
            AccountSubtype::Ssn => 4,
            AccountSubtype::Ein => 5,
            AccountSubtype::Generic => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSubtype::Iban => "iban",
            AccountSubtype::Bic => "bic",
            AccountSubtype::Aba => "aba",
            AccountSubtype::Cc => "cc",
            AccountSubtype::Ssn => "ssn",
            AccountSubtype::Ein => "ein",
            AccountSubtype::Generic => "generic",
        }
    }
}

/// Recognized date surface formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `M/D/YYYY` or `M-D-YYYY`
    MdyNumeric,
    /// `YYYY-MM-DD`
    Iso,
    /// `Month D, YYYY`
    MonthDayYear,
    /// `D Month YYYY`
    DayMonthYear,
}

/// Address line classification used by the address merger and generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressLineKind {
    Street,
    Unit,
    CityStateZip,
    PoBox,
}

/// Label-specific span attributes.
///
/// A flat, typed bag rather than a string map so detectors cannot invent
/// attribute keys downstream components do not understand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanAttrs {
    /// Account identifier subtype
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<AccountSubtype>,

    /// Digits-only or otherwise canonical form of the matched identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,

    /// Surface format of a detected date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,

    /// `YYYY-MM-DD` when the date is calendar-valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_date: Option<String>,

    /// Trigger word that promoted a date to DOB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Captured alias term for ALIAS_LABEL spans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_term: Option<String>,

    /// Subject name preceding an alias definition, when found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_subject: Option<String>,

    /// Alias term matches the configured role list
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_role: bool,

    /// Span was synthesized by alias propagation rather than detection
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub propagated: bool,

    /// Classification of an ADDRESS_LINE span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_kind: Option<AddressLineKind>,

    /// Per-line kinds of an ADDRESS_BLOCK span, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_kinds: Vec<AddressLineKind>,

    /// ZIP in the block uses the ZIP+4 form
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub zip_plus_four: bool,

    /// Card scheme for `cc` subtypes (visa, mastercard, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// A detected entity occurrence over the normalized text.
#[derive(Debug, Clone, Serialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Matched text, equal to `normalized[start..end]`
    pub text: String,

    /// Entity label
    pub label: EntityLabel,

    /// Detector that produced the span
    pub source: &'static str,

    /// Confidence in `[0, 1]`
    pub confidence: f64,

    /// Label-specific attributes
    #[serde(default)]
    pub attrs: SpanAttrs,

    /// Cluster assignment, populated by the linker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

impl Span {
    /// Create a span with default attributes.
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        label: EntityLabel,
        source: &'static str,
        confidence: f64,
    ) -> Self {
        debug_assert!(start < end, "invalid span [{start}, {end})");
        Self {
            start,
            end,
            text: text.into(),
            label,
            source,
            confidence,
            attrs: SpanAttrs::default(),
            cluster_id: None,
        }
    }

    /// Attach attributes.
    pub fn with_attrs(mut self, attrs: SpanAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Span length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether two spans overlap under the half-open convention.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}
