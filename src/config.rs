//! Configuration management for the redaction engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a redaction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pseudonym generation settings
    #[serde(default)]
    pub pseudonyms: PseudonymConfig,

    /// Detector settings
    #[serde(default)]
    pub detectors: DetectorConfig,

    /// Redaction policy
    #[serde(default)]
    pub redact: RedactPolicy,

    /// Output verification
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Safety guard settings
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// Pseudonym seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PseudonymConfig {
    /// Reuse the same pseudonyms across documents (global key scope).
    /// When false, the key is scoped to each document's hash.
    #[serde(default)]
    pub cross_doc_consistency: bool,

    /// Seed secret source
    #[serde(default)]
    pub seed: SeedConfig,

    /// Fail at startup if the secret is absent
    #[serde(default)]
    pub require_secret: bool,
}

impl Default for PseudonymConfig {
    fn default() -> Self {
        Self {
            cross_doc_consistency: false,
            seed: SeedConfig::default(),
            require_secret: false,
        }
    }
}

/// Where the seed secret comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Environment variable holding the secret. The variable is read by the
    /// CLI boundary, never by the core.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
        }
    }
}

/// Detector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    /// Optional NER provider
    #[serde(default)]
    pub ner: ProviderConfig,

    /// Optional coreference provider
    #[serde(default)]
    pub coref: ProviderConfig,

    /// Account identifier detection
    #[serde(default)]
    pub account_ids: AccountIdConfig,
}

/// Settings for an optional external provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Consult the provider when present
    #[serde(default)]
    pub enable: bool,

    /// Treat provider absence or failure as fatal
    #[serde(default)]
    pub require: bool,
}

/// Account identifier detector options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountIdConfig {
    /// Detect keyword-anchored generic account references in addition to
    /// the checksummed subtypes.
    #[serde(default = "default_true")]
    pub generic: bool,
}

impl Default for AccountIdConfig {
    fn default() -> Self {
        Self { generic: true }
    }
}

/// Replacement policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedactPolicy {
    /// How alias labels are treated
    #[serde(default)]
    pub alias_labels: AliasPolicy,

    /// Replace generic (non-DOB) dates
    #[serde(default)]
    pub generic_dates: bool,
}

impl Default for RedactPolicy {
    fn default() -> Self {
        Self {
            alias_labels: AliasPolicy::default(),
            generic_dates: false,
        }
    }
}

/// Alias label handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// Replace every alias mention
    #[default]
    Replace,
    /// Keep role-word aliases (Buyer, Seller, ...) verbatim
    KeepRoles,
}

/// Verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Strict mode: any residual PII in the output fails the run
    #[serde(default)]
    pub fail_on_residual: bool,
}

/// Safety guard settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Strings that must never appear in generated output (known real
    /// emails, bank names, people).
    #[serde(default)]
    pub sensitive_values: Vec<String>,
}

fn default_secret_env() -> String {
    "REDACTOR_SECRET".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Create a configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for creating configurations programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn cross_doc_consistency(mut self, enable: bool) -> Self {
        self.config.pseudonyms.cross_doc_consistency = enable;
        self
    }

    pub fn require_secret(mut self, require: bool) -> Self {
        self.config.pseudonyms.require_secret = require;
        self
    }

    pub fn enable_ner(mut self, enable: bool) -> Self {
        self.config.detectors.ner.enable = enable;
        self
    }

    pub fn require_ner(mut self, require: bool) -> Self {
        self.config.detectors.ner.require = require;
        self
    }

    pub fn enable_coref(mut self, enable: bool) -> Self {
        self.config.detectors.coref.enable = enable;
        self
    }

    pub fn alias_labels(mut self, policy: AliasPolicy) -> Self {
        self.config.redact.alias_labels = policy;
        self
    }

    pub fn generic_dates(mut self, redact: bool) -> Self {
        self.config.redact.generic_dates = redact;
        self
    }

    pub fn fail_on_residual(mut self, strict: bool) -> Self {
        self.config.verification.fail_on_residual = strict;
        self
    }

    pub fn sensitive_values(mut self, values: Vec<String>) -> Self {
        self.config.safety.sensitive_values = values;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let cfg = Config::default();
        assert!(!cfg.pseudonyms.cross_doc_consistency);
        assert!(!cfg.pseudonyms.require_secret);
        assert_eq!(cfg.pseudonyms.seed.secret_env, "REDACTOR_SECRET");
        assert_eq!(cfg.redact.alias_labels, AliasPolicy::Replace);
        assert!(!cfg.redact.generic_dates);
        assert!(!cfg.verification.fail_on_residual);
        assert!(cfg.detectors.account_ids.generic);
    }

    #[test]
    fn parses_toml_options() {
        let toml_src = r#"
            [pseudonyms]
            cross_doc_consistency = true
            require_secret = true

            [pseudonyms.seed]
            secret_env = "MY_SECRET"

            [redact]
            alias_labels = "keep_roles"
            generic_dates = true

            [verification]
            fail_on_residual = true

            [safety]
            sensitive_values = ["First National Bank"]
        "#;
        let cfg: Config = toml::from_str(toml_src).unwrap();
        assert!(cfg.pseudonyms.cross_doc_consistency);
        assert_eq!(cfg.pseudonyms.seed.secret_env, "MY_SECRET");
        assert_eq!(cfg.redact.alias_labels, AliasPolicy::KeepRoles);
        assert!(cfg.redact.generic_dates);
        assert!(cfg.verification.fail_on_residual);
        assert_eq!(cfg.safety.sensitive_values.len(), 1);
    }

    #[test]
    fn rejects_unknown_options() {
        let toml_src = r#"
            [pseudonyms]
            cross_doc_consistencyy = true
        "#;
        assert!(toml::from_str::<Config>(toml_src).is_err());
    }

    #[test]
    fn builder_round_trip() {
        let cfg = Config::builder()
            .cross_doc_consistency(true)
            .alias_labels(AliasPolicy::KeepRoles)
            .fail_on_residual(true)
            .build();
        assert!(cfg.pseudonyms.cross_doc_consistency);
        assert_eq!(cfg.redact.alias_labels, AliasPolicy::KeepRoles);
        assert!(cfg.verification.fail_on_residual);
    }
}
