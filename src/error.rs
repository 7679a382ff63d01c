//! Error types for the redaction engine.

use thiserror::Error;

/// Main error type for the redaction pipeline.
#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing pseudonym secret: set {0} or disable pseudonyms.require_secret")]
    MissingSecret(String),

    #[error("Detector '{detector}' failed: {message}")]
    Detector { detector: String, message: String },

    #[error("No safe pseudonym for {label} after {retries} retries: {reason}")]
    Pseudonym {
        label: String,
        retries: u32,
        reason: String,
    },

    #[error("Replacement plan invalid: {0}")]
    Plan(String),

    #[error("Verification failed: {residuals} residual span(s), leakage score {score}")]
    Verification { residuals: usize, score: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for redaction operations.
pub type Result<T> = std::result::Result<T, RedactError>;

impl RedactError {
    /// Process exit code for this error when surfaced through the CLI.
    ///
    /// `0` success, `3` I/O, `4` config/secret, `5` pipeline, `6` verification.
    pub fn exit_code(&self) -> i32 {
        match self {
            RedactError::Io(_) => 3,
            RedactError::Config(_) | RedactError::MissingSecret(_) | RedactError::Toml(_) => 4,
            RedactError::Verification { .. } => 6,
            _ => 5,
        }
    }
}
