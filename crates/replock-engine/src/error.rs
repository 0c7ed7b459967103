//! Error types for the request engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Errors that can occur while loading or compiling rules.
///
/// None of these ever reach the request path: a rule whose pattern fails to
/// compile is recorded on the snapshot and treated as non-matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A rule's `from` pattern could not be turned into a matcher.
    #[error("Failed to compile pattern '{pattern}': {message}")]
    PatternCompile { pattern: String, message: String },

    /// A rule list could not be parsed.
    #[error("Failed to parse rules: {0}")]
    Parse(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The rule file format could not be determined.
    #[error("Unsupported rule format: {0}")]
    UnsupportedFormat(String),
}

impl RuleError {
    /// Creates a pattern compile error.
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        RuleError::PatternCompile {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RuleError {
    fn from(err: serde_yaml::Error) -> Self {
        RuleError::Parse(err.to_string())
    }
}
