//! Rule file parser.
//!
//! Rule lists are stored by the host as a JSON array. For configuration on
//! disk, and for import/export, the same records are also accepted as YAML
//! and wrapped in a `rules:` document.

use crate::error::{RuleError, Result};
use crate::types::RuleSet;
use serde::{Deserialize, Serialize};

/// Supported rule file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Yaml,
    Json,
}

impl RuleFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(RuleFormat::Yaml)
        } else if path.ends_with(".json") {
            Some(RuleFormat::Json)
        } else {
            None
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            RuleFormat::Json
        } else {
            RuleFormat::Yaml
        }
    }
}

/// A rule document: the rule list under a `rules` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: RuleSet,
}

/// Returns true if the content is a bare list rather than a `rules:`
/// document. Deciding up front lets the real parse error surface.
fn is_bare_list(content: &str, format: RuleFormat) -> bool {
    let trimmed = content.trim_start();
    match format {
        RuleFormat::Json => trimmed.starts_with('['),
        RuleFormat::Yaml => trimmed.starts_with('[') || trimmed.starts_with('-'),
    }
}

/// Parses a rule list from a string, auto-detecting format.
pub fn parse_rules(content: &str) -> Result<RuleSet> {
    let format = RuleFormat::detect(content);
    parse_rules_with_format(content, format)
}

/// Parses a rule list from a string with specified format.
pub fn parse_rules_with_format(content: &str, format: RuleFormat) -> Result<RuleSet> {
    if content.trim().is_empty() {
        return Ok(RuleSet::new());
    }
    let bare = is_bare_list(content, format);
    let rules = match format {
        RuleFormat::Json if bare => serde_json::from_str(content)?,
        RuleFormat::Json => serde_json::from_str::<RuleDocument>(content)?.rules,
        RuleFormat::Yaml if bare => serde_yaml::from_str(content)?,
        RuleFormat::Yaml => serde_yaml::from_str::<RuleDocument>(content)?.rules,
    };
    Ok(rules)
}

/// Parses a rule file, choosing the format from its name.
pub fn parse_rules_file(path: &str, content: &str) -> Result<RuleSet> {
    let format = RuleFormat::from_extension(path)
        .ok_or_else(|| RuleError::UnsupportedFormat(path.to_string()))?;
    parse_rules_with_format(content, format)
}

/// Serializes a rule list to the JSON array the host stores.
pub fn to_json(rules: &RuleSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

/// Serializes a rule list to a YAML document.
pub fn to_yaml(rules: &RuleSet) -> Result<String> {
    let doc = RuleDocument {
        rules: rules.clone(),
    };
    serde_yaml::to_string(&doc).map_err(|e| RuleError::Serialization(e.to_string()))
}
