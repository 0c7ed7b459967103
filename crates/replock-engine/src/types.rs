//! Core types for the request engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// What a rule does to a request whose URL matches its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleType {
    Block,
    Redirect,
    /// A type this engine does not know, kept verbatim so it survives a
    /// save. Empty when the record had no type at all. Such rules never apply.
    Unknown(String),
}

impl RuleType {
    pub fn as_str(&self) -> &str {
        match self {
            RuleType::Block => "block",
            RuleType::Redirect => "redirect",
            RuleType::Unknown(raw) => raw,
        }
    }

    /// Returns true if the record carried no type.
    pub fn is_unset(&self) -> bool {
        matches!(self, RuleType::Unknown(raw) if raw.is_empty())
    }
}

impl Default for RuleType {
    fn default() -> Self {
        RuleType::Unknown(String::new())
    }
}

impl From<String> for RuleType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "block" => RuleType::Block,
            "redirect" => RuleType::Redirect,
            _ => RuleType::Unknown(raw),
        }
    }
}

impl Serialize for RuleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => RuleType::from(raw),
            Value::Null => RuleType::default(),
            other => RuleType::Unknown(other.to_string()),
        })
    }
}

/// Reads any value, keeping it only if it is a string.
fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(string_or_none(deserializer)?.unwrap_or_default())
}

/// A single user-configured rule, as stored by the host.
///
/// Deserialization never rejects a record over its field values: a missing
/// or non-string `from` is the empty pattern, a missing `type` is an unset
/// type, and a non-string `to` is no target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Wildcard pattern over full request URLs. Patterns whose compiled form
    /// exceeds `pattern::PATTERN_SIZE_LIMIT` (hundreds of thousands of
    /// characters) never match.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub from: String,

    #[serde(rename = "type", default, skip_serializing_if = "RuleType::is_unset")]
    pub rule_type: RuleType,

    /// Redirect target template. Only meaningful for redirect rules.
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<String>,
}

impl Rule {
    /// Creates a block rule.
    pub fn block(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            rule_type: RuleType::Block,
            to: None,
        }
    }

    /// Creates a redirect rule.
    pub fn redirect(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            rule_type: RuleType::Redirect,
            to: Some(to.into()),
        }
    }

    /// Returns the redirect target, treating an empty string as absent.
    pub fn target(&self) -> Option<&str> {
        self.to.as_deref().filter(|to| !to.is_empty())
    }
}

/// Ordered rule list. Evaluation is first-match-wins in this order.
pub type RuleSet = Vec<Rule>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_store_record() {
        let rule: Rule = serde_json::from_str(
            r#"{"from": "https://a.com/*", "type": "redirect", "to": "https://b.com/*"}"#,
        )
        .unwrap();
        assert_eq!(rule, Rule::redirect("https://a.com/*", "https://b.com/*"));
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let rule: Rule = serde_json::from_str(r#"{"type": "redirect"}"#).unwrap();
        assert_eq!(rule.from, "");
        assert_eq!(rule.to, None);
        assert_eq!(rule.target(), None);

        let rule: Rule = serde_json::from_str(r#"{"from": "https://x.com/*"}"#).unwrap();
        assert_eq!(rule.rule_type, RuleType::default());
        assert!(rule.rule_type.is_unset());
    }

    #[test]
    fn test_wrongly_typed_fields_are_tolerated() {
        let rule: Rule =
            serde_json::from_str(r#"{"from": 3, "type": "redirect", "to": 5}"#).unwrap();
        assert_eq!(rule.from, "");
        assert_eq!(rule.to, None);

        let rule: Rule = serde_json::from_str(r#"{"from": "*", "type": 7}"#).unwrap();
        assert_eq!(rule.rule_type, RuleType::Unknown("7".to_string()));
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let rule: Rule = serde_json::from_str(r#"{"from": "*", "type": "allow"}"#).unwrap();
        assert_eq!(rule.rule_type, RuleType::Unknown("allow".to_string()));
        assert_eq!(
            serde_json::to_string(&rule).unwrap(),
            r#"{"from":"*","type":"allow"}"#
        );
    }

    #[test]
    fn test_missing_type_stays_missing() {
        let rule: Rule = serde_json::from_str(r#"{"from": "*"}"#).unwrap();
        assert_eq!(serde_json::to_string(&rule).unwrap(), r#"{"from":"*"}"#);
    }

    #[test]
    fn test_empty_target_is_absent() {
        let rule = Rule::redirect("https://a.com/*", "");
        assert_eq!(rule.target(), None);
    }

    #[test]
    fn test_block_serializes_without_target() {
        let json = serde_json::to_string(&Rule::block("https://a.com/x")).unwrap();
        assert_eq!(json, r#"{"from":"https://a.com/x","type":"block"}"#);
    }

    #[test]
    fn test_yaml_record_tolerated() {
        let rule: Rule = serde_yaml::from_str("from: \"https://a.com/*\"\nto: [1, 2]\n").unwrap();
        assert_eq!(rule.from, "https://a.com/*");
        assert_eq!(rule.to, None);
        assert!(rule.rule_type.is_unset());
    }
}
