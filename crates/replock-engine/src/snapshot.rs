//! Immutable, precompiled rule snapshots.
//!
//! A snapshot is built once per rule-set change and then only read. All
//! fallible work (pattern compilation) happens here so that evaluating a
//! request never fails.

use crate::error::RuleError;
use crate::hash;
use crate::pattern::CompiledPattern;
use crate::types::{Rule, RuleSet};
use log::warn;
use serde::{Deserialize, Serialize};

/// A rule together with its compiled `from` pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    pattern: std::result::Result<CompiledPattern, RuleError>,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Self {
        let pattern = CompiledPattern::compile(&rule.from);
        Self { rule, pattern }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The compiled pattern, or `None` if compilation failed.
    pub fn pattern(&self) -> Option<&CompiledPattern> {
        self.pattern.as_ref().ok()
    }

    pub fn error(&self) -> Option<&RuleError> {
        self.pattern.as_ref().err()
    }

    /// Returns true if the rule's pattern matches the whole URL.
    /// Rules whose pattern failed to compile never match.
    pub fn matches(&self, url: &str) -> bool {
        self.pattern().map_or(false, |p| p.is_match(url))
    }
}

/// Which URLs the host should intercept for a given rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ListenerScope {
    /// No rules: the host should remove its request listener.
    Inactive,
    /// Listen for requests matching any of these patterns.
    Active { urls: Vec<String> },
}

impl ListenerScope {
    pub fn is_active(&self) -> bool {
        matches!(self, ListenerScope::Active { .. })
    }

    pub fn urls(&self) -> &[String] {
        match self {
            ListenerScope::Inactive => &[],
            ListenerScope::Active { urls } => urls,
        }
    }
}

/// An ordered, compiled rule set.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    rules: Vec<CompiledRule>,
    fingerprint: String,
}

impl RuleSnapshot {
    /// Creates a snapshot with no rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fingerprint: hash::EMPTY_FINGERPRINT.to_string(),
        }
    }

    /// Compiles every rule, preserving order.
    ///
    /// Rules whose pattern does not compile are kept (so indices line up with
    /// the supplied list) but never match.
    pub fn build(rules: RuleSet) -> Self {
        let fingerprint = hash::fingerprint(&rules).unwrap_or_else(|e| {
            warn!("Failed to fingerprint rule set: {}", e);
            format!("r:unhashed:{}", rules.len())
        });

        let rules: Vec<CompiledRule> = rules.into_iter().map(CompiledRule::compile).collect();
        for (index, compiled) in rules.iter().enumerate() {
            if let Some(err) = compiled.error() {
                warn!("Rule #{} will be skipped: {}", index, err);
            }
        }

        Self { rules, fingerprint }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compiled rules in evaluation order.
    pub fn compiled(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// The rules as originally supplied.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(CompiledRule::rule)
    }

    /// Identifies the rule list this snapshot was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Rules that failed to compile, with their position in the list.
    pub fn invalid_rules(&self) -> Vec<(usize, &RuleError)> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(index, compiled)| compiled.error().map(|err| (index, err)))
            .collect()
    }

    /// Every rule's `from` pattern, in order, for listener registration.
    pub fn url_filters(&self) -> Vec<String> {
        self.rules().map(|rule| rule.from.clone()).collect()
    }

    /// The interception scope the host should register for this snapshot.
    pub fn listener_scope(&self) -> ListenerScope {
        if self.is_empty() {
            ListenerScope::Inactive
        } else {
            ListenerScope::Active {
                urls: self.url_filters(),
            }
        }
    }
}

impl Default for RuleSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds a snapshot from a rule list.
pub fn build_snapshot(rules: RuleSet) -> RuleSnapshot {
    RuleSnapshot::build(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RuleSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.listener_scope(), ListenerScope::Inactive);
        assert_eq!(snapshot.fingerprint(), hash::EMPTY_FINGERPRINT);
        assert_eq!(build_snapshot(Vec::new()).fingerprint(), snapshot.fingerprint());
    }

    #[test]
    fn test_order_is_preserved() {
        let snapshot = build_snapshot(vec![
            Rule::block("https://b.com/*"),
            Rule::redirect("https://a.com/*", "https://c.com/*"),
            Rule::block("https://b.com/*"),
        ]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot.url_filters(),
            vec!["https://b.com/*", "https://a.com/*", "https://b.com/*"]
        );
        assert!(snapshot.listener_scope().is_active());
        assert_eq!(snapshot.listener_scope().urls().len(), 3);
    }

    #[test]
    fn test_invalid_rule_is_kept_but_never_matches() {
        let huge = format!("https://a.com/{}", "x".repeat(5_000_000));
        let snapshot = build_snapshot(vec![Rule::block(huge.clone()), Rule::block("https://a.com/*")]);

        let invalid = snapshot.invalid_rules();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].0, 0);
        assert!(!snapshot.compiled()[0].matches(&huge));
        assert!(snapshot.compiled()[1].matches("https://a.com/x"));
    }

    #[test]
    fn test_listener_scope_serialization() {
        let scope = ListenerScope::Active {
            urls: vec!["https://a.com/*".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&scope).unwrap(),
            r#"{"state":"active","urls":["https://a.com/*"]}"#
        );
        assert_eq!(
            serde_json::to_string(&ListenerScope::Inactive).unwrap(),
            r#"{"state":"inactive"}"#
        );
    }
}
