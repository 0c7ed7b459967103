//! Request evaluation engine.

use crate::decision::Decision;
use crate::snapshot::{ListenerScope, RuleSnapshot};
use crate::store::{self, StorageChanges};
use crate::types::{Rule, RuleSet, RuleType};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Result of evaluating one request, with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The decision to enforce.
    pub decision: Decision,

    /// Index of the deciding rule. `None` for a default allow.
    pub rule_index: Option<usize>,
}

impl Evaluation {
    fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            rule_index: None,
        }
    }
}

/// Evaluates a request URL against a snapshot.
///
/// Rules are walked in order. A matching block rule ends the walk. A matching
/// redirect rule ends it only if it has a target and the computed target
/// differs from `url`; otherwise evaluation moves on to the next rule.
pub fn evaluate(url: &str, snapshot: &RuleSnapshot) -> Evaluation {
    for (index, compiled) in snapshot.compiled().iter().enumerate() {
        if !compiled.matches(url) {
            continue;
        }

        let rule = compiled.rule();
        match rule.rule_type {
            RuleType::Block => {
                debug!("Blocking: {}", url);
                return Evaluation {
                    decision: Decision::Block,
                    rule_index: Some(index),
                };
            }
            RuleType::Redirect => {
                let capture = compiled.pattern().and_then(|p| p.capture(url));
                let Some(target) = redirect_target(rule, capture) else {
                    continue;
                };
                if target == url {
                    continue;
                }
                debug!("Redirecting: {} -> {}", url, target);
                return Evaluation {
                    decision: Decision::Redirect(target),
                    rule_index: Some(index),
                };
            }
            RuleType::Unknown(_) => continue,
        }
    }

    Evaluation::allow()
}

/// Decides what to do with a request URL.
pub fn decide(url: &str, snapshot: &RuleSnapshot) -> Decision {
    evaluate(url, snapshot).decision
}

/// Computes a redirect rule's destination.
///
/// The first `*` in the target is replaced by the capture when both exist;
/// otherwise the target is used verbatim. Returns `None` for a missing or
/// empty target.
fn redirect_target(rule: &Rule, capture: Option<&str>) -> Option<String> {
    let to = rule.target()?;
    match capture {
        Some(captured) if to.contains('*') => Some(to.replacen('*', captured, 1)),
        _ => Some(to.to_string()),
    }
}

type Subscriber = Arc<dyn Fn(&ListenerScope) + Send + Sync>;

/// Holds the current rule snapshot and evaluates requests against it.
///
/// The snapshot is swapped as a whole; the lock is held only to clone or
/// replace the `Arc`, never during evaluation. Replacements are serialized
/// so subscribers see scopes in the same order the snapshots went live.
pub struct RuleEvaluator {
    snapshot: RwLock<Arc<RuleSnapshot>>,
    subscribers: RwLock<Vec<Subscriber>>,
    updating: Mutex<()>,
}

impl RuleEvaluator {
    /// Creates a new evaluator with no rules.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RuleSnapshot::empty())),
            subscribers: RwLock::new(Vec::new()),
            updating: Mutex::new(()),
        }
    }

    /// Creates an evaluator preloaded with rules.
    pub fn with_rules(rules: RuleSet) -> Self {
        let evaluator = Self::new();
        *evaluator.snapshot.write() = Arc::new(RuleSnapshot::build(rules));
        evaluator
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        self.snapshot.read().clone()
    }

    /// Registers a callback invoked with the new listener scope after every
    /// rule-set replacement.
    ///
    /// Callbacks may subscribe further callbacks, but must not replace the
    /// rules themselves: replacement is serialized and would deadlock.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&ListenerScope) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Arc::new(callback));
    }

    /// Replaces the rule set wholesale and returns the new listener scope.
    pub fn replace_rules(&self, rules: RuleSet) -> ListenerScope {
        let snapshot = Arc::new(RuleSnapshot::build(rules));
        let scope = snapshot.listener_scope();

        let _updating = self.updating.lock();
        *self.snapshot.write() = snapshot;

        match &scope {
            ListenerScope::Inactive => info!("No rules to apply. Listeners are inactive."),
            ListenerScope::Active { urls } => {
                info!("Listeners updated with {} rule(s): {:?}", urls.len(), urls)
            }
        }

        let subscribers: Vec<Subscriber> = self.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber(&scope);
        }
        scope
    }

    /// Loads the value read from storage at startup.
    pub fn load_stored(&self, value: Option<RuleSet>) -> ListenerScope {
        self.replace_rules(store::stored_rules(value))
    }

    /// Applies a storage change notification.
    ///
    /// Returns the new listener scope, or `None` if the notification did not
    /// touch the rules.
    pub fn apply_storage_change(&self, area: &str, changes: &StorageChanges) -> Option<ListenerScope> {
        let rules = store::rules_update(area, changes)?;
        Some(self.replace_rules(rules))
    }

    /// Evaluates a request against the current snapshot.
    pub fn evaluate(&self, url: &str) -> Evaluation {
        let snapshot = self.snapshot();
        evaluate(url, &snapshot)
    }

    /// Decides what to do with a request against the current snapshot.
    pub fn decide(&self, url: &str) -> Decision {
        self.evaluate(url).decision
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEvaluator")
            .field("snapshot", &self.snapshot.read())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}
