//! Rule source: the host's key-value storage and its change events.

use crate::types::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage area the rules live in.
pub const RULES_AREA: &str = "local";

/// Storage key holding the rule list.
pub const RULES_KEY: &str = "rules";

/// One entry of a storage change notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default)]
    pub old_value: Option<RuleSet>,

    #[serde(default)]
    pub new_value: Option<RuleSet>,
}

impl StorageChange {
    pub fn new(old_value: Option<RuleSet>, new_value: Option<RuleSet>) -> Self {
        Self {
            old_value,
            new_value,
        }
    }
}

/// Changes keyed by storage key, as delivered by the host.
pub type StorageChanges = HashMap<String, StorageChange>;

/// Extracts the new rule list from a change notification.
///
/// Returns `None` when the notification does not concern the rules (other
/// area or other key). A removed value yields an empty rule list.
pub fn rules_update(area: &str, changes: &StorageChanges) -> Option<RuleSet> {
    if area != RULES_AREA {
        return None;
    }
    changes
        .get(RULES_KEY)
        .map(|change| change.new_value.clone().unwrap_or_default())
}

/// Resolves the stored value read at startup. Absent means no rules.
pub fn stored_rules(value: Option<RuleSet>) -> RuleSet {
    value.unwrap_or_default()
}
