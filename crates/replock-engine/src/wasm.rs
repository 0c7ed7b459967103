//! WASM bindings for the request engine.
//!
//! The extension background script owns the `webRequest` listener and the
//! storage subscription; it forwards both into a [`WasmRequestFilter`].

#![cfg(feature = "wasm")]

use crate::evaluator::RuleEvaluator;
use crate::parser;
use crate::snapshot::ListenerScope;
use crate::store::StorageChanges;
use crate::types::RuleSet;
use wasm_bindgen::prelude::*;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn scope_to_json(scope: &ListenerScope) -> Result<String, JsValue> {
    serde_json::to_string(scope).map_err(to_js_error)
}

/// WASM-compatible request filter wrapper.
#[wasm_bindgen]
pub struct WasmRequestFilter {
    evaluator: RuleEvaluator,
}

#[wasm_bindgen]
impl WasmRequestFilter {
    /// Creates a new filter with no rules.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            evaluator: RuleEvaluator::new(),
        }
    }

    /// Replaces the rules with a JSON rule list (array or `{rules}` object).
    /// `null`/empty input clears the rules. Returns the listener scope JSON.
    #[wasm_bindgen]
    pub fn set_rules_json(&self, json: &str) -> Result<String, JsValue> {
        let trimmed = json.trim();
        let rules: RuleSet = if trimmed.is_empty() || trimmed == "null" {
            RuleSet::new()
        } else {
            parser::parse_rules_with_format(trimmed, parser::RuleFormat::Json)
                .map_err(to_js_error)?
        };
        scope_to_json(&self.evaluator.replace_rules(rules))
    }

    /// Applies a `storage.onChanged` event. Returns the new listener scope
    /// JSON, or `undefined` if the rules were not touched.
    #[wasm_bindgen]
    pub fn apply_storage_change(
        &self,
        changes_json: &str,
        area: &str,
    ) -> Result<Option<String>, JsValue> {
        let changes: StorageChanges = serde_json::from_str(changes_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid storage change: {}", e)))?;

        self.evaluator
            .apply_storage_change(area, &changes)
            .map(|scope| scope_to_json(&scope))
            .transpose()
    }

    /// Evaluates a request URL. Returns the blocking response as JSON, or
    /// `undefined` if the request should proceed untouched.
    #[wasm_bindgen]
    pub fn handle_request(&self, url: &str) -> Result<Option<String>, JsValue> {
        self.evaluator
            .decide(url)
            .to_blocking_response()
            .map(|response| response.to_json().map_err(to_js_error))
            .transpose()
    }

    /// Patterns the host should register its listener for.
    #[wasm_bindgen]
    pub fn url_filters(&self) -> Vec<String> {
        self.evaluator.snapshot().url_filters()
    }

    /// Fingerprint of the active rule set.
    #[wasm_bindgen]
    pub fn fingerprint(&self) -> String {
        self.evaluator.snapshot().fingerprint().to_string()
    }

    /// Returns the number of loaded rules.
    #[wasm_bindgen]
    pub fn rule_count(&self) -> usize {
        self.evaluator.snapshot().len()
    }
}

impl Default for WasmRequestFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs a message to the console (for debugging).
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(&format!("[replock] {}", message)));
}

/// Returns the version of the request engine.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_invalid_rules_json_rejected() {
        let filter = WasmRequestFilter::new();
        assert!(filter.set_rules_json("[{").is_err());
        assert_eq!(filter.rule_count(), 0);
    }

    #[wasm_bindgen_test]
    fn test_version() {
        assert_eq!(version(), crate::VERSION);
    }
}
