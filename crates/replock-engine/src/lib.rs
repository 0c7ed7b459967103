//! replock request engine
//!
//! Decides, for every outgoing request a browser extension intercepts,
//! whether to block it, redirect it, or let it through. Rules are wildcard
//! URL patterns evaluated in order; the first applicable rule wins.
//!
//! Compiles to both WASM (for the extension background script) and native.

pub mod decision;
pub mod error;
pub mod evaluator;
pub mod hash;
pub mod parser;
pub mod pattern;
pub mod snapshot;
pub mod store;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use decision::{BlockingResponse, Decision};
pub use error::{Result, RuleError};
pub use evaluator::{decide, evaluate, Evaluation, RuleEvaluator};
pub use snapshot::{build_snapshot, ListenerScope, RuleSnapshot};
pub use types::{Rule, RuleSet, RuleType};

/// Version of the request engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::decision::{BlockingResponse, Decision};
    pub use crate::error::{Result, RuleError};
    pub use crate::evaluator::{decide, evaluate, Evaluation, RuleEvaluator};
    pub use crate::pattern::{compile_capture, compile_match, CompiledPattern, Pattern};
    pub use crate::snapshot::{build_snapshot, ListenerScope, RuleSnapshot};
    pub use crate::store::{StorageChange, StorageChanges};
    pub use crate::types::*;
}
