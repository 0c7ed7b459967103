//! Request decision types.

use serde::{Deserialize, Serialize};

/// What the host must do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "url", rename_all = "lowercase")]
pub enum Decision {
    /// No rule applied. The request proceeds untouched.
    Allow,
    /// The request must be cancelled.
    Block,
    /// The request must be sent to this URL instead.
    Redirect(String),
}

impl Decision {
    /// Returns true if the request proceeds untouched.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Returns true if the request must be cancelled.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Block)
    }

    /// Returns the redirect target, if any.
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Decision::Redirect(url) => Some(url),
            _ => None,
        }
    }

    /// Renders the decision in the shape a `webRequest` blocking listener
    /// returns. `Allow` renders as no response at all.
    pub fn to_blocking_response(&self) -> Option<BlockingResponse> {
        match self {
            Decision::Allow => None,
            Decision::Block => Some(BlockingResponse::cancel()),
            Decision::Redirect(url) => Some(BlockingResponse::redirect(url.clone())),
        }
    }
}

/// Host-facing response for a blocked or redirected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl BlockingResponse {
    /// Creates a cancelling response.
    pub fn cancel() -> Self {
        Self {
            cancel: Some(true),
            redirect_url: None,
        }
    }

    /// Creates a redirecting response.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            cancel: None,
            redirect_url: Some(url.into()),
        }
    }

    /// Serializes the response to JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
