//! Response-selection engine — decides what the doctor says.
//!
//! Two paths produce a reply:
//!
//! - [`RemoteProvider`] — optional call to an external text-generation
//!   endpoint, attempted only when an API key was configured.
//! - [`rules::classify`] — deterministic keyword classifier, used when the
//!   remote path is absent or fails for any reason.
//!
//! [`ResponseEngine::respond`] is the sole entry point the HTTP layer uses:
//! it always returns a string, never an error. Engine instances are shared
//! immutable capabilities — clone them freely.

pub mod remote;
pub mod rules;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::LlmConfig;

pub use remote::RemoteProvider;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── UserContext ───────────────────────────────────────────────────────────────

/// Patient attributes used to personalize advisory text.
///
/// Read-only input to response generation; built by the caller from the
/// user record, never persisted by this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub location: String,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            full_name: None,
            age: None,
            location: "Malawi".to_string(),
        }
    }
}

// ── ResponseEngine ────────────────────────────────────────────────────────────

/// Dispatcher over the remote provider and the rule-based classifier.
#[derive(Debug, Clone)]
pub struct ResponseEngine {
    remote: Option<RemoteProvider>,
}

impl ResponseEngine {
    /// Build the engine from config plus the optional API key.
    ///
    /// Without a key the remote provider is never constructed and every
    /// reply comes from the classifier.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let remote = match api_key {
            Some(key) => Some(RemoteProvider::new(config, key)?),
            None => None,
        };
        Ok(Self { remote })
    }

    /// Engine with no remote provider — classifier only.
    pub fn offline() -> Self {
        Self { remote: None }
    }

    /// Whether a remote provider is configured.
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Produce the advisory reply for `message`.
    ///
    /// The remote attempt is best-effort and single-shot: any provider error
    /// is logged and swallowed, and the classifier supplies the reply. Same
    /// (message, context) always yields the same classifier string.
    pub async fn respond(&self, message: &str, ctx: &UserContext) -> String {
        if let Some(remote) = &self.remote {
            match remote.complete(message, ctx).await {
                Ok(text) => return text,
                Err(e) => {
                    warn!(error = %e, "remote provider unavailable — using rule-based reply");
                }
            }
        }
        let topic = rules::matched_topic(message);
        debug!(topic = topic.unwrap_or("fallback"), "rule-based reply selected");
        rules::classify(message, ctx)
    }
}
