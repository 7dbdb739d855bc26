//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the rest of the service
//! consumes. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// HTTP API configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address to bind the axum listener to.
    pub bind: String,
    /// Attach a permissive CORS layer (any origin/method/header).
    /// Matches the browser frontend's expectations; disable when the API
    /// sits behind a same-origin reverse proxy.
    pub cors_any_origin: bool,
}

// ── Storage ──────────────────────────────────────────────────────────────────

/// SQLite storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database file name or path. Relative paths resolve against `work_dir`.
    pub db_path: String,
}

// ── Advisor ──────────────────────────────────────────────────────────────────

/// Advisor (response engine) configuration.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Location assumed when a user has none on record.
    pub default_location: String,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Remote text-generation provider configuration.
/// Populated from `[llm]` in the TOML.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Full text-generation endpoint URL.
    pub api_url: String,
    /// Generation length bound passed as `max_new_tokens`.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

// ── Config (root) ────────────────────────────────────────────────────────────

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub advisor: AdvisorConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var — never sourced from TOML.
    /// When absent the remote provider is disabled and every reply comes
    /// from the rule-based classifier.
    pub llm_api_key: Option<String>,
}

impl Config {
    /// Absolute path of the SQLite database file.
    pub fn db_file(&self) -> PathBuf {
        let p = PathBuf::from(&self.storage.db_path);
        if p.is_absolute() { p } else { self.work_dir.join(p) }
    }
}
