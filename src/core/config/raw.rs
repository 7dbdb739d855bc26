//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    pub service: RawService,
    #[serde(default)]
    pub http: RawHttp,
    #[serde(default)]
    pub storage: RawStorage,
    #[serde(default)]
    pub advisor: RawAdvisor,
    #[serde(default)]
    pub llm: RawLlm,
}

#[derive(Deserialize)]
pub(super) struct RawService {
    pub name: String,
    pub work_dir: String,
    pub log_level: String,
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawHttp {
    #[serde(default = "default_http_bind")]
    pub bind: String,
    #[serde(default = "default_true")]
    pub cors_any_origin: bool,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            bind: default_http_bind(),
            cors_any_origin: true,
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawStorage {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for RawStorage {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

// ── Advisor ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawAdvisor {
    #[serde(default = "default_location")]
    pub default_location: String,
}

impl Default for RawAdvisor {
    fn default() -> Self {
        Self {
            default_location: default_location(),
        }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
    #[serde(default = "default_llm_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_top_p")]
    pub top_p: f32,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            api_url: default_llm_api_url(),
            max_new_tokens: default_llm_max_new_tokens(),
            temperature: default_llm_temperature(),
            top_p: default_llm_top_p(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

// ── Default functions (used by serde) ────────────────────────────────────────

fn default_true() -> bool {
    true
}

pub(super) fn default_http_bind() -> String {
    "127.0.0.1:8080".to_string()
}

pub(super) fn default_db_path() -> String {
    "umoyo.db".to_string()
}

pub(super) fn default_location() -> String {
    "Malawi".to_string()
}

pub(super) fn default_llm_api_url() -> String {
    "https://api-inference.huggingface.co/models/medalpaca/medalpaca-7b".to_string()
}

pub(super) fn default_llm_max_new_tokens() -> u32 {
    300
}

pub(super) fn default_llm_temperature() -> f32 {
    0.7
}

pub(super) fn default_llm_top_p() -> f32 {
    0.9
}

pub(super) fn default_llm_timeout_seconds() -> u64 {
    60
}
