//! Remote text-generation provider.
//!
//! Sends a consultation prompt to an external text-generation endpoint
//! (Hugging Face inference wire shape) and returns the cleaned reply text.
//! All wire types are private to this module — callers never see them.
//! The provider is stateless and one round-trip only; retry and fallback
//! policy belong to [`ResponseEngine`](super::ResponseEngine).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::core::config::LlmConfig;

use super::{ProviderError, UserContext};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for an HTTP text-generation endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    client: Client,
    api_url: String,
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    api_key: String,
}

impl RemoteProvider {
    /// Build a provider from config values and the API key.
    ///
    /// The key is sent as `Authorization: Bearer <key>` on every request.
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            api_key,
        })
    }

    /// Send the consultation prompt for `message` and return the cleaned reply.
    ///
    /// Every failure mode (transport error, timeout, non-2xx status, malformed
    /// payload, empty text) surfaces as a [`ProviderError`]; the caller decides
    /// what to fall back to.
    pub async fn complete(
        &self,
        message: &str,
        ctx: &UserContext,
    ) -> Result<String, ProviderError> {
        let payload = GenerateRequest {
            inputs: build_prompt(message, ctx),
            parameters: GenerateParameters {
                max_new_tokens: self.max_new_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
                do_sample: true,
            },
            options: GenerateOptions {
                wait_for_model: true,
            },
        };

        debug!(
            url = %self.api_url,
            max_new_tokens = payload.parameters.max_new_tokens,
            temperature = payload.parameters.temperature,
            message_len = message.len(),
            "sending remote generation request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full generation request payload");
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.api_url, error = %e, "remote generation request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<GenerateResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize generation response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        let raw = parsed
            .into_text()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing generated text".into()))?;

        Ok(extract_answer(&raw).to_string())
    }
}

/// Build the consultation prompt embedding the patient context.
fn build_prompt(message: &str, ctx: &UserContext) -> String {
    let name = ctx.full_name.as_deref().unwrap_or("Patient");
    let age = ctx
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Below is a medical consultation scenario. Provide a detailed and helpful response \
         based on the user's health concerns.\n\n\
         Context: You are speaking with a patient from {location}.\n\
         Patient details: {name}, age {age} years old.\n\n\
         Question: {message}\n\n\
         Answer: As a medical professional, provide helpful medical advice that is safe and \
         appropriate. Always recommend seeing a healthcare professional for serious \
         conditions. Never provide prescriptions but offer general guidance.",
        location = ctx.location,
    )
}

/// Strip the prompt echo produced by completion-style models.
///
/// When the generated text still contains the literal `Answer:` marker, keep
/// only the substring after its LAST occurrence; otherwise return the whole
/// text. Always trims surrounding whitespace. This is post-processing for one
/// provider's completion format — swapping providers must not touch the
/// classifier, so it lives here.
pub(crate) fn extract_answer(text: &str) -> &str {
    match text.rfind("Answer:") {
        Some(idx) => text[idx + "Answer:".len()..].trim(),
        None => text.trim(),
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    inputs: String,
    parameters: GenerateParameters,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    wait_for_model: bool,
}

/// The endpoint answers either `[{"generated_text": …}]` or a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Many(Vec<Generation>),
    One(Generation),
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        match self {
            GenerateResponse::Many(items) => items.into_iter().next().and_then(|g| g.generated_text),
            GenerateResponse::One(g) => g.generated_text,
        }
    }
}

// Error envelope used by the inference API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        format!("HTTP {status}: {}", env.error)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "remote generation returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_answer_takes_after_last_marker() {
        let text = "Question: x\n\nAnswer: draft\n\nAnswer: rest and hydrate  ";
        assert_eq!(extract_answer(text), "rest and hydrate");
    }

    #[test]
    fn extract_answer_without_marker_trims_whole_text() {
        assert_eq!(extract_answer("  take it easy \n"), "take it easy");
    }

    #[test]
    fn extract_answer_marker_at_end_yields_empty() {
        assert_eq!(extract_answer("echoed prompt Answer:"), "");
    }

    #[test]
    fn prompt_embeds_context_fields() {
        let ctx = UserContext {
            full_name: Some("Grace Banda".into()),
            age: Some(34),
            location: "Lilongwe".into(),
        };
        let prompt = build_prompt("I have a cough", &ctx);
        assert!(prompt.contains("patient from Lilongwe"));
        assert!(prompt.contains("Grace Banda, age 34"));
        assert!(prompt.contains("Question: I have a cough"));
    }

    #[test]
    fn prompt_defaults_for_missing_fields() {
        let prompt = build_prompt("hello", &UserContext::default());
        assert!(prompt.contains("Patient, age unknown"));
        assert!(prompt.contains("patient from Malawi"));
    }

    #[test]
    fn response_parses_array_and_object_shapes() {
        let many: GenerateResponse =
            serde_json::from_str(r#"[{"generated_text": "a"}]"#).unwrap();
        assert_eq!(many.into_text().as_deref(), Some("a"));

        let one: GenerateResponse =
            serde_json::from_str(r#"{"generated_text": "b"}"#).unwrap();
        assert_eq!(one.into_text().as_deref(), Some("b"));
    }

    #[test]
    fn response_missing_field_is_none() {
        let empty: GenerateResponse = serde_json::from_str(r#"[{}]"#).unwrap();
        assert_eq!(empty.into_text(), None);
    }
}
