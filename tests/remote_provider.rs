//! Remote provider behavior against a stub HTTP server.
//!
//! The stub (wiremock) plays the text-generation endpoint so the full range
//! of degraded responses — errors, malformed bodies, slow replies — can be
//! exercised without touching the network.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use umoyo_bot::advisor::{RemoteProvider, ResponseEngine, UserContext, rules};
use umoyo_bot::config::LlmConfig;

fn llm_config(api_url: String, timeout_seconds: u64) -> LlmConfig {
    LlmConfig {
        api_url,
        max_new_tokens: 300,
        temperature: 0.7,
        top_p: 0.9,
        timeout_seconds,
    }
}

async fn stub_server() -> MockServer {
    MockServer::start().await
}

#[tokio::test]
async fn success_strips_the_prompt_echo() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "generated_text": "Question: fever\n\nAnswer: Rest, hydrate, and monitor your temperature." }
        ])))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    let reply = provider
        .complete("I have a fever", &UserContext::default())
        .await
        .unwrap();
    assert_eq!(reply, "Rest, hydrate, and monitor your temperature.");
}

#[tokio::test]
async fn success_without_marker_returns_trimmed_text() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
            { "generated_text": "  Drink plenty of fluids.  " }
        )))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    let reply = provider
        .complete("I have a cough", &UserContext::default())
        .await
        .unwrap();
    assert_eq!(reply, "Drink plenty of fluids.");
}

#[tokio::test]
async fn non_success_status_is_an_error_not_a_panic() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({ "error": "model overloaded" })),
        )
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    let err = provider
        .complete("I have a fever", &UserContext::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("model overloaded"), "got: {err}");
}

#[tokio::test]
async fn malformed_payload_is_an_error() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    assert!(
        provider
            .complete("hello", &UserContext::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn empty_generated_text_is_an_error() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "generated_text": "   " }
        ])))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    assert!(
        provider
            .complete("hello", &UserContext::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn slow_endpoint_times_out_into_an_error() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "generated_text": "late" }]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 1);
    let provider = RemoteProvider::new(&cfg, "test-key".into()).unwrap();
    assert!(
        provider
            .complete("hello", &UserContext::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn engine_prefers_the_remote_reply() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "generated_text": "Answer: A tailored reply." }
        ])))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let engine = ResponseEngine::new(&cfg, Some("test-key".into())).unwrap();
    let reply = engine
        .respond("I have a fever", &UserContext::default())
        .await;
    assert_eq!(reply, "A tailored reply.");
}

#[tokio::test]
async fn engine_falls_back_to_rules_when_the_remote_fails() {
    let server = stub_server().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let cfg = llm_config(format!("{}/generate", server.uri()), 5);
    let engine = ResponseEngine::new(&cfg, Some("test-key".into())).unwrap();
    let ctx = UserContext::default();
    let reply = engine.respond("I have a fever", &ctx).await;
    assert_eq!(reply, rules::classify("I have a fever", &ctx));
}
