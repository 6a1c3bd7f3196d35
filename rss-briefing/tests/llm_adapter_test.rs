use rss_briefing::config::AiConfig;
use rss_briefing::delivery::narration::HttpNarrator;
use rss_briefing::types::{CompletionRequest, CompletionService, NarrationRequest, NarrationService};
use rss_briefing::OpenAiCompatibleAdapter;
use serde_json::json;
use std::sync::Once;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn adapter(server: &MockServer) -> OpenAiCompatibleAdapter {
    let config = AiConfig {
        base_url: format!("{}/v1/", server.uri()),
        api_key: Some("sk-test".to_string()),
        request_timeout_secs: 5,
        reasoning_timeout_secs: 5,
    };
    OpenAiCompatibleAdapter::new(&config).unwrap()
}

fn request(model: &str, reasoning_budget: Option<u32>) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        system: "You are an editor.".to_string(),
        user: "Pick topics.".to_string(),
        max_tokens: 512,
        temperature: 0.3,
        reasoning_budget,
    }
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    })
}

#[tokio::test]
async fn test_fast_tier_request_carries_no_reasoning_fields() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "qwen-plus",
            "max_tokens": 512,
            "messages": [
                { "role": "system", "content": "You are an editor." },
                { "role": "user", "content": "Pick topics." }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("1. Rates\n2. Oil")))
        .expect(1)
        .mount(&server)
        .await;

    let response = adapter(&server).complete(&request("qwen-plus", None)).await.unwrap();
    assert_eq!(response.text, "1. Rates\n2. Oil");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("enable_thinking").is_none());
    assert!(body.get("thinking_budget").is_none());
}

#[tokio::test]
async fn test_deep_tier_request_enables_thinking_with_budget() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "qwen3-max",
            "enable_thinking": true,
            "thinking_budget": 3000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("**Facts**: ...")))
        .expect(1)
        .mount(&server)
        .await;

    let response = adapter(&server)
        .complete(&request("qwen3-max", Some(3000)))
        .await
        .unwrap();
    assert!(response.text.starts_with("**Facts**"));
}

#[tokio::test]
async fn test_server_error_is_reported() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .complete(&request("qwen-plus", None))
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("500"));
    assert!(message.contains("upstream overloaded"));
}

#[tokio::test]
async fn test_empty_choices_are_an_error() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let result = adapter(&server).complete(&request("qwen-plus", None)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_narrator_posts_text_and_returns_audio() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/speech"))
        .and(header("authorization", "Bearer tts-key"))
        .and(body_partial_json(json!({
            "text": "Good morning.",
            "voice": "en-US-AndrewNeural",
            "rate": "+5%",
            "format": "mp3"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x49, 0x44, 0x33, 0x04]))
        .expect(1)
        .mount(&server)
        .await;

    let narrator = HttpNarrator::new(
        format!("{}/speech", server.uri()),
        Some("tts-key".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    let audio = narrator
        .synthesize(&NarrationRequest {
            text: "Good morning.".to_string(),
            voice: "en-US-AndrewNeural".to_string(),
            rate: "+5%".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04]);
}

#[tokio::test]
async fn test_narrator_rejects_empty_audio() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/speech"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let narrator =
        HttpNarrator::new(format!("{}/speech", server.uri()), None, Duration::from_secs(5)).unwrap();
    let result = narrator
        .synthesize(&NarrationRequest {
            text: "Hello".to_string(),
            voice: "v".to_string(),
            rate: "+0%".to_string(),
        })
        .await;
    assert!(result.is_err());
}
