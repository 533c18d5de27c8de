use postcraft_lib::{process_content, CapturedContent, PipelineError, Settings};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATEGORY: &str = "🚀 Developer Productivity";

fn content() -> CapturedContent {
    CapturedContent::new("AI just got 10x cheaper", "https://x.com/a", "Title")
}

fn settings(server: &MockServer, model: &str) -> Settings {
    Settings::new("sk-test", vec![CATEGORY.to_string()])
        .with_model(model)
        .with_base_url(server.uri())
}

fn completion(content: &str, finish_reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"content": content}, "finish_reason": finish_reason}]
    }))
}

#[tokio::test]
async fn valid_json_completion_becomes_a_structured_post() {
    let server = MockServer::start().await;
    let body = json!({
        "linkedinPost": "💸 AI costs just fell off a cliff. Here's what that means for your team...",
        "characterCount": 72,
        "category": CATEGORY,
        "isNewCategory": false
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(&body, "stop"))
        .expect(1)
        .mount(&server)
        .await;

    let post = process_content(&content(), &settings(&server, "gpt-4o-mini"))
        .await
        .unwrap();

    assert_eq!(post.category, CATEGORY);
    assert!(!post.linkedin_post.is_empty());
    assert!(!post.is_new_category);
    assert!(!post.synthesized);
    assert_eq!(post.original_text, "AI just got 10x cheaper");
    assert_eq!(post.source_url, "https://x.com/a");

    let iso8601 = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$").unwrap();
    assert!(iso8601.is_match(&post.timestamp), "bad timestamp {}", post.timestamp);
}

#[tokio::test]
async fn empty_truncated_responses_escalate_once_then_fail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_completion_tokens": 1000})))
        .respond_with(completion("", "length"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_completion_tokens": 2000})))
        .respond_with(completion("", "length"))
        .expect(1)
        .mount(&server)
        .await;

    let err = process_content(&content(), &settings(&server, "gpt-5-mini"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCompletion { .. }));
}

#[tokio::test]
async fn escalated_attempt_can_recover() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 1000})))
        .respond_with(completion("{\"linkedinPost\": \"cut", "length"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 2000})))
        .respond_with(completion(
            "Sure! {\"linkedinPost\":\"Full post\",\"characterCount\":9,\"category\":\"🚀 Developer Productivity, 📊 Tech Strategy\",\"isNewCategory\":false}",
            "stop",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let post = process_content(&content(), &settings(&server, "gpt-4o-mini"))
        .await
        .unwrap();
    assert_eq!(post.linkedin_post, "Full post");
    assert_eq!(post.category, CATEGORY);
}

#[tokio::test]
async fn plain_text_completion_is_a_degraded_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("Costs are down 10x. Build more.", "stop"))
        .expect(1)
        .mount(&server)
        .await;

    let post = process_content(&content(), &settings(&server, "gpt-4o-mini"))
        .await
        .unwrap();
    assert!(post.synthesized);
    assert_eq!(post.linkedin_post, "Costs are down 10x. Build more.");
    assert_eq!(post.category, CATEGORY);
    assert!(!post.is_new_category);
    assert_eq!(post.character_count, 31);
}

#[tokio::test]
async fn http_failure_is_surfaced_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("{\"error\":\"slow down\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = process_content(&content(), &settings(&server, "gpt-4o-mini"))
        .await
        .unwrap_err();
    match err {
        PipelineError::Upstream { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out_as_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("too late", "stop").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server, "gpt-4o-mini");
    settings.request_timeout_secs = 1;

    let err = process_content(&content(), &settings).await.unwrap_err();
    assert!(matches!(err, PipelineError::Transport(_)), "unexpected error: {err}");
}
