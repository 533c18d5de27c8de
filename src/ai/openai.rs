use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AIMessage, Completion, CompletionRequest, FinishReason, ReasoningEffort, ResponseFormat};
use crate::config::Settings;
use crate::error::{PipelineError, Result};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<AIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIMessageResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl<'a> OpenAIRequest<'a> {
    fn from_request(request: &'a CompletionRequest) -> Self {
        let (max_tokens, max_completion_tokens) = if request.dialect.supports_temperature() {
            (Some(request.output_budget), None)
        } else {
            (None, Some(request.output_budget))
        };

        Self {
            model: &request.model,
            messages: vec![AIMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens,
            max_completion_tokens,
            temperature: request.temperature,
            response_format: match request.response_format {
                ResponseFormat::Json => Some(OpenAIResponseFormat { kind: "json_object" }),
                ResponseFormat::None => None,
            },
            reasoning_effort: match request.reasoning_effort {
                Some(ReasoningEffort::Low) => Some("low"),
                None => None,
            },
        }
    }
}

impl OpenAIResponse {
    fn into_completion(self) -> Completion {
        let Some(choice) = self.choices.into_iter().next() else {
            return Completion {
                content: String::new(),
                finish_reason: FinishReason::Empty,
            };
        };

        Completion {
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
        }
    }
}

/// Chat-completions client. One call is one round-trip; retrying is the caller's job.
#[derive(Clone)]
pub struct OpenAIClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAIClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::missing_api_key());
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.api_base_url,
            &settings.api_key,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = OpenAIRequest::from_request(request);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("OpenAI API error response ({}): {}", status, body);
            return Err(PipelineError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let envelope: OpenAIResponse =
            serde_json::from_str(&text).map_err(|e| PipelineError::Decode(e.to_string()))?;

        Ok(envelope.into_completion())
    }

    /// Checks that the key is accepted by listing models.
    pub async fn verify_api_key(&self) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let ok = response.status().is_success();
        if !ok {
            log::warn!("API key check failed with status {}", response.status());
        }
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Dialect;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> CompletionRequest {
        let content = crate::capture::CapturedContent::new("text", "https://x.com/a", "Title");
        crate::ai::request::build_request(&content, model, &["A".to_string()], 8000)
    }

    fn client(uri: &str) -> OpenAIClient {
        OpenAIClient::new(uri, "sk-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn legacy_body_uses_max_tokens_and_temperature() {
        let req = request("gpt-4o-mini");
        let body = serde_json::to_value(OpenAIRequest::from_request(&req)).unwrap();
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(body.get("max_completion_tokens").is_none());
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn completion_tokens_body_omits_temperature() {
        let req = request("gpt-5-mini");
        assert_eq!(req.dialect, Dialect::CompletionTokens);
        let body = serde_json::to_value(OpenAIRequest::from_request(&req)).unwrap();
        assert_eq!(body["max_completion_tokens"], 1000);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["reasoning_effort"], "low");
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn response_with_missing_fields_maps_to_empty() {
        let resp: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let completion = resp.into_completion();
        assert_eq!(completion.content, "");
        assert_eq!(completion.finish_reason, FinishReason::Empty);

        let resp: OpenAIResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null},"finish_reason":"length"}]}"#)
                .unwrap();
        let completion = resp.into_completion();
        assert!(!completion.has_text());
        assert_eq!(completion.finish_reason, FinishReason::Length);
    }

    #[test]
    fn empty_key_is_rejected_before_any_call() {
        let err = OpenAIClient::new("http://localhost", "  ", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn complete_sends_bearer_token_and_parses_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 1000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "hi"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client(&server.uri())
            .complete(&request("gpt-4o-mini"))
            .await
            .unwrap();
        assert_eq!(completion.content, "hi");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&request("gpt-4o-mini"))
            .await
            .unwrap_err();
        match err {
            PipelineError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_envelope_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&request("gpt-4o-mini"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[tokio::test]
    async fn verify_api_key_reports_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(client(&server.uri()).verify_api_key().await.unwrap());

        let other = OpenAIClient::new(&server.uri(), "sk-wrong", Duration::from_secs(5)).unwrap();
        assert!(!other.verify_api_key().await.unwrap());
    }
}
