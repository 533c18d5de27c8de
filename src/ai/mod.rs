pub mod extract;
pub mod llm;
pub mod normalize;
pub mod openai;
pub mod request;
pub mod retry;

use serde::{Deserialize, Serialize};

/// Model name fragments that select the completion-tokens dialect.
/// New families are added here, never at call sites.
const COMPLETION_TOKEN_FAMILIES: &[&str] = &["gpt-5"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIMessage {
    pub role: String,
    pub content: String,
}

/// Request-body conventions a model family expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `max_tokens` plus an explicit temperature.
    Legacy,
    /// `max_completion_tokens`, JSON response mode, fixed default temperature.
    CompletionTokens,
}

impl Dialect {
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        if COMPLETION_TOKEN_FAMILIES.iter().any(|f| model.contains(f)) {
            Self::CompletionTokens
        } else {
            Self::Legacy
        }
    }

    pub fn supports_temperature(self) -> bool {
        matches!(self, Self::Legacy)
    }

    pub fn supports_json_mode(self) -> bool {
        matches!(self, Self::CompletionTokens)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    None,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
}

/// One request to the completion endpoint, independent of wire field names.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub dialect: Dialect,
    pub prompt: String,
    pub output_budget: u32,
    /// Only ever set for dialects that accept it.
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other,
    /// No finish reason reported at all.
    Empty,
}

impl FinishReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("stop") => Self::Stop,
            Some("length") => Self::Length,
            Some(_) => Self::Other,
            None => Self::Empty,
        }
    }
}

/// The text of one completion and why it ended. Missing fields are explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub finish_reason: FinishReason,
}

impl Completion {
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CompletionAttempt {
    pub attempt_number: u8,
    pub request: CompletionRequest,
    pub completion: Completion,
}

/// The normalized post handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredPost {
    pub linkedin_post: String,
    pub character_count: u64,
    pub category: String,
    pub is_new_category: bool,
    pub original_text: String,
    pub source_url: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// True when the model ignored the JSON format and the raw text became the post.
    #[serde(default)]
    pub synthesized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_is_inferred_from_model_name() {
        assert_eq!(Dialect::for_model("gpt-4o-mini"), Dialect::Legacy);
        assert_eq!(Dialect::for_model("gpt-3.5-turbo"), Dialect::Legacy);
        assert_eq!(Dialect::for_model("gpt-5"), Dialect::CompletionTokens);
        assert_eq!(Dialect::for_model("GPT-5-mini"), Dialect::CompletionTokens);
    }

    #[test]
    fn dialects_are_mutually_exclusive() {
        for dialect in [Dialect::Legacy, Dialect::CompletionTokens] {
            assert_ne!(dialect.supports_temperature(), dialect.supports_json_mode());
        }
    }

    #[test]
    fn finish_reason_parsing() {
        assert_eq!(FinishReason::parse(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::parse(Some("length")), FinishReason::Length);
        assert_eq!(FinishReason::parse(Some("content_filter")), FinishReason::Other);
        assert_eq!(FinishReason::parse(None), FinishReason::Empty);
    }

    #[test]
    fn structured_post_uses_camel_case_keys() {
        let post = StructuredPost {
            linkedin_post: "Hello".to_string(),
            character_count: 5,
            category: "A".to_string(),
            is_new_category: false,
            original_text: "orig".to_string(),
            source_url: "https://x.com/a".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            author: None,
            synthesized: false,
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["linkedinPost"], "Hello");
        assert_eq!(json["isNewCategory"], false);
        assert!(json.get("author").is_none());
    }
}
