use serde::Serialize;

use super::{CompletionRequest, Dialect, ReasoningEffort, ResponseFormat};
use crate::capture::{truncate_middle, CapturedContent};

pub const BASELINE_OUTPUT_BUDGET: u32 = 1000;
pub const ESCALATED_OUTPUT_BUDGET: u32 = 2000;
pub const BASELINE_TEMPERATURE: f32 = 0.3;
pub const ESCALATED_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub dialect: Dialect,
}

/// Models offered on the options page.
pub fn available_models() -> Vec<ModelInfo> {
    ["gpt-4o-mini", "gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo", "gpt-5-mini", "gpt-5"]
        .into_iter()
        .map(|id| ModelInfo {
            id: id.to_string(),
            dialect: Dialect::for_model(id),
        })
        .collect()
}

pub fn build_prompt(content: &CapturedContent, categories: &[String], max_input_chars: usize) -> String {
    let selected = truncate_middle(&content.selected_text, max_input_chars);
    let allowed = categories
        .iter()
        .map(|c| format!("\"{}\"", c.replace('"', "'")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::from(
        "You are helping a technology leader turn something they read into an engaging LinkedIn post \
         that builds awareness and establishes thought leadership.\n\n",
    );

    prompt.push_str(&format!("Content to transform: \"{}\"\n", selected));
    prompt.push_str(&format!("Source URL: {}\n", content.source_url));
    prompt.push_str(&format!("Page Title: \"{}\"\n", content.page_title));
    if let Some(author) = content.author.as_deref().filter(|a| !a.trim().is_empty()) {
        prompt.push_str(&format!("Original Author: {}\n", author));
    }

    prompt.push_str(
        "\nCreate a LinkedIn post following these guidelines:\n\
         1. Open with a punchy, specific hook: a counterintuitive insight, a bold claim, a telling \
            metric or a short scenario. Avoid generic openers and overused rhetorical questions.\n\
         2. Keep a conversational, approachable tone.\n\
         3. Aim for 1,000-2,000 characters (around 1,500 is ideal).\n\
         4. Use a few relevant emojis, without overdoing it.\n\
         5. Connect to developer experience, AI infrastructure or productivity where it fits naturally.\n\
         6. Attribute the original author or source within the post.\n\
         7. End with one of: a thought-provoking question, an actionable takeaway, or a forward-looking insight.\n\
         8. No hashtags.\n\n",
    );

    prompt.push_str(&format!(
        "Respond with a single JSON object and nothing else. It must have exactly these four fields:\n\
         {{\n  \"linkedinPost\": string,\n  \"characterCount\": integer,\n  \"category\": string,\n  \"isNewCategory\": boolean\n}}\n\
         \"category\" must be exactly ONE of: {}.\n\
         Only if none of them fits, suggest a single new category and set \"isNewCategory\" to true. \
         Never return more than one category.",
        allowed
    ));

    prompt
}

/// Builds the first-attempt request. The dialect comes from the model name alone.
pub fn build_request(
    content: &CapturedContent,
    model: &str,
    categories: &[String],
    max_input_chars: usize,
) -> CompletionRequest {
    let dialect = Dialect::for_model(model);
    let prompt = build_prompt(content, categories, max_input_chars);

    match dialect {
        Dialect::CompletionTokens => CompletionRequest {
            model: model.to_string(),
            dialect,
            prompt,
            output_budget: BASELINE_OUTPUT_BUDGET,
            temperature: None,
            response_format: ResponseFormat::Json,
            reasoning_effort: Some(ReasoningEffort::Low),
        },
        Dialect::Legacy => CompletionRequest {
            model: model.to_string(),
            dialect,
            prompt,
            output_budget: BASELINE_OUTPUT_BUDGET,
            temperature: Some(BASELINE_TEMPERATURE),
            response_format: ResponseFormat::None,
            reasoning_effort: None,
        },
    }
}

/// Second-attempt variant: doubled budget, tighter temperature where allowed.
pub fn escalate(request: &CompletionRequest) -> CompletionRequest {
    let mut next = request.clone();
    next.output_budget = ESCALATED_OUTPUT_BUDGET;
    if next.dialect.supports_temperature() {
        next.temperature = Some(ESCALATED_TEMPERATURE);
    }
    next
}
