use serde_json::{Map, Value};

use super::extract::{Extraction, ExtractionSource};
use super::StructuredPost;
use crate::capture::CapturedContent;
use crate::config::CATEGORY_SEPARATOR;
use crate::error::{PipelineError, Result};

/// Collapses a model's category answer to one value.
///
/// Lists (JSON arrays or comma-joined strings) keep their first entry.
pub fn single_category(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.iter().find_map(Value::as_str)?,
        _ => return None,
    };

    let first = raw.split(CATEGORY_SEPARATOR).next().unwrap_or_default().trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// First usable configured category, taken verbatim.
pub fn default_category(categories: &[String]) -> String {
    categories
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Resolves `category` against the supplied set.
///
/// Returns the canonical spelling and whether it is a new category.
fn reconcile_category(candidate: Option<String>, claimed_new: bool, categories: &[String]) -> (String, bool) {
    let Some(candidate) = candidate else {
        return (default_category(categories), false);
    };

    if let Some(known) = categories
        .iter()
        .find(|c| c.trim().eq_ignore_ascii_case(&candidate))
    {
        return (known.clone(), false);
    }

    if !claimed_new {
        log::warn!("Model picked a category outside the configured set: {}", candidate);
    }
    (candidate, true)
}

fn post_text(fields: &Map<String, Value>) -> Option<String> {
    ["linkedinPost", "summary"]
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn character_count(value: Option<&Value>, post: &str) -> u64 {
    let claimed = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    claimed.unwrap_or_else(|| post.chars().count() as u64)
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Shapes an extracted record into the final post and attaches passthrough fields.
pub fn normalize(
    extraction: Extraction,
    content: &CapturedContent,
    categories: &[String],
    model: &str,
) -> Result<StructuredPost> {
    let fields = extraction.fields;

    let linkedin_post = post_text(&fields).ok_or_else(|| {
        log::warn!("Completion JSON had neither linkedinPost nor summary");
        PipelineError::EmptyCompletion {
            model: model.to_string(),
        }
    })?;

    let synthesized = extraction.source == ExtractionSource::Synthesized;
    let (category, is_new_category) = if synthesized {
        (default_category(categories), false)
    } else {
        reconcile_category(
            fields.get("category").and_then(single_category),
            flag(fields.get("isNewCategory")),
            categories,
        )
    };

    Ok(StructuredPost {
        character_count: character_count(fields.get("characterCount"), &linkedin_post),
        linkedin_post,
        category,
        is_new_category,
        original_text: content.selected_text.clone(),
        source_url: content.source_url.clone(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        author: content.author.clone(),
        synthesized,
    })
}
