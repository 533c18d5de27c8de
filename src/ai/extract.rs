use serde_json::{json, Map, Value};

use crate::error::{PipelineError, Result};

/// How the structured record was obtained from the completion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The whole completion was a JSON object.
    Strict,
    /// A JSON object was found inside surrounding prose.
    Embedded,
    /// No JSON at all; the raw text became the post.
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub fields: Map<String, Value>,
    pub source: ExtractionSource,
}

/// Turns completion text into a JSON object, trying progressively looser strategies.
///
/// Blank text is the only failure: there is nothing to salvage.
pub fn extract(raw: &str, categories: &[String], model: &str) -> Result<Extraction> {
    if let Some(fields) = parse_object(raw.trim()) {
        return Ok(Extraction {
            fields,
            source: ExtractionSource::Strict,
        });
    }

    if let Some(fields) = find_embedded_object(raw) {
        log::debug!("Recovered JSON object embedded in prose");
        return Ok(Extraction {
            fields,
            source: ExtractionSource::Embedded,
        });
    }

    if raw.trim().is_empty() {
        return Err(PipelineError::EmptyCompletion {
            model: model.to_string(),
        });
    }

    log::warn!("Completion was not JSON, using the raw text as the post");
    Ok(Extraction {
        fields: synthesize(raw, categories),
        source: ExtractionSource::Synthesized,
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Finds the first `{...}` substring that parses as a JSON object.
///
/// Braces inside string literals are skipped. Each opening brace is only
/// tried up to its matching close; if that candidate fails to parse, the next
/// opening brace is tried.
pub fn find_embedded_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();

    for (start, _) in text.match_indices('{') {
        let mut depth: i64 = 0;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &b) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
                continue;
            }

            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset;
                        if let Some(map) = parse_object(&text[start..=end]) {
                            return Some(map);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    None
}

fn synthesize(raw: &str, categories: &[String]) -> Map<String, Value> {
    let category = super::normalize::default_category(categories);
    let fields = json!({
        "linkedinPost": raw,
        "characterCount": raw.chars().count(),
        "category": category,
        "isNewCategory": false,
    });
    match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
