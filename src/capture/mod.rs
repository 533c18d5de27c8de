use serde::{Deserialize, Serialize};

/// Marker placed where the middle of an oversized selection was cut out.
pub const ELLIPSIS: &str = "...";

/// Text the user selected on a page, plus where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedContent {
    pub selected_text: String,
    pub source_url: String,
    pub page_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl CapturedContent {
    pub fn new(
        selected_text: impl Into<String>,
        source_url: impl Into<String>,
        page_title: impl Into<String>,
    ) -> Self {
        Self {
            selected_text: selected_text.into(),
            source_url: source_url.into(),
            page_title: page_title.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selected_text.trim().is_empty()
    }
}

/// Shortens `text` to at most `max_chars` characters by cutting out the middle.
///
/// The first 60% of the budget and the tail that fits after the ellipsis are
/// kept, so both the framing and the conclusion of a long selection survive.
/// Counts Unicode scalar values, never bytes, so multi-byte text is never split.
pub fn truncate_middle(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }

    let marker_len = ELLIPSIS.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }

    let head = (max_chars * 6 / 10).min(max_chars - marker_len);
    let tail = max_chars - head - marker_len;

    let mut out = String::with_capacity(max_chars * 4);
    out.extend(text.chars().take(head));
    out.push_str(ELLIPSIS);
    out.extend(text.chars().skip(len - tail));
    out
}

/// Same as [`truncate_middle`] but tolerates a missing selection.
pub fn truncate_optional(text: Option<&str>, max_chars: usize) -> String {
    text.map(|t| truncate_middle(t, max_chars)).unwrap_or_default()
}
