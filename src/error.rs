use thiserror::Error;

// ─── Pipeline errors ─────────────────────────────────────────────────────────

/// Every failure the post pipeline can hand back to its caller.
///
/// Falling back to a synthesized post from unstructured text is not an error;
/// it is reported through `StructuredPost::synthesized` instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or unusable settings. Raised before any network call.
    #[error("{0}")]
    Configuration(String),

    /// Non-success HTTP status from the completion endpoint.
    #[error("OpenAI API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// Connection failure or timeout before a response arrived.
    #[error("OpenAI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose envelope could not be decoded.
    #[error("Failed to parse OpenAI response: {0}")]
    Decode(String),

    /// Both attempts came back without usable text.
    #[error("The model ({model}) returned an empty response. Try again or choose a different model in Settings.")]
    EmptyCompletion { model: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn missing_api_key() -> Self {
        Self::Configuration(
            "OpenAI API key not configured. Go to Settings to add your key.".to_string(),
        )
    }

    /// HTTP status for upstream failures, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
