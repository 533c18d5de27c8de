use super::extract::extract;
use super::normalize::normalize;
use super::openai::OpenAIClient;
use super::request::build_request;
use super::retry::run_with_retry;
use super::StructuredPost;
use crate::capture::CapturedContent;
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::session::manager::{CaptureOutcome, SharedResultStore};

/// Runs captured text through the model and returns a normalized post.
pub struct PostGenerator {
    client: OpenAIClient,
    settings: Settings,
}

impl PostGenerator {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let client = OpenAIClient::from_settings(&settings)?;
        Ok(Self { client, settings })
    }

    pub async fn generate(&self, content: &CapturedContent) -> Result<StructuredPost> {
        if content.is_empty() {
            return Err(PipelineError::Configuration(
                "No text selected. Select some text on the page first.".to_string(),
            ));
        }

        let model = self.settings.model();
        let categories = &self.settings.categories;
        log::info!("Using model: {}", model);

        let request = build_request(content, model, categories, self.settings.max_input_chars);
        let attempt = run_with_retry(request, |req| {
            let client = &self.client;
            async move { client.complete(&req).await }
        })
        .await?;

        let extraction = extract(&attempt.completion.content, categories, model)?;
        log::debug!(
            "Extracted post via {:?} after {} attempt(s)",
            extraction.source,
            attempt.attempt_number
        );

        normalize(extraction, content, categories, model)
    }

    /// Runs the pipeline and files the outcome under `capture_id` for a later reader.
    pub async fn generate_and_store(
        &self,
        capture_id: &str,
        content: &CapturedContent,
        store: &SharedResultStore,
    ) -> Result<StructuredPost> {
        let result = self.generate(content).await;
        let outcome = match &result {
            Ok(post) => CaptureOutcome::Ready(post.clone()),
            Err(e) => CaptureOutcome::Failed(e.to_string()),
        };
        let mut store = store.lock();
        store.evict_expired(std::time::Instant::now());
        store.insert(capture_id, outcome);
        result
    }
}

/// Single entry point: one capture, one settings snapshot, one post.
pub async fn process_content(content: &CapturedContent, settings: &Settings) -> Result<StructuredPost> {
    let generator = PostGenerator::new(settings.clone()).map_err(|e| {
        log::error!("Error processing content: {}", e);
        e
    })?;

    generator.generate(content).await.map_err(|e| {
        log::error!("Error processing content: {}", e);
        e
    })
}
