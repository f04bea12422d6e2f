//! The text-extraction collaborator.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use workshop_core::{extraction_prompt, response_schema};

use crate::error::ExtractionError;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Turns raw report text into the model's JSON text output
pub trait Extractor: Send + Sync {
    fn extract(&self, raw_text: &str) -> BoxFuture<'_, Result<String, ExtractionError>>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` with a structured-output schema
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiExtractor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn request_body(raw_text: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": extraction_prompt(raw_text) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        })
    }

    async fn generate(&self, raw_text: &str) -> Result<String, ExtractionError> {
        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model);
        let response: GenerateResponse = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(raw_text))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.text().ok_or(ExtractionError::EmptyResponse)
    }
}

impl Extractor for GeminiExtractor {
    fn extract(&self, raw_text: &str) -> BoxFuture<'_, Result<String, ExtractionError>> {
        let raw_text = raw_text.to_string();
        async move {
            tracing::info!(model = %self.model, chars = raw_text.len(), "Extracting report");
            self.generate(&raw_text).await
        }
        .boxed()
    }
}
