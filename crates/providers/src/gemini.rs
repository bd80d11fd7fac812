//! Google Gemini answer generator.
//!
//! Talks to the `generateContent` and `streamGenerateContent` endpoints
//! of the Generative Language API. Streaming uses SSE (`alt=sse`); each
//! event carries a delta of the answer text, and the stream simply ends
//! when the answer is complete (there is no `[DONE]` sentinel).

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use socialcare_core::{GenerationChunk, GenerationError, Generator, PromptPayload};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// A Gemini-backed [`Generator`].
///
/// The API key travels as a query parameter and never appears in logs.
pub struct GeminiGenerator {
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiGenerator {
    /// Create a new Gemini generator for the given model.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            temperature: 0.7,
            client,
        }
    }

    /// Override the API base URL (mainly for tests against a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{method}", self.base_url, self.model)
    }

    fn request_body(&self, payload: &PromptPayload) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": payload.system_instruction }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": payload.user_message }],
            }],
            "generationConfig": { "temperature": self.temperature },
        })
    }

    async fn error_for_status(&self, status: u16, response: reqwest::Response) -> GenerationError {
        match status {
            429 => GenerationError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => GenerationError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            404 => GenerationError::ModelNotFound(self.model.clone()),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(status, body = %error_body, "Gemini returned error");
                GenerationError::ApiError {
                    status_code: status,
                    message: error_body,
                }
            }
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        let url = self.endpoint("generateContent");
        let body = self.request_body(payload);

        debug!(model = %self.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(self.error_for_status(status, response).await);
        }

        let api_response: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::ApiError {
                    status_code: 200,
                    message: format!("Failed to parse response: {e}"),
                })?;

        if let Some(reason) = api_response.block_reason() {
            return Err(GenerationError::InvalidResponse(format!(
                "Prompt blocked by safety filter: {reason}"
            )));
        }

        api_response
            .text()
            .ok_or_else(|| GenerationError::InvalidResponse("No candidates in response".into()))
    }

    async fn stream(
        &self,
        payload: &PromptPayload,
    ) -> Result<mpsc::Receiver<Result<GenerationChunk, GenerationError>>, GenerationError> {
        let url = self.endpoint("streamGenerateContent");
        let body = self.request_body(payload);

        debug!(model = %self.model, "Sending streaming generation request");

        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(self.error_for_status(status, response).await);
        }

        let (tx, rx) = mpsc::channel(64);

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(GenerationError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                // Append new bytes to our line buffer
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // Skip empty lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    match serde_json::from_str::<GenerateResponse>(data) {
                        Ok(event) => {
                            if let Some(reason) = event.block_reason() {
                                let _ = tx
                                    .send(Err(GenerationError::InvalidResponse(format!(
                                        "Prompt blocked by safety filter: {reason}"
                                    ))))
                                    .await;
                                return;
                            }

                            if let Some(text) = event.text() {
                                if tx.send(Ok(GenerationChunk::delta(text))).await.is_err() {
                                    return; // receiver dropped
                                }
                            }
                        }
                        Err(e) => {
                            trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
                        }
                    }
                }
            }

            // The stream closing is the end-of-answer signal.
            let _ = tx.send(Ok(GenerationChunk::finished())).await;
        });

        Ok(rx)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it carries any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}
