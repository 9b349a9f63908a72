use anyhow::{bail, Context, Result};
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

/// Vision-capable language model used to read product photos
#[async_trait::async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyze an image with a text prompt, returning free text
    async fn analyze(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String>;

    /// Analyzer name for logging
    fn name(&self) -> &str;
}

/// Google Gemini `generateContent` client
pub struct GeminiVision {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn build_request_body(image: &[u8], mime_type: &str, prompt: &str) -> Value {
        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        { "text": prompt },
                        {
                            "inline_data": {
                                "mime_type": mime_type,
                                "data": base64::engine::general_purpose::STANDARD.encode(image)
                            }
                        }
                    ]
                }
            ]
        })
    }
}

/// Concatenate the text parts of the first candidate.
pub(crate) fn extract_text(response: &Value) -> Result<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .context("Response has no candidate content")?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        let reason = response
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        bail!("Model returned no text (finish reason: {reason})");
    }

    Ok(text.trim().to_string())
}

#[async_trait::async_trait]
impl VisionAnalyzer for GeminiVision {
    async fn analyze(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request_body(image, mime_type, prompt))
            .send()
            .await
            .context("Failed to reach vision API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("vision API error: status={status} body={body}");
        }

        let body: Value = response
            .json()
            .await
            .context("Vision API returned invalid JSON")?;
        extract_text(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
