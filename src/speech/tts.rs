use anyhow::{bail, Context, Result};
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

/// Text-to-speech collaborator
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning encoded audio
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}

#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// ElevenLabs text-to-speech client
pub struct ElevenLabsSpeech {
    client: Client,
    endpoint: String,
    api_key: String,
    voice_id: String,
    model_id: String,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSpeech {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.endpoint.trim_end_matches('/'),
            self.voice_id
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await
            .context("Failed to reach speech API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("speech API error: status={status} body={body}");
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .context("Failed to read synthesized audio")?;

        Ok(SynthesizedAudio { bytes, mime_type })
    }
}
