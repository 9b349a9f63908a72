use super::session::{GlassesSession, PhotoCapture};
use anyhow::{bail, Context, Result};
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Glasses session backed by the vendor cloud's REST bridge
pub struct BridgeSession {
    client: Client,
    base_url: String,
    session_id: String,
    api_key: Option<String>,
    capture_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    request_id: String,
    mime_type: String,
    /// Base64-encoded image bytes
    photo_data: String,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct PlayAudioRequest<'a> {
    audio_url: &'a str,
}

impl BridgeSession {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        session_id: impl Into<String>,
        api_key: Option<String>,
        capture_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session_id: session_id.into(),
            api_key,
            capture_timeout,
        }
    }

    fn url(&self, action: &str) -> String {
        format!(
            "{}/sessions/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.session_id,
            action
        )
    }

    fn post(&self, action: &str) -> reqwest::RequestBuilder {
        let req = self.client.post(self.url(action));
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn expect_ack(response: reqwest::Response, action: &str) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("glasses {action} failed: status={status} body={body}");
        }

        let ack: AckResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid {action} acknowledgement"))?;
        if !ack.success {
            bail!(
                "glasses rejected {action}: {}",
                ack.message.unwrap_or_else(|| "no reason given".to_string())
            );
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl GlassesSession for BridgeSession {
    async fn request_photo(&self) -> Result<PhotoCapture> {
        let response = self
            .post("photo")
            .timeout(self.capture_timeout)
            .send()
            .await
            .context("Failed to send photo request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("photo request failed: status={status} body={body}");
        }

        let photo: PhotoResponse = response
            .json()
            .await
            .context("Invalid photo response")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(photo.photo_data.as_bytes())
            .context("Photo payload is not valid base64")?;

        info!(
            "Photo {} received from session {} ({} bytes)",
            photo.request_id,
            self.session_id,
            bytes.len()
        );

        Ok(PhotoCapture {
            request_id: photo.request_id,
            mime_type: photo.mime_type,
            bytes: Bytes::from(bytes),
            captured_at: Utc::now(),
        })
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let response = self
            .post("speak")
            .json(&SpeakRequest { text })
            .send()
            .await
            .context("Failed to send speak request")?;
        Self::expect_ack(response, "speak").await
    }

    async fn play_audio(&self, url: &str) -> Result<()> {
        let response = self
            .post("audio")
            .json(&PlayAudioRequest { audio_url: url })
            .send()
            .await
            .context("Failed to send audio request")?;
        Self::expect_ack(response, "audio playback").await
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Opens a `GlassesSession` for a session id announced by the glasses cloud
pub trait SessionConnector: Send + Sync {
    fn connect(&self, session_id: &str) -> Arc<dyn GlassesSession>;
}

/// Connector producing `BridgeSession`s that share one HTTP client
pub struct BridgeConnector {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    capture_timeout: Duration,
}

impl BridgeConnector {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        capture_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            capture_timeout,
        }
    }
}

impl SessionConnector for BridgeConnector {
    fn connect(&self, session_id: &str) -> Arc<dyn GlassesSession> {
        Arc::new(BridgeSession::new(
            self.client.clone(),
            self.base_url.clone(),
            session_id,
            self.api_key.clone(),
            self.capture_timeout,
        ))
    }
}
