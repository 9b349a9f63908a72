use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// How a hardware button was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

impl PressKind {
    /// Anything the SDK reports other than `long` counts as a short press.
    pub fn from_press_type(press_type: &str) -> Self {
        if press_type.trim().eq_ignore_ascii_case("long") {
            PressKind::Long
        } else {
            PressKind::Short
        }
    }
}

/// A button event delivered by the glasses SDK
#[derive(Debug, Clone)]
pub struct ButtonPress {
    pub button_id: String,
    pub kind: PressKind,
}

/// Photo returned by a capture request
#[derive(Debug, Clone)]
pub struct PhotoCapture {
    /// Identifier assigned by the glasses SDK
    pub request_id: String,
    pub mime_type: String,
    pub bytes: Bytes,
    pub captured_at: DateTime<Utc>,
}

/// One user's live connection to their glasses
///
/// The server owns these handles; the session tracker only borrows them to
/// request captures and audio playback.
#[async_trait::async_trait]
pub trait GlassesSession: Send + Sync {
    /// Ask the glasses to take a single photo
    async fn request_photo(&self) -> Result<PhotoCapture>;

    /// Speak text with the glasses' built-in voice
    async fn speak(&self, text: &str) -> Result<()>;

    /// Play an audio file the glasses can fetch from `url`
    async fn play_audio(&self, url: &str) -> Result<()>;

    /// SDK session identifier, for logging
    fn session_id(&self) -> &str;
}
