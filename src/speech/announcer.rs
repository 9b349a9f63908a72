use super::tts::{SpeechSynthesizer, SynthesizedAudio};
use crate::session::SessionRegistry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Clips kept for the glasses to download
const MAX_CLIPS: usize = 64;

/// Longest text sent to the speech engine
const MAX_SPOKEN_CHARS: usize = 400;

#[derive(Debug, thiserror::Error)]
pub enum AnnounceError {
    #[error("user {0} has no active glasses session")]
    NoSession(String),
    #[error("playback failed: {0:#}")]
    Playback(anyhow::Error),
}

/// How the text reached the wearer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spoken {
    /// Synthesized clip, played from this id
    Clip(Uuid),
    /// Glasses' own voice
    Builtin,
}

/// Recently synthesized audio, served to the glasses by id
#[derive(Default)]
pub struct AudioClipStore {
    clips: RwLock<(HashMap<Uuid, SynthesizedAudio>, VecDeque<Uuid>)>,
}

impl AudioClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, audio: SynthesizedAudio) -> Uuid {
        let id = Uuid::new_v4();
        let mut guard = self.clips.write().await;
        let (clips, order) = &mut *guard;

        clips.insert(id, audio);
        order.push_back(id);
        while order.len() > MAX_CLIPS {
            if let Some(oldest) = order.pop_front() {
                clips.remove(&oldest);
            }
        }

        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<SynthesizedAudio> {
        self.clips.read().await.0.get(id).cloned()
    }
}

/// Pick what to say out loud from an analysis.
///
/// Uses the `SUMMARY:` line when the model produced one, otherwise the
/// whole text cut at a word boundary.
pub fn spoken_summary(analysis: &str) -> String {
    let summary = analysis.lines().find_map(|line| {
        let line = line.trim();
        line.strip_prefix("SUMMARY:")
            .map(|rest| rest.trim())
            .filter(|rest| !rest.is_empty())
    });

    let text = summary.unwrap_or_else(|| analysis.trim());
    if text.chars().count() <= MAX_SPOKEN_CHARS {
        return text.to_string();
    }

    let cut: String = text.chars().take(MAX_SPOKEN_CHARS).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) => cut[..idx].trim_end().to_string(),
        None => cut,
    }
}

/// Speaks analysis results on a wearer's glasses
pub struct Announcer {
    registry: Arc<SessionRegistry>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    clips: Arc<AudioClipStore>,
    public_url: String,
}

impl Announcer {
    pub fn new(
        registry: Arc<SessionRegistry>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        clips: Arc<AudioClipStore>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            synthesizer,
            clips,
            public_url: public_url.into(),
        }
    }

    pub fn clips(&self) -> &Arc<AudioClipStore> {
        &self.clips
    }

    fn clip_url(&self, id: &Uuid) -> String {
        format!("{}/api/audio/{}", self.public_url.trim_end_matches('/'), id)
    }

    /// Speak `analysis` to `user_id`.
    ///
    /// Prefers a synthesized clip; if synthesis fails the glasses' built-in
    /// voice reads the text instead.
    pub async fn announce(&self, user_id: &str, analysis: &str) -> Result<Spoken, AnnounceError> {
        let handle = self
            .registry
            .handle(user_id)
            .await
            .ok_or_else(|| AnnounceError::NoSession(user_id.to_string()))?;
        let text = spoken_summary(analysis);

        if let Some(synthesizer) = &self.synthesizer {
            match synthesizer.synthesize(&text).await {
                Ok(audio) => {
                    let id = self.clips.insert(audio).await;
                    handle
                        .play_audio(&self.clip_url(&id))
                        .await
                        .map_err(AnnounceError::Playback)?;
                    info!("Played clip {} for {}", id, user_id);
                    return Ok(Spoken::Clip(id));
                }
                Err(e) => {
                    warn!("Speech synthesis failed, using glasses voice: {:#}", e);
                }
            }
        }

        handle.speak(&text).await.map_err(AnnounceError::Playback)?;
        info!("Spoke analysis for {} with glasses voice", user_id);
        Ok(Spoken::Builtin)
    }
}
