// Shared mocks for integration tests: scripted glasses, analyzer, speech and
// places collaborators.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use snapshop::analysis::{AnalysisJob, AnalysisQueue};
use snapshop::glasses::{GlassesSession, PhotoCapture, SessionConnector};
use snapshop::places::{PlaceSearch, StoreCandidate};
use snapshop::speech::{SpeechSynthesizer, SynthesizedAudio};
use snapshop::{PhotoStore, SessionRegistry, SessionTracker, TrackerConfig, VisionAnalyzer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Glasses
// ---------------------------------------------------------------------------

/// Result of one scripted capture call
#[derive(Debug, Clone, Copy)]
pub enum Capture {
    Photo { after: Duration },
    Fail { after: Duration },
}

impl Capture {
    pub fn photo() -> Self {
        Capture::Photo {
            after: Duration::ZERO,
        }
    }
}

/// Glasses session whose captures follow a script; once the script runs out
/// every capture succeeds immediately.
pub struct MockGlasses {
    session_id: String,
    script: Mutex<VecDeque<Capture>>,
    captures: AtomicUsize,
    pub spoken: Mutex<Vec<String>>,
    pub played: Mutex<Vec<String>>,
    fail_playback: bool,
}

impl MockGlasses {
    pub fn new(session_id: &str) -> Arc<Self> {
        Self::scripted(session_id, Vec::new())
    }

    pub fn scripted(session_id: &str, script: Vec<Capture>) -> Arc<Self> {
        Arc::new(Self {
            session_id: session_id.to_string(),
            script: Mutex::new(script.into()),
            captures: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
            played: Mutex::new(Vec::new()),
            fail_playback: false,
        })
    }

    pub fn broken_speaker(session_id: &str) -> Arc<Self> {
        Arc::new(Self {
            session_id: session_id.to_string(),
            script: Mutex::new(VecDeque::new()),
            captures: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
            played: Mutex::new(Vec::new()),
            fail_playback: true,
        })
    }

    /// Number of capture calls made so far
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl GlassesSession for MockGlasses {
    async fn request_photo(&self) -> Result<PhotoCapture> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Capture::photo);

        match step {
            Capture::Photo { after } => {
                tokio::time::sleep(after).await;
                Ok(PhotoCapture {
                    request_id: format!("{}-photo-{}", self.session_id, n),
                    mime_type: "image/jpeg".to_string(),
                    bytes: Bytes::from_static(b"\xff\xd8\xff\xe0fakejpeg"),
                    captured_at: Utc::now(),
                })
            }
            Capture::Fail { after } => {
                tokio::time::sleep(after).await;
                bail!("camera busy")
            }
        }
    }

    async fn speak(&self, text: &str) -> Result<()> {
        if self.fail_playback {
            bail!("speaker offline");
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn play_audio(&self, url: &str) -> Result<()> {
        if self.fail_playback {
            bail!("speaker offline");
        }
        self.played.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Connector that always hands out the same mock session
pub struct MockConnector(pub Arc<MockGlasses>);

impl SessionConnector for MockConnector {
    fn connect(&self, _session_id: &str) -> Arc<dyn GlassesSession> {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// Analysis, speech, places
// ---------------------------------------------------------------------------

pub struct MockAnalyzer {
    pub reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VisionAnalyzer for MockAnalyzer {
    async fn analyze(&self, _image: &[u8], _mime_type: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => bail!("{}", message),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockSpeech {
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        if self.fail {
            bail!("quota exceeded");
        }
        Ok(SynthesizedAudio {
            bytes: Bytes::from(format!("ID3:{text}")),
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

pub struct MockPlaces(pub Vec<StoreCandidate>);

#[async_trait]
impl PlaceSearch for MockPlaces {
    async fn nearby(&self, _name: &str, _lat: f64, _lng: f64) -> Result<Vec<StoreCandidate>> {
        Ok(self.0.clone())
    }
}

pub fn store(name: &str, latitude: f64, longitude: f64) -> StoreCandidate {
    StoreCandidate {
        name: name.to_string(),
        address: Some(format!("{name} street")),
        latitude,
        longitude,
        rating: Some(4.0),
        distance_m: 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tracker harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub tracker: SessionTracker,
    pub registry: Arc<SessionRegistry>,
    pub photos: Arc<PhotoStore>,
    /// Jobs the tracker queued for analysis
    pub jobs: mpsc::UnboundedReceiver<AnalysisJob>,
}

/// Tracker whose own ticker is effectively idle, for tests that drive ticks
/// by hand.
pub fn manual_tick_harness() -> Harness {
    harness(TrackerConfig {
        tick_interval: Duration::from_secs(24 * 3600),
        cooldown: Duration::from_secs(30),
    })
}

pub fn harness(config: TrackerConfig) -> Harness {
    let registry = Arc::new(SessionRegistry::new());
    let photos = Arc::new(PhotoStore::new());
    let (queue, jobs) = AnalysisQueue::channel();
    let tracker = SessionTracker::new(config, registry.clone(), photos.clone(), queue);

    Harness {
        tracker,
        registry,
        photos,
        jobs,
    }
}

/// Let spawned tasks run up to their next timer.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
