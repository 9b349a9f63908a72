use crate::analysis::{AnalysisQueue, AnalysisWorker, GeminiVision};
use crate::config::Config;
use crate::glasses::{BridgeConnector, SessionConnector};
use crate::photos::PhotoStore;
use crate::places::{GooglePlaces, PlaceSearch};
use crate::session::{SessionRegistry, SessionTracker, TrackerConfig};
use crate::speech::{Announcer, AudioClipStore, ElevenLabsSpeech, SpeechSynthesizer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Per-user capture sessions
    pub tracker: SessionTracker,

    /// Photo history for every user seen since startup
    pub photos: Arc<PhotoStore>,

    /// Opens glasses sessions announced by webhook
    pub connector: Arc<dyn SessionConnector>,

    pub announcer: Arc<Announcer>,

    pub places: Arc<dyn PlaceSearch>,

    /// Stores returned per lookup
    pub max_stores: usize,

    /// Webview files
    pub static_dir: PathBuf,
}

impl AppState {
    /// Wire up every collaborator from configuration and start the analysis
    /// worker. Must be called inside a Tokio runtime.
    pub fn from_config(cfg: &Config) -> Result<(Self, JoinHandle<()>)> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.service.outbound_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let registry = Arc::new(SessionRegistry::new());
        let photos = Arc::new(PhotoStore::new());

        let synthesizer: Option<Arc<dyn SpeechSynthesizer>> =
            cfg.speech.api_key.as_ref().map(|key| {
                Arc::new(ElevenLabsSpeech::new(
                    http.clone(),
                    cfg.speech.endpoint.clone(),
                    key.clone(),
                    cfg.speech.voice_id.clone(),
                    cfg.speech.model_id.clone(),
                )) as Arc<dyn SpeechSynthesizer>
            });
        if synthesizer.is_none() {
            info!("No speech API key configured, using the glasses' built-in voice");
        }

        let announcer = Arc::new(Announcer::new(
            Arc::clone(&registry),
            synthesizer,
            Arc::new(AudioClipStore::new()),
            cfg.service.public_url.clone(),
        ));

        let (queue, rx) = AnalysisQueue::channel();
        let analyzer = Arc::new(GeminiVision::new(
            http.clone(),
            cfg.vision.endpoint.clone(),
            cfg.vision.api_key.clone(),
            cfg.vision.model.clone(),
        ));
        let mut worker = AnalysisWorker::new(analyzer, Arc::clone(&photos), cfg.vision.prompt.clone());
        if cfg.capture.auto_speak {
            worker = worker.with_announcer(Arc::clone(&announcer));
        }
        let worker_handle = worker.spawn(rx);

        let tracker = SessionTracker::new(
            TrackerConfig::from(&cfg.capture),
            registry,
            Arc::clone(&photos),
            queue,
        );

        let connector = Arc::new(BridgeConnector::new(
            http.clone(),
            cfg.glasses.bridge_url.clone(),
            cfg.glasses.api_key.clone(),
            Duration::from_secs(cfg.glasses.capture_timeout_secs),
        ));

        let places = Arc::new(GooglePlaces::new(
            http,
            cfg.places.endpoint.clone(),
            cfg.places.api_key.clone(),
            cfg.places.radius_m,
        ));

        let state = Self {
            tracker,
            photos,
            connector,
            announcer,
            places,
            max_stores: cfg.places.max_results,
            static_dir: PathBuf::from(&cfg.service.static_dir),
        };

        Ok((state, worker_handle))
    }
}
