pub mod analysis;
pub mod config;
pub mod glasses;
pub mod http;
pub mod photos;
pub mod places;
pub mod session;
pub mod speech;

pub use analysis::{AnalysisJob, AnalysisQueue, AnalysisWorker, GeminiVision, VisionAnalyzer};
pub use config::Config;
pub use glasses::{
    BridgeConnector, BridgeSession, ButtonPress, GlassesSession, PhotoCapture, PressKind,
    SessionConnector,
};
pub use http::{create_router, AppState};
pub use photos::{CapturedPhoto, PhotoStore, PhotoSummary};
pub use places::{GooglePlaces, PlaceSearch, StoreCandidate};
pub use session::{
    ButtonOutcome, SessionRegistry, SessionStatus, SessionTracker, TickOutcome, TrackerConfig,
    UserCaptureState,
};
pub use speech::{Announcer, AudioClipStore, ElevenLabsSpeech, SpeechSynthesizer};
