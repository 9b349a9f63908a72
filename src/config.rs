use anyhow::Result;
use serde::Deserialize;

/// Default prompt sent with every captured photo.
const DEFAULT_VISION_PROMPT: &str = "You are a shopping assistant looking through the wearer's \
smart glasses. Identify the main product in this photo (brand, name, size or variant). \
Then compare its typical price across major retailers and online stores. Answer in this format:\n\
PRODUCT: <name>\n\
PRICES: <store>: <price>; <store>: <price>\n\
BEST DEAL: <store and price>\n\
SUMMARY: <one short spoken sentence>";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub glasses: GlassesConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub places: PlacesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Externally reachable base URL, used to build audio clip links for the glasses
    pub public_url: String,
    /// Directory holding the photo webview
    pub static_dir: String,
    /// Upper bound on any outbound call (vision, speech, places). Photo
    /// requests to the glasses use `glasses.capture_timeout_secs` instead.
    pub outbound_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "snapshop".to_string(),
            http: HttpConfig::default(),
            public_url: "http://localhost:8080".to_string(),
            static_dir: "static".to_string(),
            outbound_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Period of the per-user streaming tick
    pub tick_interval_ms: u64,
    /// Ceiling applied before each tick-triggered capture
    pub cooldown_secs: u64,
    /// Speak every finished analysis on the wearer's glasses
    pub auto_speak: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            cooldown_secs: 30,
            auto_speak: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlassesConfig {
    pub bridge_url: String,
    pub api_key: Option<String>,
    pub capture_timeout_secs: u64,
}

impl Default for GlassesConfig {
    fn default() -> Self {
        Self {
            bridge_url: "http://localhost:7010".to_string(),
            api_key: None,
            capture_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            prompt: DEFAULT_VISION_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: String,
    /// Speech synthesis is disabled when unset; the glasses' own voice is used instead
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.elevenlabs.io/v1".to_string(),
            api_key: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_flash_v2_5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub endpoint: String,
    pub api_key: String,
    pub radius_m: f64,
    pub max_results: usize,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://places.googleapis.com/v1".to_string(),
            api_key: String::new(),
            radius_m: 5000.0,
            max_results: 5,
        }
    }
}

impl Config {
    /// Load from `path` (extension optional), then overlay `SNAPSHOP__SECTION__KEY`
    /// environment variables. A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SNAPSHOP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
