use crate::config::CaptureConfig;
use std::time::Duration;

/// Timing for the per-user capture loop
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often each active session is ticked
    /// Default: 1 second
    pub tick_interval: Duration,

    /// Ceiling placed on the next tick-triggered capture before it is issued.
    /// A failed or stalled capture keeps it; a successful one clears it.
    /// Default: 30 seconds
    pub cooldown: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            cooldown: Duration::from_secs(30),
        }
    }
}

impl From<&CaptureConfig> for TrackerConfig {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms.max(1)),
            cooldown: Duration::from_secs(cfg.cooldown_secs),
        }
    }
}
