//! Per-user capture sessions
//!
//! This module tracks every wearer with an active glasses session:
//! - streaming mode, toggled by a long button press
//! - the periodic capture loop and its cooldown
//! - one-shot captures from a short button press
//! - handing captured photos to storage and analysis

mod config;
mod registry;
mod state;
mod tracker;

pub use config::TrackerConfig;
pub use registry::{ActiveSession, SessionRegistry};
pub use state::{SessionStatus, UserCaptureState};
pub use tracker::{ButtonOutcome, SessionTracker, TickOutcome};
