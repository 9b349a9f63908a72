//! Smart-glasses SDK boundary
//!
//! - `GlassesSession`: capture and audio calls against one wearer's session
//! - `BridgeSession`: the REST bridge implementation
//! - webhook event payloads for session start/stop and button presses

pub mod bridge;
pub mod events;
pub mod session;

pub use bridge::{BridgeConnector, BridgeSession, SessionConnector};
pub use events::{ButtonPressEvent, SessionStartEvent, SessionStopEvent};
pub use session::{ButtonPress, GlassesSession, PhotoCapture, PressKind};
