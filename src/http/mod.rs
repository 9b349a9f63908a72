//! HTTP API server
//!
//! Webhooks from the glasses cloud:
//! - POST /webhook/session/start - Wearer opened a session
//! - POST /webhook/session/stop - Session ended
//! - POST /webhook/button - Button press (long toggles streaming, short takes a photo)
//!
//! Wearer API (`x-user-id` header):
//! - GET /api/session - Capture state
//! - GET /api/photos - All photos
//! - GET /api/photos/latest - Latest photo
//! - GET /api/photos/:id/image - Photo bytes
//! - GET /api/photos/:id/analysis - Product analysis
//! - POST /api/speak-latest - Speak the latest analysis on the glasses
//! - GET /api/stores - Nearby stores for a product
//!
//! Also GET /api/audio/:id (clips for the glasses), GET /health and the
//! static photo webview.

mod auth;
mod error;
mod handlers;
mod routes;
mod state;

pub use auth::{AuthUser, USER_HEADER};
pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
