use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let webview = ServeDir::new(&state.static_dir);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Glasses cloud webhooks
        .route("/webhook/session/start", post(handlers::session_started))
        .route("/webhook/session/stop", post(handlers::session_stopped))
        .route("/webhook/button", post(handlers::button_pressed))
        // Wearer API
        .route("/api/session", get(handlers::get_session))
        .route("/api/photos", get(handlers::list_photos))
        .route("/api/photos/latest", get(handlers::latest_photo))
        .route("/api/photos/:request_id/image", get(handlers::photo_image))
        .route(
            "/api/photos/:request_id/analysis",
            get(handlers::photo_analysis),
        )
        .route("/api/speak-latest", post(handlers::speak_latest))
        .route("/api/audio/:clip_id", get(handlers::audio_clip))
        .route("/api/stores", get(handlers::nearby_stores))
        // Photo webview
        .fallback_service(webview)
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
