use super::auth::AuthUser;
use super::error::ApiError;
use super::state::AppState;
use crate::glasses::{ButtonPress, ButtonPressEvent, PressKind, SessionStartEvent, SessionStopEvent};
use crate::photos::PhotoSummary;
use crate::places::{rank_by_distance, StoreCandidate};
use crate::session::{ButtonOutcome, SessionStatus};
use crate::speech::{AnnounceError, Spoken};
use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
}

impl WebhookResponse {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            is_streaming: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub request_id: String,
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub request_id: String,
    /// "clip" or "builtin"
    pub spoken_with: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

// ============================================================================
// Glasses webhooks
// ============================================================================

/// POST /webhook/session/start
pub async fn session_started(
    State(state): State<AppState>,
    Json(event): Json<SessionStartEvent>,
) -> Json<WebhookResponse> {
    let handle = state.connector.connect(&event.session_id);
    state.tracker.on_session_start(&event.user_id, handle).await;
    Json(WebhookResponse::status("started"))
}

/// POST /webhook/session/stop
pub async fn session_stopped(
    State(state): State<AppState>,
    Json(event): Json<SessionStopEvent>,
) -> Json<WebhookResponse> {
    let reason = event.reason.as_deref().unwrap_or("unspecified");
    let was_active = state.tracker.on_session_stop(&event.user_id, reason).await;
    Json(WebhookResponse::status(if was_active {
        "stopped"
    } else {
        "not_active"
    }))
}

/// POST /webhook/button
/// Long presses answer with the new streaming mode; short presses capture in
/// the background so the glasses cloud is not kept waiting.
pub async fn button_pressed(
    State(state): State<AppState>,
    Json(event): Json<ButtonPressEvent>,
) -> Response {
    let press = ButtonPress {
        button_id: event.button_id,
        kind: PressKind::from_press_type(&event.press_type),
    };

    match press.kind {
        PressKind::Long => match state.tracker.on_button_press(&event.user_id, press).await {
            ButtonOutcome::StreamingToggled(streaming) => Json(WebhookResponse {
                status: "toggled".to_string(),
                is_streaming: Some(streaming),
            })
            .into_response(),
            _ => ApiError::NotFound(format!("No active session for {}", event.user_id))
                .into_response(),
        },
        PressKind::Short => {
            if !state.tracker.registry().is_active(&event.user_id).await {
                return ApiError::NotFound(format!("No active session for {}", event.user_id))
                    .into_response();
            }

            let tracker = state.tracker.clone();
            let user_id = event.user_id;
            tokio::spawn(async move {
                tracker.on_button_press(&user_id, press).await;
            });

            (StatusCode::ACCEPTED, Json(WebhookResponse::status("capturing"))).into_response()
        }
    }
}

// ============================================================================
// User API
// ============================================================================

/// GET /api/session
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SessionStatus>, ApiError> {
    state
        .tracker
        .status(&user_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No active session for {user_id}")))
}

/// GET /api/photos
pub async fn list_photos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<Vec<PhotoSummary>> {
    Json(state.photos.list(&user_id).await)
}

/// GET /api/photos/latest
pub async fn latest_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PhotoSummary>, ApiError> {
    state
        .photos
        .latest(&user_id)
        .await
        .map(|photo| Json(PhotoSummary::from(&photo)))
        .ok_or_else(|| ApiError::NotFound("No photo captured yet".to_string()))
}

/// GET /api/photos/:request_id/image
pub async fn photo_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(request_id): Path<String>,
) -> Result<Response, ApiError> {
    let photo = state
        .photos
        .get(&user_id, &request_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Photo {request_id} not found")))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, photo.mime_type),
            (CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        photo.bytes,
    )
        .into_response())
}

/// GET /api/photos/:request_id/analysis
pub async fn photo_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let photo = state
        .photos
        .get(&user_id, &request_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Photo {request_id} not found")))?;

    let analysis = photo
        .analysis
        .ok_or_else(|| ApiError::NotFound(format!("Analysis for {request_id} not ready")))?;

    Ok(Json(AnalysisResponse {
        request_id,
        analysis,
    }))
}

/// POST /api/speak-latest
pub async fn speak_latest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SpeakResponse>, ApiError> {
    let photo = state
        .photos
        .latest_analyzed(&user_id)
        .await
        .ok_or_else(|| ApiError::NotFound("No analysis available yet".to_string()))?;
    let analysis = photo.analysis.unwrap_or_default();

    info!("Speaking analysis of {} for {}", photo.request_id, user_id);

    match state.announcer.announce(&user_id, &analysis).await {
        Ok(spoken) => Ok(Json(SpeakResponse {
            request_id: photo.request_id,
            spoken_with: match spoken {
                Spoken::Clip(_) => "clip",
                Spoken::Builtin => "builtin",
            }
            .to_string(),
        })),
        Err(e @ AnnounceError::NoSession(_)) => Err(ApiError::Conflict(e.to_string())),
        Err(e) => {
            error!("Failed to speak analysis for {}: {}", user_id, e);
            Err(ApiError::Upstream(e.to_string()))
        }
    }
}

/// GET /api/audio/:clip_id
/// Fetched by the glasses themselves, so no user identity is required.
pub async fn audio_clip(
    State(state): State<AppState>,
    Path(clip_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let clip = state
        .announcer
        .clips()
        .get(&clip_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Audio clip {clip_id} not found")))?;

    Ok(([(CONTENT_TYPE, clip.mime_type)], clip.bytes).into_response())
}

/// GET /api/stores?name=..&lat=..&lng=..
pub async fn nearby_stores(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<StoreCandidate>>, ApiError> {
    if query.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Store name is required".to_string()));
    }

    info!(
        "Looking up '{}' near ({}, {}) for {}",
        query.name, query.lat, query.lng, user_id
    );

    let candidates = state
        .places
        .nearby(&query.name, query.lat, query.lng)
        .await
        .map_err(|e| {
            error!("Store lookup failed: {:#}", e);
            ApiError::Upstream(format!("{e:#}"))
        })?;

    Ok(Json(rank_by_distance(
        candidates,
        query.lat,
        query.lng,
        state.max_stores,
    )))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
