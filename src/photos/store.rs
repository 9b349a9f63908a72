use crate::glasses::PhotoCapture;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// A photo captured for a user, with its analysis once it arrives
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub mime_type: String,
    pub bytes: Bytes,
    pub size_bytes: usize,
    /// Set exactly once by the analysis worker (result text or error text)
    pub analysis: Option<String>,
}

/// Photo metadata without the image bytes
#[derive(Debug, Clone, Serialize)]
pub struct PhotoSummary {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub mime_type: String,
    pub size_bytes: usize,
    pub has_analysis: bool,
}

impl From<&CapturedPhoto> for PhotoSummary {
    fn from(photo: &CapturedPhoto) -> Self {
        Self {
            request_id: photo.request_id.clone(),
            timestamp: photo.timestamp,
            mime_type: photo.mime_type.clone(),
            size_bytes: photo.size_bytes,
            has_analysis: photo.analysis.is_some(),
        }
    }
}

/// Per-user photo history, kept across session restarts
///
/// Lists are append-only in capture order. Nothing is ever evicted.
#[derive(Default)]
pub struct PhotoStore {
    photos: RwLock<HashMap<String, Vec<CapturedPhoto>>>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly captured photo (analysis absent)
    pub async fn append(&self, user_id: &str, capture: PhotoCapture) -> PhotoSummary {
        let photo = CapturedPhoto {
            request_id: capture.request_id,
            timestamp: capture.captured_at,
            mime_type: capture.mime_type,
            size_bytes: capture.bytes.len(),
            bytes: capture.bytes,
            analysis: None,
        };
        let summary = PhotoSummary::from(&photo);

        let mut photos = self.photos.write().await;
        photos.entry(user_id.to_string()).or_default().push(photo);

        summary
    }

    pub async fn list(&self, user_id: &str) -> Vec<PhotoSummary> {
        let photos = self.photos.read().await;
        photos
            .get(user_id)
            .map(|list| list.iter().map(PhotoSummary::from).collect())
            .unwrap_or_default()
    }

    pub async fn latest(&self, user_id: &str) -> Option<CapturedPhoto> {
        let photos = self.photos.read().await;
        photos.get(user_id).and_then(|list| list.last().cloned())
    }

    pub async fn get(&self, user_id: &str, request_id: &str) -> Option<CapturedPhoto> {
        let photos = self.photos.read().await;
        photos
            .get(user_id)?
            .iter()
            .rev()
            .find(|p| p.request_id == request_id)
            .cloned()
    }

    /// Most recent photo that already has an analysis
    pub async fn latest_analyzed(&self, user_id: &str) -> Option<CapturedPhoto> {
        let photos = self.photos.read().await;
        photos
            .get(user_id)?
            .iter()
            .rev()
            .find(|p| p.analysis.is_some())
            .cloned()
    }

    /// Store the analysis for a photo.
    ///
    /// Returns `false` without touching anything if the photo is unknown or
    /// already has a result.
    pub async fn record_analysis(&self, user_id: &str, request_id: &str, text: String) -> bool {
        let mut photos = self.photos.write().await;
        let Some(photo) = photos
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().rev().find(|p| p.request_id == request_id))
        else {
            warn!("Analysis for unknown photo {} (user {})", request_id, user_id);
            return false;
        };

        if photo.analysis.is_some() {
            warn!("Photo {} already analyzed, keeping first result", request_id);
            return false;
        }

        photo.analysis = Some(text);
        true
    }
}
