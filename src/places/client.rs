use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A store that may carry the product
#[derive(Debug, Clone, Serialize)]
pub struct StoreCandidate {
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f32>,
    /// Distance from the searcher, filled in by ranking
    pub distance_m: f64,
}

/// Maps/places collaborator
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Stores matching `name` around the given point, unranked
    async fn nearby(&self, name: &str, lat: f64, lng: f64) -> Result<Vec<StoreCandidate>>;
}

/// Google Places (New) text search with a location bias
pub struct GooglePlaces {
    client: Client,
    endpoint: String,
    api_key: String,
    radius_m: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    location: Option<LatLng>,
    rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl GooglePlaces {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        radius_m: f64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            radius_m,
        }
    }
}

fn into_candidates(response: SearchResponse) -> Vec<StoreCandidate> {
    response
        .places
        .into_iter()
        .filter_map(|place| {
            let location = place.location?;
            Some(StoreCandidate {
                name: place.display_name.map(|n| n.text).unwrap_or_default(),
                address: place.formatted_address,
                latitude: location.latitude,
                longitude: location.longitude,
                rating: place.rating,
                distance_m: 0.0,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl PlaceSearch for GooglePlaces {
    async fn nearby(&self, name: &str, lat: f64, lng: f64) -> Result<Vec<StoreCandidate>> {
        let url = format!("{}/places:searchText", self.endpoint.trim_end_matches('/'));
        let body = json!({
            "textQuery": name,
            "locationBias": {
                "circle": {
                    "center": { "latitude": lat, "longitude": lng },
                    "radius": self.radius_m
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header(
                "X-Goog-FieldMask",
                "places.displayName,places.formattedAddress,places.location,places.rating",
            )
            .json(&body)
            .send()
            .await
            .context("Failed to reach places API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("places API error: status={status} body={body}");
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Places API returned invalid JSON")?;
        Ok(into_candidates(parsed))
    }
}
