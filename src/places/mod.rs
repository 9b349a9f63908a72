mod client;
mod distance;

pub use client::{GooglePlaces, PlaceSearch, StoreCandidate};
pub use distance::{haversine_m, rank_by_distance};
