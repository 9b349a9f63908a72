use super::client::StoreCandidate;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Fill in distances from the origin and keep the `limit` closest.
pub fn rank_by_distance(
    mut candidates: Vec<StoreCandidate>,
    lat: f64,
    lng: f64,
    limit: usize,
) -> Vec<StoreCandidate> {
    for c in &mut candidates {
        c.distance_m = haversine_m(lat, lng, c.latitude, c.longitude);
    }
    candidates.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    candidates.truncate(limit);
    candidates
}
