/// Search radius around a query point, in kilometers.
pub const SEARCH_RADIUS_KM: f64 = 1.0;

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Check whether an optional `(lat, lng)` point lies within `max_radius_km` of `center`.
/// A missing point never matches.
pub fn is_near(point: Option<(f64, f64)>, center: (f64, f64), max_radius_km: f64) -> bool {
    match point {
        Some((lat, lng)) => haversine_distance(lat, lng, center.0, center.1) <= max_radius_km,
        None => false,
    }
}
