//! Local tangent-plane conversion between lat/lon and the vehicle XY frame.
//!
//! Scale factors are the empirical meters-per-degree series evaluated at the
//! origin latitude. Accuracy degrades with distance from the origin.

use super::Origin;

pub fn meters_per_degree_lat(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_132.09 - 566.05 * (2.0 * lat).cos() + 1.20 * (4.0 * lat).cos() - 0.002 * (6.0 * lat).cos()
}

pub fn meters_per_degree_lon(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_415.13 * lat.cos() - 94.55 * (3.0 * lat).cos() + 0.12 * (5.0 * lat).cos()
}

/// Wrap a longitude into [-180, 180].
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    if !lon_deg.is_finite() || (-180.0..=180.0).contains(&lon_deg) {
        return lon_deg;
    }
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 onto -180; keep the sign of the input at the seam
    if wrapped == -180.0 && lon_deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Returns `(x, y)` in meters east and north of the origin.
pub fn to_local(lat_deg: f64, lon_deg: f64, origin: &Origin) -> (f64, f64) {
    let lon = normalize_longitude(lon_deg);
    let x = (lon - origin.longitude_deg) * origin.m_per_deg_lon();
    let y = (lat_deg - origin.latitude_deg) * origin.m_per_deg_lat();
    (x, y)
}

/// Returns `(lat, lon)` in degrees.
pub fn to_geo(x: f64, y: f64, origin: &Origin) -> (f64, f64) {
    let lon = x / origin.m_per_deg_lon() + origin.longitude_deg;
    let lat = y / origin.m_per_deg_lat() + origin.latitude_deg;
    (lat, lon)
}
