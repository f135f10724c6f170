use serde::Serialize;
use utoipa::ToSchema;

use super::projection::{meters_per_degree_lat, meters_per_degree_lon, normalize_longitude};

/// Center of the local planar frame.
///
/// The meters-per-degree scale factors are evaluated once at the origin's
/// latitude, since every conversion in a session uses the same origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Origin {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(skip)]
    m_per_deg_lat: f64,
    #[serde(skip)]
    m_per_deg_lon: f64,
}

impl Origin {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg: normalize_longitude(longitude_deg),
            m_per_deg_lat: meters_per_degree_lat(latitude_deg),
            m_per_deg_lon: meters_per_degree_lon(latitude_deg),
        }
    }

    /// Latitude within [-90, 90] and a finite longitude.
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && (-90.0..=90.0).contains(&self.latitude_deg)
    }

    pub fn m_per_deg_lat(&self) -> f64 {
        self.m_per_deg_lat
    }

    pub fn m_per_deg_lon(&self) -> f64 {
        self.m_per_deg_lon
    }
}
