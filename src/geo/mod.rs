mod origin;
mod projection;

pub use origin::Origin;
pub use projection::{meters_per_degree_lat, meters_per_degree_lon, normalize_longitude, to_geo, to_local};
