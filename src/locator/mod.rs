mod error;
mod locator;

pub use error::LocateError;
pub use locator::{GeoLocator, GeoPoint};
