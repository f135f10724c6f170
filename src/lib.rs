//! Geolocated scalar telemetry for a subsea vehicle.
//!
//! Position fixes in a local metric frame build a track; user-chosen scalar
//! fields are rate-limited into per-field series and placed on the track by
//! timestamp, for a time-series plot and a map layer per field.

pub mod config;
pub mod engine;
pub mod geo;
pub mod locator;
pub mod registry;
pub mod series;
pub mod track;
pub mod transport;
pub mod web;
