pub mod error;
pub mod fields;
pub mod messages;
pub mod plot;
pub mod status;
