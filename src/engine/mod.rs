mod delivery;
mod display;
mod engine;
mod error;
mod render;
mod session;

pub use delivery::DeliveryWorker;
pub use display::RefreshTimer;
pub use engine::{Engine, EngineStatus};
pub use error::EngineError;
pub use render::{LayerStore, MapLayer, PlotFrame, PlotSeries, Renderer};
pub use session::{
    RestoreOutcome, Session, SessionOptions, DEFAULT_KEY, DEFAULT_ORIGIN_CHANNEL, DEFAULT_POSITION_CHANNELS,
    DEFAULT_SECTION,
};
