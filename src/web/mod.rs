pub mod api;
pub mod api_doc;
pub mod server;
mod state;

pub use server::{router, run_server};
pub use state::AppState;

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::engine::{Engine, Session, SessionOptions};
    use crate::transport::MemoryBus;
    use std::sync::Arc;

    let bus = Arc::new(MemoryBus::new());
    let layers = Arc::new(crate::engine::LayerStore::new());
    let engine = Arc::new(Engine::new(layers.clone()));
    let publisher = bus.publisher();
    AppState {
        session: Arc::new(Session::new(engine, bus, SessionOptions::default())),
        layers,
        publisher: Some(publisher),
    }
}
