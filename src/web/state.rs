use std::sync::Arc;

use crate::engine::{LayerStore, Session};
use crate::transport::Publisher;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub layers: Arc<LayerStore>,
    /// Present when the session runs on an in-process bus.
    pub publisher: Option<Publisher>,
}
