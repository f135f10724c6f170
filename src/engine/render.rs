use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use utoipa::ToSchema;

use crate::locator::GeoPoint;
use crate::series::{AxisRange, SeriesView, ViewWindow};

/// One plotted field as handed to the renderer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlotSeries {
    pub display_name: String,
    #[serde(flatten)]
    pub view: SeriesView,
}

/// Everything the time-series plot needs for one redraw.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlotFrame {
    pub window: ViewWindow,
    /// Shared time axis; absent until some series has data.
    pub time_bounds: Option<AxisRange>,
    pub series: Vec<PlotSeries>,
}

/// Map and plot output. Notifications arrive from both the delivery and the
/// display context.
pub trait Renderer: Send + Sync {
    /// Bind `key` to the map layer called `display_name`, reusing an existing
    /// layer (and its points) of that name.
    fn attach(&self, key: &str, display_name: &str);
    fn detach(&self, key: &str);
    fn clear(&self, key: &str);
    fn add_point(&self, key: &str, point: &GeoPoint);
    fn move_cursor(&self, point: &GeoPoint);
    fn redraw(&self, frame: &PlotFrame);
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapLayer {
    pub name: String,
    pub keys: Vec<String>,
    pub points: Vec<GeoPoint>,
}

#[derive(Debug, Default)]
struct Layers {
    bindings: HashMap<String, String>,
    points: BTreeMap<String, Vec<GeoPoint>>,
    cursor: Option<GeoPoint>,
    frame: Option<PlotFrame>,
    redraws: u64,
}

/// In-memory point layers keyed by display name, plus the cursor point and
/// the most recent plot frame.
#[derive(Debug, Default)]
pub struct LayerStore {
    inner: Mutex<Layers>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Layers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layer(&self, name: &str) -> Option<MapLayer> {
        let inner = self.lock();
        inner.points.get(name).map(|points| MapLayer {
            name: name.to_string(),
            keys: keys_for(&inner.bindings, name),
            points: points.clone(),
        })
    }

    pub fn layers(&self) -> Vec<MapLayer> {
        let inner = self.lock();
        inner
            .points
            .iter()
            .map(|(name, points)| MapLayer {
                name: name.clone(),
                keys: keys_for(&inner.bindings, name),
                points: points.clone(),
            })
            .collect()
    }

    pub fn cursor(&self) -> Option<GeoPoint> {
        self.lock().cursor
    }

    pub fn last_frame(&self) -> Option<PlotFrame> {
        self.lock().frame.clone()
    }

    pub fn redraw_count(&self) -> u64 {
        self.lock().redraws
    }
}

fn keys_for(bindings: &HashMap<String, String>, name: &str) -> Vec<String> {
    let mut keys: Vec<String> = bindings
        .iter()
        .filter(|(_, layer)| layer.as_str() == name)
        .map(|(key, _)| key.clone())
        .collect();
    keys.sort();
    keys
}

impl Renderer for LayerStore {
    fn attach(&self, key: &str, display_name: &str) {
        let mut inner = self.lock();
        if inner.points.contains_key(display_name) {
            log::info!("Found existing layer for {}", display_name);
        } else {
            inner.points.insert(display_name.to_string(), Vec::new());
        }
        inner
            .bindings
            .insert(key.to_string(), display_name.to_string());
    }

    fn detach(&self, key: &str) {
        let mut inner = self.lock();
        let Some(name) = inner.bindings.remove(key) else {
            return;
        };
        if !inner.bindings.values().any(|n| *n == name) {
            inner.points.remove(&name);
        }
    }

    fn clear(&self, key: &str) {
        let mut inner = self.lock();
        if let Some(name) = inner.bindings.get(key).cloned() {
            if let Some(points) = inner.points.get_mut(&name) {
                points.clear();
            }
        }
    }

    fn add_point(&self, key: &str, point: &GeoPoint) {
        let mut inner = self.lock();
        let Some(name) = inner.bindings.get(key).cloned() else {
            log::debug!("No layer matching {}; cannot plot data", key);
            return;
        };
        inner.points.entry(name).or_default().push(*point);
    }

    fn move_cursor(&self, point: &GeoPoint) {
        self.lock().cursor = Some(*point);
    }

    fn redraw(&self, frame: &PlotFrame) {
        let mut inner = self.lock();
        inner.frame = Some(frame.clone());
        inner.redraws += 1;
    }
}
