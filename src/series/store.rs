use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use utoipa::ToSchema;

use super::error::SeriesError;
use super::sample::{Admission, ScalarSample};
use super::series::ScalarSeries;
use super::window::{AxisRange, ViewWindow, YRange};

/// Display-ready copy of one series.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeriesView {
    pub key: String,
    pub visible: bool,
    pub window: ViewWindow,
    pub y_limits: YRange,
    pub y_range: Option<AxisRange>,
    pub samples: Vec<ScalarSample>,
    pub total_samples: usize,
}

impl SeriesView {
    fn of(key: &str, series: &ScalarSeries) -> Self {
        Self {
            key: key.to_string(),
            visible: series.is_visible(),
            window: series.window(),
            y_limits: series.y_range(),
            y_range: series.effective_y_range(),
            samples: series.visible_slice().to_vec(),
            total_samples: series.len(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    series: HashMap<String, ScalarSeries>,
    window: ViewWindow,
}

/// All field series behind one lock, so `append` from the delivery context
/// and window changes from the display context are serialized.
///
/// The time window is global: setting it applies to every series and to
/// series added afterwards.
#[derive(Debug, Default)]
pub struct SeriesStore {
    inner: Mutex<Inner>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the series for `key` if it does not exist yet. Returns false
    /// when an existing series (and its history) was kept.
    pub fn insert(&self, key: &str, sample_rate_hz: f64) -> bool {
        let mut inner = self.lock();
        if inner.series.contains_key(key) {
            return false;
        }
        let mut series = ScalarSeries::new(sample_rate_hz);
        // the global window was validated when it was set
        let _ = series.set_window(inner.window);
        inner.series.insert(key.to_string(), series);
        true
    }

    pub fn remove(&self, key: &str) -> Option<ScalarSeries> {
        self.lock().series.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().series.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().series.is_empty()
    }

    pub fn append(&self, key: &str, time: f64, value: f64) -> Result<Admission, SeriesError> {
        let mut inner = self.lock();
        let series = inner
            .series
            .get_mut(key)
            .ok_or_else(|| SeriesError::UnknownField(key.to_string()))?;
        Ok(series.append(time, value))
    }

    pub fn clear(&self, key: &str) -> Result<(), SeriesError> {
        self.with_series(key, ScalarSeries::clear)
    }

    pub fn set_y_range(&self, key: &str, y_range: YRange) -> Result<(), SeriesError> {
        self.with_series(key, |series| series.set_y_range(y_range))
    }

    pub fn set_visible(&self, key: &str, visible: bool) -> Result<(), SeriesError> {
        self.with_series(key, |series| series.set_visible(visible))
    }

    pub fn set_window(&self, window: ViewWindow) -> Result<(), SeriesError> {
        let window = window.validated()?;
        let mut inner = self.lock();
        inner.window = window;
        for series in inner.series.values_mut() {
            series.set_window(window)?;
        }
        Ok(())
    }

    pub fn window(&self) -> ViewWindow {
        self.lock().window
    }

    pub fn view(&self, key: &str) -> Result<SeriesView, SeriesError> {
        let inner = self.lock();
        inner
            .series
            .get(key)
            .map(|series| SeriesView::of(key, series))
            .ok_or_else(|| SeriesError::UnknownField(key.to_string()))
    }

    /// Views of every series, ordered by key.
    pub fn views(&self) -> Vec<SeriesView> {
        let inner = self.lock();
        let mut views: Vec<SeriesView> = inner
            .series
            .iter()
            .map(|(key, series)| SeriesView::of(key, series))
            .collect();
        views.sort_by(|a, b| a.key.cmp(&b.key));
        views
    }

    /// Shared time-axis limits across all series under the global window.
    pub fn time_bounds(&self) -> Option<AxisRange> {
        let inner = self.lock();
        if let ViewWindow::Explicit { t0, t1 } = inner.window {
            return Some(AxisRange::new(t0, t1));
        }
        let span = inner
            .series
            .values()
            .filter_map(ScalarSeries::time_range)
            .reduce(|a, b| AxisRange::new(a.min.min(b.min), a.max.max(b.max)))?;
        Some(inner.window.bounds(span.min, span.max))
    }

    fn with_series<F>(&self, key: &str, f: F) -> Result<(), SeriesError>
    where
        F: FnOnce(&mut ScalarSeries),
    {
        let mut inner = self.lock();
        let series = inner
            .series
            .get_mut(key)
            .ok_or_else(|| SeriesError::UnknownField(key.to_string()))?;
        f(series);
        Ok(())
    }
}
