use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use utoipa::ToSchema;

use super::error::EngineError;
use super::render::{PlotFrame, PlotSeries, Renderer};
use crate::geo::Origin;
use crate::locator::{GeoLocator, GeoPoint, LocateError};
use crate::registry::{Field, FieldSpec, RegistryError, RegistrySnapshot, SubscriptionRegistry};
use crate::series::{Admission, AxisRange, SeriesStore, ViewWindow, YRange};
use crate::track::{PositionSample, PositionTrack, TrackError};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EngineStatus {
    pub origin: Option<Origin>,
    pub positions: usize,
    pub track_range: Option<AxisRange>,
    pub last_position: Option<PositionSample>,
    pub fields: usize,
    pub window: ViewWindow,
}

/// Position track, field series and registry, wired to a renderer.
///
/// The `handle_*` methods are called from the delivery context; the rest
/// from the display/query context.
pub struct Engine {
    locator: GeoLocator,
    series: SeriesStore,
    registry: Mutex<SubscriptionRegistry>,
    renderer: Arc<dyn Renderer>,
}

impl Engine {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            locator: GeoLocator::new(Arc::new(PositionTrack::new())),
            series: SeriesStore::new(),
            registry: Mutex::new(SubscriptionRegistry::new()),
            renderer,
        }
    }

    fn registry(&self) -> MutexGuard<'_, SubscriptionRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn locator(&self) -> &GeoLocator {
        &self.locator
    }

    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    pub fn handle_origin(&self, origin: Origin) -> Result<Origin, LocateError> {
        let origin = self.locator.initialize_origin(origin)?;
        log::info!(
            "Initialized origin at lat={}, lon={}",
            origin.latitude_deg,
            origin.longitude_deg
        );
        Ok(origin)
    }

    pub fn handle_position(&self, sample: PositionSample) -> Result<(), TrackError> {
        self.locator.track().append(sample.time, sample.x, sample.y)
    }

    /// Offer a decoded measurement. Returns the map point when the sample was
    /// admitted and the field draws on the map, `None` when it was decimated
    /// or is plot-only.
    pub fn handle_scalar(
        &self,
        key: &str,
        time: f64,
        value: f64,
    ) -> Result<Option<GeoPoint>, EngineError> {
        let sample = match self.series.append(key, time, value)? {
            Admission::Accepted(sample) => sample,
            Admission::Decimated => {
                log::trace!("Decimated {} at t={}", key, time);
                return Ok(None);
            }
        };

        let layer_enabled = self
            .registry()
            .get(key)
            .map(|f| f.spec.layer_enabled)
            .unwrap_or(false);
        if !layer_enabled {
            return Ok(None);
        }

        let point = self.locator.locate(sample.time, sample.value)?;
        self.renderer.add_point(key, &point);
        Ok(Some(point))
    }

    pub fn add_field(&self, spec: FieldSpec) -> Result<Field, EngineError> {
        let field = {
            let mut registry = self.registry();
            let key = registry.add(spec)?;
            registry
                .get(&key)
                .cloned()
                .ok_or(RegistryError::UnknownField(key))?
        };
        self.attach(&field);
        Ok(field)
    }

    /// Re-register every saved field. One result per entry, keyed by the
    /// field's `channel/field` key, in snapshot order.
    pub fn restore_fields(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> Vec<(String, Result<Field, EngineError>)> {
        let registered: Vec<_> = {
            let mut registry = self.registry();
            let results = registry.restore(snapshot);
            snapshot
                .fields
                .values()
                .zip(results)
                .map(|(spec, result)| {
                    let result = result.map_err(EngineError::from).and_then(|key| {
                        registry
                            .get(&key)
                            .cloned()
                            .ok_or_else(|| RegistryError::UnknownField(key).into())
                    });
                    (spec.key(), result)
                })
                .collect()
        };

        for (_, result) in &registered {
            if let Ok(field) = result {
                self.attach(field);
            }
        }
        registered
    }

    fn attach(&self, field: &Field) {
        if !self.series.insert(&field.key, field.sample_rate_hz()) {
            log::debug!("Reusing existing samples for {}", field.key);
        }
        if field.spec.layer_enabled {
            self.renderer.attach(&field.key, field.display_name());
        }
        log::info!("Added field {} as '{}'", field.key, field.display_name());
    }

    pub fn remove_field(&self, key: &str) -> Result<Field, EngineError> {
        let field = self.registry().remove(key)?;
        self.series.remove(key);
        self.renderer.detach(key);
        log::info!("Removed field {}", key);
        Ok(field)
    }

    /// Drop a field's history; the subscription stays.
    pub fn clear_field(&self, key: &str) -> Result<(), EngineError> {
        if !self.registry().contains(key) {
            return Err(RegistryError::UnknownField(key.to_string()).into());
        }
        self.series.clear(key)?;
        self.renderer.clear(key);
        Ok(())
    }

    pub fn field(&self, key: &str) -> Option<Field> {
        self.registry().get(key).cloned()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.registry().fields().cloned().collect()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry().snapshot()
    }

    pub fn set_window(&self, window: ViewWindow) -> Result<(), EngineError> {
        self.series.set_window(window)?;
        Ok(())
    }

    /// Apply the typed time-limit text.
    pub fn set_time_limit(&self, text: &str) -> Result<ViewWindow, EngineError> {
        let window = ViewWindow::parse_limit(text)?;
        self.series.set_window(window)?;
        Ok(window)
    }

    pub fn set_y_range(&self, key: &str, y_range: YRange) -> Result<(), EngineError> {
        self.series.set_y_range(key, y_range)?;
        Ok(())
    }

    pub fn set_visible(&self, key: &str, visible: bool) -> Result<(), EngineError> {
        self.series.set_visible(key, visible)?;
        Ok(())
    }

    /// Place the map cursor at `time` and redraw right away.
    pub fn cursor(&self, time: f64) -> Result<GeoPoint, LocateError> {
        let point = self.locator.locate_cursor(time)?;
        self.renderer.move_cursor(&point);
        self.refresh();
        Ok(point)
    }

    pub fn plot_frame(&self) -> PlotFrame {
        let views = self.series.views();
        let registry = self.registry();
        let series = views
            .into_iter()
            .map(|view| PlotSeries {
                display_name: registry
                    .get(&view.key)
                    .map(|f| f.display_name().to_string())
                    .unwrap_or_else(|| view.key.clone()),
                view,
            })
            .collect();
        PlotFrame {
            window: self.series.window(),
            time_bounds: self.series.time_bounds(),
            series,
        }
    }

    pub fn refresh(&self) {
        self.renderer.redraw(&self.plot_frame());
    }

    pub fn status(&self) -> EngineStatus {
        let track = self.locator.track();
        EngineStatus {
            origin: self.locator.origin(),
            positions: track.len(),
            track_range: track.time_range().map(|(a, b)| AxisRange::new(a, b)),
            last_position: track.last(),
            fields: self.registry().len(),
            window: self.series.window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LayerStore;

    fn spec(channel: &str, field: &str, rate: f64, layer_enabled: bool) -> FieldSpec {
        FieldSpec {
            channel: channel.into(),
            type_descriptor: "float".into(),
            field_name: field.into(),
            sample_rate_hz: rate,
            display_name: format!("{} {}", channel, field),
            layer_enabled,
        }
    }

    fn engine() -> (Engine, Arc<LayerStore>) {
        let layers = Arc::new(LayerStore::new());
        (Engine::new(layers.clone()), layers)
    }

    fn ready(engine: &Engine) {
        engine.handle_origin(Origin::new(42.0, -70.0)).unwrap();
        engine
            .handle_position(PositionSample { time: 0.0, x: 0.0, y: 0.0 })
            .unwrap();
        engine
            .handle_position(PositionSample { time: 10.0, x: 100.0, y: 0.0 })
            .unwrap();
    }

    #[test]
    fn scalar_before_origin_is_kept_but_not_mapped() {
        let (engine, layers) = engine();
        engine.add_field(spec("CTD", "temp", 10.0, true)).unwrap();

        let err = engine.handle_scalar("CTD/temp", 1.0, 5.0).unwrap_err();
        assert!(matches!(err, EngineError::Locate(LocateError::Uninitialized)));
        assert_eq!(engine.series().view("CTD/temp").unwrap().total_samples, 1);
        assert!(layers.layer("CTD temp").unwrap().points.is_empty());
    }

    #[test]
    fn admitted_scalar_is_geolocated_onto_its_layer() {
        let (engine, layers) = engine();
        ready(&engine);
        engine.add_field(spec("CTD", "temp", 1.0, true)).unwrap();

        let point = engine.handle_scalar("CTD/temp", 5.0, 12.0).unwrap().unwrap();
        assert_eq!((point.x, point.y), (50.0, 0.0));
        assert_eq!(point.value, Some(12.0));

        // decimated: inside one period of the last accepted sample
        assert!(engine.handle_scalar("CTD/temp", 5.5, 13.0).unwrap().is_none());
        assert_eq!(layers.layer("CTD temp").unwrap().points.len(), 1);
    }

    #[test]
    fn plot_only_field_skips_map() {
        let (engine, layers) = engine();
        ready(&engine);
        engine.add_field(spec("CTD", "temp", 1.0, false)).unwrap();
        assert!(engine.handle_scalar("CTD/temp", 5.0, 12.0).unwrap().is_none());
        assert!(layers.layers().is_empty());
        assert_eq!(engine.series().view("CTD/temp").unwrap().total_samples, 1);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.handle_scalar("X/y", 1.0, 1.0),
            Err(EngineError::Series(_))
        ));
        assert!(matches!(
            engine.clear_field("X/y"),
            Err(EngineError::Registry(RegistryError::UnknownField(_)))
        ));
        assert!(matches!(
            engine.remove_field("X/y"),
            Err(EngineError::Registry(RegistryError::UnknownField(_)))
        ));
    }

    #[test]
    fn duplicate_field_leaves_first_untouched() {
        let (engine, _) = engine();
        engine.add_field(spec("CH", "Type.field", 1.0, true)).unwrap();
        engine.handle_scalar("CH/Type.field", 1.0, 1.0).ok();
        assert!(matches!(
            engine.add_field(spec("CH", "Type.field", 1.0, true)),
            Err(EngineError::Registry(RegistryError::DuplicateField(_)))
        ));
        assert_eq!(engine.fields().len(), 1);
        assert_eq!(engine.series().view("CH/Type.field").unwrap().total_samples, 1);
    }

    #[test]
    fn clear_keeps_subscription() {
        let (engine, layers) = engine();
        ready(&engine);
        engine.add_field(spec("CTD", "temp", 1.0, true)).unwrap();
        engine.handle_scalar("CTD/temp", 1.0, 1.0).unwrap();
        engine.clear_field("CTD/temp").unwrap();

        assert!(engine.field("CTD/temp").is_some());
        assert_eq!(engine.series().view("CTD/temp").unwrap().total_samples, 0);
        assert!(layers.layer("CTD temp").unwrap().points.is_empty());
        assert!(engine.handle_scalar("CTD/temp", 1.0, 1.0).unwrap().is_some());
    }

    #[test]
    fn remove_tears_down_series_and_layer() {
        let (engine, layers) = engine();
        engine.add_field(spec("CTD", "temp", 1.0, true)).unwrap();
        engine.remove_field("CTD/temp").unwrap();
        assert!(engine.fields().is_empty());
        assert!(!engine.series().contains("CTD/temp"));
        assert!(layers.layers().is_empty());
    }

    #[test]
    fn cursor_moves_and_redraws() {
        let (engine, layers) = engine();
        assert_eq!(engine.cursor(1.0), Err(LocateError::Uninitialized));
        ready(&engine);

        let point = engine.cursor(2.5).unwrap();
        assert_eq!(point.x, 25.0);
        assert_eq!(layers.cursor().unwrap().x, 25.0);
        assert_eq!(layers.redraw_count(), 1);

        assert!(matches!(engine.cursor(f64::NAN), Err(LocateError::InvalidTime(_))));
        assert_eq!(layers.cursor().unwrap().x, 25.0);
        assert_eq!(layers.redraw_count(), 1);
    }

    #[test]
    fn restore_registers_saved_fields_and_reports_duplicates() {
        let (engine, layers) = engine();
        engine.add_field(spec("CTD", "temp", 10.0, true)).unwrap();

        let mut snapshot = RegistrySnapshot::default();
        for field in [spec("CTD", "temp", 10.0, true), spec("CTD", "salt", 1.0, true)] {
            snapshot.fields.insert(field.key(), field);
        }
        let results = engine.restore_fields(&snapshot);

        let keys: Vec<&str> = results.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["CTD/salt", "CTD/temp"]);
        assert_eq!(results[0].1.as_ref().unwrap().key, "CTD/salt");
        assert!(matches!(
            results[1].1,
            Err(EngineError::Registry(RegistryError::DuplicateField(_)))
        ));
        assert!(engine.series().contains("CTD/salt"));
        assert!(layers.layer("CTD salt").is_some());
        assert_eq!(engine.fields().len(), 2);
    }

    #[test]
    fn plot_frame_labels_series_and_shares_axis() {
        let (engine, layers) = engine();
        engine.add_field(spec("A", "a", 100.0, false)).unwrap();
        engine.add_field(spec("B", "b", 100.0, false)).unwrap();
        engine.handle_scalar("A/a", 1.0, 1.0).unwrap();
        engine.handle_scalar("B/b", 3.0, 2.0).unwrap();
        engine.set_time_limit("").unwrap();

        engine.refresh();
        let frame = layers.last_frame().unwrap();
        assert_eq!(frame.series.len(), 2);
        assert_eq!(frame.series[0].display_name, "A a");
        assert_eq!(frame.time_bounds, Some(AxisRange::new(1.0, 3.0)));
    }

    #[test]
    fn status_reports_track_and_fields() {
        let (engine, _) = engine();
        ready(&engine);
        engine.add_field(spec("A", "a", 1.0, true)).unwrap();
        let status = engine.status();
        assert_eq!(status.positions, 2);
        assert_eq!(status.track_range, Some(AxisRange::new(0.0, 10.0)));
        assert_eq!(status.fields, 1);
        assert!(status.origin.is_some());
    }
}
