use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nui_scalar::engine::{Engine, LayerStore, Session, SessionOptions};
use nui_scalar::geo::to_local;
use nui_scalar::registry::{FieldSpec, YamlFileStore};
use nui_scalar::series::{AxisRange, ViewWindow};
use nui_scalar::transport::{replay, MemoryBus, ReplayRecord, Transport};
use serde_json::json;

fn record(channel: &str, payload: serde_json::Value) -> ReplayRecord {
    ReplayRecord {
        channel: channel.into(),
        payload,
    }
}

fn temperature() -> FieldSpec {
    FieldSpec {
        channel: "CTD".into(),
        type_descriptor: "float".into(),
        field_name: "temperature".into(),
        sample_rate_hz: 2.0,
        display_name: "Temperature".into(),
        layer_enabled: true,
    }
}

fn wait_for<F: Fn() -> bool>(done: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn dive_is_geolocated_and_subscriptions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("project.yaml");
    let options = SessionOptions {
        poll_interval: Duration::from_millis(10),
        ..SessionOptions::default()
    };

    let bus = Arc::new(MemoryBus::new());
    let layers = Arc::new(LayerStore::new());
    let session = Session::new(Arc::new(Engine::new(layers.clone())), bus.clone(), options.clone())
        .with_persistence(Arc::new(YamlFileStore::new(store_path.clone())));
    session.add_field(temperature()).unwrap();
    session.start().unwrap();

    let records = vec![
        // before the origin: kept in the series, not on the map
        record("CTD", json!({"utime": 0, "temperature": 10.0})),
        record("DIVE_INI", json!({"origin_latitude": 42.0, "origin_longitude": -70.0})),
        record("DIVE_INI", json!({"origin_latitude": 10.0, "origin_longitude": 10.0})),
        record("FIBER_STATEXY", json!({"utime": 1_000_000, "x": 0.0, "y": 0.0})),
        record("ACOMM_STATEXY", json!({"utime": 3_000_000, "x": 200.0, "y": -100.0})),
        record("FIBER_STATEXY", json!({"utime": 2_000_000, "x": 999.0, "y": 999.0})),
        record("CTD", json!({"utime": 2_000_000, "temperature": 11.0})),
        record("CTD", json!({"utime": 2_200_000, "temperature": 11.1})),
        record("CTD", json!({"utime": 2_500_000, "temperature": 11.5})),
        record("CTD", json!({"utime": 2_600_000, "temperature": "warm"})),
        record("CTD", json!({"utime": 3_000_000, "temperature": 12.0})),
    ];
    let sent = replay(&records, &bus.publisher()).unwrap();
    assert_eq!(sent, records.len());

    let engine = session.engine().clone();
    wait_for(|| engine.series().view("CTD/temperature").unwrap().total_samples == 4);
    session.stop();

    let status = engine.status();
    let origin = status.origin.unwrap();
    assert_eq!((origin.latitude_deg, origin.longitude_deg), (42.0, -70.0));
    assert_eq!(status.positions, 2);
    assert_eq!(status.track_range, Some(AxisRange::new(1.0, 3.0)));
    assert_eq!(bus.subscriber_count("DIVE_INI"), 0);

    // t=0 before origin, t=2.2 decimated, "warm" undecodable but delivery goes on
    let view = engine.series().view("CTD/temperature").unwrap();
    let times: Vec<f64> = view.samples.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![0.0, 2.0, 2.5, 3.0]);

    let layer = layers.layer("Temperature").unwrap();
    assert_eq!(layer.points.len(), 3);
    assert_eq!((layer.points[2].x, layer.points[2].y), (200.0, -100.0));
    let midway = layer.points[0];
    assert_eq!((midway.x, midway.y), (100.0, -50.0));
    let (x, y) = to_local(midway.latitude, midway.longitude, &origin);
    assert!((x - 100.0).abs() < 1e-6 && (y + 50.0).abs() < 1e-6);

    engine.set_window(ViewWindow::explicit(2.4, 1.5).unwrap()).unwrap();
    let frame = engine.plot_frame();
    assert_eq!(frame.time_bounds, Some(AxisRange::new(1.5, 2.4)));
    assert_eq!(frame.series[0].view.samples.len(), 1);
    drop(session);

    // a new session over the same project file resubscribes the field
    let bus = Arc::new(MemoryBus::new());
    let next = Session::new(Arc::new(Engine::new(Arc::new(LayerStore::new()))), bus.clone(), options)
        .with_persistence(Arc::new(YamlFileStore::new(store_path)));
    let outcome = next.restore().unwrap();
    assert_eq!(outcome.restored, vec!["CTD/temperature".to_string()]);
    assert_eq!(bus.subscriber_count("CTD"), 1);
    assert_eq!(next.engine().fields()[0].spec, temperature());
}

#[test]
fn removed_field_stops_receiving() {
    let bus = Arc::new(MemoryBus::new());
    let session = Session::new(
        Arc::new(Engine::new(Arc::new(LayerStore::new()))),
        bus.clone(),
        SessionOptions::default(),
    );
    session.add_field(temperature()).unwrap();
    session.remove_field("CTD/temperature").unwrap();
    assert_eq!(bus.subscriber_count("CTD"), 0);

    bus.publisher()
        .publish("CTD", br#"{"utime": 0, "temperature": 1.0}"#.to_vec())
        .unwrap();
    while bus.handle_timeout(Duration::from_millis(1)).unwrap() {}

    assert!(session.engine().fields().is_empty());
    assert!(!session.engine().series().contains("CTD/temperature"));
}
