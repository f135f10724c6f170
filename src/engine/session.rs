use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::delivery::DeliveryWorker;
use super::engine::Engine;
use super::error::EngineError;
use crate::locator::LocateError;
use crate::registry::{Field, FieldSpec, Persistence, RegistrySnapshot};
use crate::transport::{decode_origin, decode_position, FieldDecoder, Handler, SubscriptionId, Transport};

pub const DEFAULT_ORIGIN_CHANNEL: &str = "DIVE_INI";
pub const DEFAULT_POSITION_CHANNELS: [&str; 2] = ["FIBER_STATEXY", "ACOMM_STATEXY"];
pub const DEFAULT_SECTION: &str = "nui_scalar_data";
pub const DEFAULT_KEY: &str = "subscriptions";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub origin_channel: String,
    pub position_channels: Vec<String>,
    pub poll_interval: Duration,
    /// Persistence section and key the registry snapshot lives under.
    pub section: String,
    pub key: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            origin_channel: DEFAULT_ORIGIN_CHANNEL.to_string(),
            position_channels: DEFAULT_POSITION_CHANNELS.iter().map(|c| c.to_string()).collect(),
            poll_interval: Duration::from_millis(100),
            section: DEFAULT_SECTION.to_string(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

/// Result of re-registering persisted fields.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    pub restored: Vec<String>,
    pub failed: Vec<(String, EngineError)>,
}

/// Owns the transport subscriptions of one engine: the origin and position
/// sources plus one handle per registered field.
pub struct Session {
    engine: Arc<Engine>,
    transport: Arc<dyn Transport>,
    persistence: Option<Arc<dyn Persistence>>,
    options: SessionOptions,
    handles: Mutex<HashMap<String, SubscriptionId>>,
    sources: Mutex<Vec<SubscriptionId>>,
    origin_handle: Arc<Mutex<Option<SubscriptionId>>>,
    worker: Mutex<Option<DeliveryWorker>>,
}

impl Session {
    pub fn new(engine: Arc<Engine>, transport: Arc<dyn Transport>, options: SessionOptions) -> Self {
        Self {
            engine,
            transport,
            persistence: None,
            options,
            handles: Mutex::new(HashMap::new()),
            sources: Mutex::new(Vec::new()),
            origin_handle: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Subscribe the sources and start the delivery thread.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            log::warn!("Session already started");
            return Ok(());
        }
        self.subscribe_sources();
        *worker = Some(DeliveryWorker::spawn(
            self.transport.clone(),
            self.options.poll_interval,
        )?);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(DeliveryWorker::is_running)
    }

    /// Stop delivery. Subscriptions stay registered with the transport.
    pub fn stop(&self) {
        if let Some(mut worker) = lock(&self.worker).take() {
            worker.stop();
            log::info!("Session stopped");
        }
    }

    /// Subscribe the origin channel and every position channel. Idempotent.
    pub fn subscribe_sources(&self) {
        let mut sources = lock(&self.sources);
        if !sources.is_empty() {
            return;
        }

        let origin_id = self
            .transport
            .subscribe(&self.options.origin_channel, self.origin_handler());
        *lock(&self.origin_handle) = Some(origin_id);
        sources.push(origin_id);

        for channel in &self.options.position_channels {
            let engine = self.engine.clone();
            let handler: Handler = Arc::new(move |channel: &str, data: &[u8]| {
                let sample = match decode_position(data) {
                    Ok(sample) => sample,
                    Err(e) => {
                        log::warn!("Dropping position on {}: {}", channel, e);
                        return;
                    }
                };
                if let Err(e) = engine.handle_position(sample) {
                    log::debug!("Rejected position on {}: {}", channel, e);
                }
            });
            sources.push(self.transport.subscribe(channel, handler));
        }
        log::info!(
            "Listening for origin on {} and positions on {:?}",
            self.options.origin_channel,
            self.options.position_channels
        );
    }

    fn origin_handler(&self) -> Handler {
        let engine = self.engine.clone();
        let transport = Arc::downgrade(&self.transport);
        let slot = self.origin_handle.clone();

        Arc::new(move |channel: &str, data: &[u8]| {
            let origin = match decode_origin(data) {
                Ok(origin) => origin,
                Err(e) => {
                    log::warn!("Dropping origin on {}: {}", channel, e);
                    return;
                }
            };
            match engine.handle_origin(origin) {
                Ok(_) => {}
                Err(LocateError::AlreadyInitialized) => {
                    log::info!("Ignoring repeated origin on {}", channel);
                }
                Err(e) => {
                    log::warn!("Ignoring origin on {}: {}", channel, e);
                    return;
                }
            }

            // one origin per session
            let id = lock(&slot).take();
            if let (Some(id), Some(transport)) = (id, transport.upgrade()) {
                if let Err(e) = transport.unsubscribe(id) {
                    log::warn!("Failed to unsubscribe {}: {}", channel, e);
                }
            }
        })
    }

    /// Register a field and subscribe its channel, then save the snapshot.
    pub fn add_field(&self, spec: FieldSpec) -> Result<Field, EngineError> {
        let field = self.register(spec)?;
        self.save_logged();
        Ok(field)
    }

    fn register(&self, spec: FieldSpec) -> Result<Field, EngineError> {
        let field = match self.engine.add_field(spec) {
            Ok(field) => field,
            Err(e) => {
                log::warn!("Cannot add field: {}", e);
                return Err(e);
            }
        };
        self.subscribe_field(&field);
        Ok(field)
    }

    fn subscribe_field(&self, field: &Field) {
        let engine = self.engine.clone();
        let key = field.key.clone();
        let decoder = FieldDecoder::new(&field.spec.type_descriptor, &field.spec.field_name);
        let handler: Handler = Arc::new(move |channel: &str, data: &[u8]| {
            let (time, value) = match decoder.decode(data) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!("Dropping {} message on {}: {}", key, channel, e);
                    return;
                }
            };
            match engine.handle_scalar(&key, time, value) {
                Ok(_) => {}
                Err(EngineError::Locate(e)) => {
                    log::debug!("Cannot place {} at t={}: {}", key, time, e);
                }
                Err(e) => log::warn!("Dropping {} sample: {}", key, e),
            }
        });

        let id = self.transport.subscribe(field.channel(), handler);
        lock(&self.handles).insert(field.key.clone(), id);
    }

    /// Unsubscribe and forget a field, then save the snapshot.
    pub fn remove_field(&self, key: &str) -> Result<Field, EngineError> {
        let field = match self.engine.remove_field(key) {
            Ok(field) => field,
            Err(e) => {
                log::warn!("Cannot remove field: {}", e);
                return Err(e);
            }
        };
        if let Some(id) = lock(&self.handles).remove(key) {
            if let Err(e) = self.transport.unsubscribe(id) {
                log::warn!("Failed to unsubscribe {}: {}", key, e);
            }
        }
        self.save_logged();
        Ok(field)
    }

    pub fn clear_field(&self, key: &str) -> Result<(), EngineError> {
        self.engine.clear_field(key)
    }

    /// Register every spec; failures are reported and skipped.
    pub fn register_fields(&self, specs: &[FieldSpec]) -> RestoreOutcome {
        let mut outcome = RestoreOutcome::default();
        for spec in specs {
            match self.register(spec.clone()) {
                Ok(field) => outcome.restored.push(field.key),
                Err(e) => outcome.failed.push((spec.key(), e)),
            }
        }
        if !outcome.restored.is_empty() {
            self.save_logged();
        }
        outcome
    }

    /// Re-register the fields saved by a previous session.
    pub fn restore(&self) -> Result<RestoreOutcome, EngineError> {
        let Some(persistence) = &self.persistence else {
            return Ok(RestoreOutcome::default());
        };
        let Some(yaml) = persistence.read_entry(&self.options.section, &self.options.key)? else {
            log::info!("No saved subscriptions");
            return Ok(RestoreOutcome::default());
        };

        let snapshot = RegistrySnapshot::from_yaml(&yaml)?;
        let mut outcome = RestoreOutcome::default();
        for (key, result) in self.engine.restore_fields(&snapshot) {
            match result {
                Ok(field) => {
                    self.subscribe_field(&field);
                    outcome.restored.push(field.key);
                }
                Err(e) => {
                    log::warn!("Cannot restore field {}: {}", key, e);
                    outcome.failed.push((key, e));
                }
            }
        }
        log::info!(
            "Restored {} of {} saved subscriptions",
            outcome.restored.len(),
            snapshot.len()
        );
        Ok(outcome)
    }

    pub fn save(&self) -> Result<(), EngineError> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        let yaml = self.engine.snapshot().to_yaml()?;
        persistence.write_entry(&self.options.section, &self.options.key, &yaml)?;
        Ok(())
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            log::error!("Failed to save subscriptions: {}", e);
        }
    }

    pub fn subscription_count(&self) -> usize {
        lock(&self.handles).len()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
