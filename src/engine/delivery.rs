use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::transport::{Transport, TransportError};

/// Background thread pumping the transport. Every handler runs on this
/// thread, one message at a time.
pub struct DeliveryWorker {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl DeliveryWorker {
    pub fn spawn(transport: Arc<dyn Transport>, poll_interval: Duration) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let join = thread::Builder::new()
            .name("delivery".into())
            .spawn(move || run_delivery_loop(transport, poll_interval, stop_flag))?;

        log::info!("Delivery thread started (poll every {:?})", poll_interval);
        Ok(Self {
            stop,
            join: Some(join),
        })
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Signal the loop and wait for it; returns within one poll interval.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("Delivery thread panicked");
            }
        }
    }
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_delivery_loop(transport: Arc<dyn Transport>, poll_interval: Duration, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match transport.handle_timeout(poll_interval) {
            Ok(_) => {}
            Err(TransportError::Disconnected) => {
                log::warn!("Transport disconnected; delivery thread exiting");
                break;
            }
            Err(e) => log::error!("Delivery error: {}", e),
        }
    }
    log::debug!("Delivery thread stopped");
}
