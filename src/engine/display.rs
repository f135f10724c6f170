use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::engine::Engine;

/// Periodic plot refresh on the display side.
pub struct RefreshTimer {
    stop_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<u64>>,
}

impl RefreshTimer {
    /// Must be called inside a tokio runtime.
    pub fn start(engine: Arc<Engine>, period: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_refresh_loop(engine, period, stop_rx));
        Self {
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }

    /// Stop the timer. Returns how many refreshes ran.
    pub async fn stop(&mut self) -> u64 {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        match self.join.take() {
            Some(join) => join.await.unwrap_or(0),
            None => 0,
        }
    }
}

async fn run_refresh_loop(engine: Arc<Engine>, period: Duration, mut stop_rx: oneshot::Receiver<()>) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refreshes = 0;

    loop {
        let should_stop = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }
        engine.refresh();
        refreshes += 1;
    }

    log::debug!("Refresh timer stopped after {} refreshes", refreshes);
    refreshes
}
