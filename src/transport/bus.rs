use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;

use super::error::TransportError;

/// Message callback, invoked from the delivery context with `(channel, data)`.
pub type Handler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Publish/subscribe channel the vehicle messages arrive on.
pub trait Transport: Send + Sync {
    fn subscribe(&self, channel: &str, handler: Handler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError>;

    /// Wait up to `timeout` for one message and dispatch it to the matching
    /// handlers. Returns false if nothing arrived.
    fn handle_timeout(&self, timeout: Duration) -> Result<bool, TransportError>;
}

#[derive(Debug, Clone)]
pub struct Message {
    pub channel: String,
    pub data: Vec<u8>,
}

/// Sending half of a `MemoryBus`.
#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::Sender<Message>,
}

impl Publisher {
    pub fn publish(&self, channel: &str, data: Vec<u8>) -> Result<(), TransportError> {
        self.tx
            .send(Message {
                channel: channel.to_string(),
                data,
            })
            .map_err(|_| TransportError::Disconnected)
    }
}

struct Subscriber {
    channel: String,
    handler: Handler,
}

/// In-process transport: published messages queue up until a delivery
/// thread calls `handle_timeout`.
pub struct MemoryBus {
    subscribers: Mutex<HashMap<SubscriptionId, Subscriber>>,
    next_id: AtomicU64,
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            tx,
            rx: Mutex::new(rx),
        }
    }

    pub fn publisher(&self) -> Publisher {
        Publisher {
            tx: self.tx.clone(),
        }
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.channel == channel)
            .count()
    }

    fn dispatch(&self, message: &Message) {
        // Handlers run without the subscriber lock so they may (un)subscribe.
        let handlers: Vec<Handler> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.channel == message.channel)
            .map(|s| s.handler.clone())
            .collect();

        if handlers.is_empty() {
            log::trace!("No subscribers for {}", message.channel);
        }
        for handler in handlers {
            handler(&message.channel, &message.data);
        }
    }
}

impl Transport for MemoryBus {
    fn subscribe(&self, channel: &str, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Subscriber {
                    channel: channel.to_string(),
                    handler,
                },
            );
        log::debug!("Subscribed {} to {}", id, channel);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|s| log::debug!("Unsubscribed {} from {}", id, s.channel))
            .ok_or(TransportError::UnknownSubscription(id))
    }

    fn handle_timeout(&self, timeout: Duration) -> Result<bool, TransportError> {
        let received = {
            let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
            rx.recv_timeout(timeout)
        };
        match received {
            Ok(message) => {
                self.dispatch(&message);
                Ok(true)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(false),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}
