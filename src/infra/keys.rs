//! Global key-listener registry
//!
//! Listeners subscribe and receive every dispatched key on their own channel.
//! A subscription unregisters itself when dropped, so a listener can never
//! outlive the view that owns it.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

/// Keys the booking views react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, mpsc::UnboundedSender<Key>)>,
}

/// Process-wide key dispatch point
#[derive(Clone, Default)]
pub struct KeyBus {
    inner: Arc<Mutex<Listeners>>,
}

impl KeyBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Released when the returned subscription drops.
    pub fn subscribe(&self) -> KeySubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.inner.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, tx));
        debug!(listener_id = id, listeners = listeners.entries.len(), "key_listener_added");
        KeySubscription { id, rx, bus: Arc::downgrade(&self.inner) }
    }

    /// Deliver a key to every live listener; returns how many received it
    pub fn dispatch(&self, key: Key) -> usize {
        let mut listeners = self.inner.lock();
        listeners.entries.retain(|(_, tx)| !tx.is_closed());
        listeners.entries.iter().filter(|(_, tx)| tx.send(key).is_ok()).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// A registered key listener
pub struct KeySubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Key>,
    bus: Weak<Mutex<Listeners>>,
}

impl KeySubscription {
    /// Next pending key, if one was dispatched
    pub fn try_next(&mut self) -> Option<Key> {
        self.rx.try_recv().ok()
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut listeners = bus.lock();
            listeners.entries.retain(|(id, _)| *id != self.id);
            debug!(listener_id = self.id, listeners = listeners.entries.len(), "key_listener_removed");
        }
    }
}
