use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::types::{Event, EventFilter, EventHandler, EventKind};

struct Subscription {
    /// Unique name used for unsubscription and log correlation.
    name: String,
    filter: EventFilter,
    handler: Arc<dyn EventHandler>,
}

/// Synchronous publish/subscribe bus for scheduler notifications.
///
/// Designed to be cheaply shareable via Arc — one bus instance per
/// scheduler. Dispatch runs on the emitter's task in subscription order;
/// a failing handler is logged and skipped, never propagated.
pub struct EventBus {
    /// Kept in subscription order — dispatch order is registration order.
    subscriptions: RwLock<Vec<Subscription>>,
    seq: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Register a handler under `name` for events matching `filter`.
    ///
    /// Re-using a name replaces the earlier subscription, so idempotent
    /// setup code can subscribe unconditionally.
    pub fn subscribe(
        &self,
        name: impl Into<String>,
        filter: impl Into<EventFilter>,
        handler: Arc<dyn EventHandler>,
    ) {
        let name = name.into();
        let mut subs = self.subscriptions.write().expect("event bus poisoned");
        subs.retain(|s| s.name != name);
        debug!(subscriber = %name, "event subscription registered");
        subs.push(Subscription {
            name,
            filter: filter.into(),
            handler,
        });
    }

    /// Remove the named subscription. Silent no-op if absent.
    pub fn unsubscribe(&self, name: &str) {
        let mut subs = self.subscriptions.write().expect("event bus poisoned");
        let before = subs.len();
        subs.retain(|s| s.name != name);
        if subs.len() < before {
            debug!(subscriber = %name, "event subscription removed");
        }
    }

    /// Publish an event to every matching subscriber, in subscription
    /// order. Handler failures are logged and do not stop later handlers.
    pub fn emit(&self, kind: EventKind, payload: serde_json::Value) {
        let event = Event {
            kind,
            payload,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            timestamp: now_ms(),
        };

        let subs = self.subscriptions.read().expect("event bus poisoned");
        for sub in subs.iter().filter(|s| s.filter.matches(kind)) {
            if let Err(reason) = sub.handler.handle(&event) {
                warn!(
                    subscriber = %sub.name,
                    event = %kind,
                    reason = %reason,
                    "event handler failed; continuing with remaining handlers"
                );
            }
        }
    }

    /// Number of live subscriptions (for tests and status output).
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().expect("event bus poisoned").len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        // Fallback to 0 only if the system clock is broken — acceptable.
        .unwrap_or_default()
        .as_millis() as u64
}
