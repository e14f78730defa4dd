//! The live gateway-event bus.
//!
//! Event handlers are registered in the events registry at collection time
//! and attached here as listeners. Disabling a module detaches its listeners
//! while the registry entries stay in place, so enabling it again can
//! re-attach them.

use std::collections::HashMap;
use std::sync::Arc;

use cordage_core::GatewayEvent;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::handler::{Executor, Invocation};
use crate::router::spawn_handler;

struct Listener {
    key: String,
    once: bool,
    executor: Executor,
}

/// Listeners grouped by gateway event name.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener called on every `event`.
    pub fn on(&self, event: &str, key: impl Into<String>, executor: Executor) {
        self.attach(event, key.into(), executor, false);
    }

    /// Attaches a listener detached after its first call.
    pub fn once(&self, event: &str, key: impl Into<String>, executor: Executor) {
        self.attach(event, key.into(), executor, true);
    }

    fn attach(&self, event: &str, key: String, executor: Executor, once: bool) {
        let mut listeners = self.listeners.write();
        let slot = listeners.entry(event.to_string()).or_default();
        slot.retain(|listener| listener.key != key);
        trace!(event, key = %key, once, "Listener attached");
        slot.push(Listener {
            key,
            once,
            executor,
        });
    }

    /// Detaches the listener registered under `key`.
    pub fn off(&self, key: &str) -> bool {
        let mut listeners = self.listeners.write();
        let mut removed = false;
        for slot in listeners.values_mut() {
            let before = slot.len();
            slot.retain(|listener| listener.key != key);
            removed |= slot.len() != before;
        }
        listeners.retain(|_, slot| !slot.is_empty());
        removed
    }

    /// Calls every listener of `event.name`, each on its own task.
    pub fn emit(&self, event: GatewayEvent) -> Vec<JoinHandle<()>> {
        let fired: Vec<(String, Executor)> = {
            let mut listeners = self.listeners.write();
            let Some(slot) = listeners.get_mut(&event.name) else {
                trace!(event = %event.name, "No listeners");
                return Vec::new();
            };
            let fired = slot
                .iter()
                .map(|listener| (listener.key.clone(), listener.executor.clone()))
                .collect();
            slot.retain(|listener| !listener.once);
            if slot.is_empty() {
                listeners.remove(&event.name);
            }
            fired
        };

        debug!(event = %event.name, listeners = fired.len(), "Emitting event");
        let event = Arc::new(event);
        fired
            .into_iter()
            .map(|(key, executor)| spawn_handler(key, executor, Invocation::Event(event.clone())))
            .collect()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;
    use serde_json::Value;
    use tower::BoxError;

    use crate::guard::FnService;

    fn counting(counter: &Arc<AtomicUsize>) -> Executor {
        let counter = counter.clone();
        Executor::new(FnService::new(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        }))
    }

    fn ready() -> GatewayEvent {
        GatewayEvent::new("ready", Value::Null)
    }

    #[tokio::test]
    async fn test_once_listener_fires_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();
        bus.once("ready", "greeter_ready", counting(&counter));
        bus.on("ready", "stats_ready", counting(&counter));

        join_all(bus.emit(ready())).await;
        join_all(bus.emit(ready())).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(bus.listener_count("ready"), 1);
    }

    #[tokio::test]
    async fn test_off_detaches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();
        bus.on("ready", "greeter_ready", counting(&counter));

        assert!(bus.off("greeter_ready"));
        assert!(!bus.off("greeter_ready"));
        assert!(bus.emit(ready()).is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reattach_replaces_same_key() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();
        bus.on("ready", "greeter_ready", counting(&counter));
        bus.on("ready", "greeter_ready", counting(&counter));

        join_all(bus.emit(ready())).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
