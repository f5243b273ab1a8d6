//! Typed publish/subscribe fan-out.
//!
//! A listener is either a channel (drained by its owner at its own pace) or a
//! callback run on the firing thread. Events are delivered under the bus lock,
//! so every listener observes them in firing order. Callbacks must not fire on
//! the bus they listen to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

enum Listener<E> {
    Channel(mpsc::UnboundedSender<E>),
    Callback(Callback<E>),
}

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

impl<E> Registry<E> {
    fn detach(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }
}

fn lock<E>(registry: &Mutex<Registry<E>>) -> MutexGuard<'_, Registry<E>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a channel listener.
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.attach(Listener::Channel(tx));
        Subscription {
            id,
            rx: Some(rx),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a callback listener, run synchronously by `fire`.
    pub fn listen(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription<E> {
        let id = self.attach(Listener::Callback(Arc::new(callback)));
        Subscription {
            id,
            rx: None,
            registry: Arc::downgrade(&self.registry),
        }
    }

    fn attach(&self, listener: Listener<E>) -> u64 {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, listener));
        id
    }

    /// Deliver `event` to every listener registered at this moment.
    pub fn fire(&self, event: E) {
        let mut registry = lock(&self.registry);
        // receivers dropped without unsubscribing are pruned here
        registry.listeners.retain(|(_, listener)| match listener {
            Listener::Channel(tx) => tx.send(event.clone()).is_ok(),
            Listener::Callback(callback) => {
                callback(&event);
                true
            }
        });
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of one listener. Dropping it detaches the listener.
pub struct Subscription<E> {
    id: u64,
    rx: Option<mpsc::UnboundedReceiver<E>>,
    registry: Weak<Mutex<Registry<E>>>,
}

impl<E> Subscription<E> {
    /// Next event of a channel subscription. `None` once the bus is gone,
    /// and always for callback subscriptions.
    pub async fn recv(&mut self) -> Option<E> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.as_mut().and_then(|rx| rx.try_recv().ok())
    }

    pub fn unsubscribe(self) {}

    fn detach(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => lock(&registry).detach(self.id),
            None => false,
        }
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.detach();
    }
}
