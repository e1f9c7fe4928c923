use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::subscription::SubscriptionError;
use crate::util::{PartialObserver, Unsubscribe};

/// Observer list for auth-state changes, for adapters whose SDK only exposes a single
/// callback slot.
pub struct AuthStateListeners<U> {
    next_id: AtomicU64,
    observers: Arc<Mutex<Vec<(u64, PartialObserver<Option<U>>)>>>,
}

impl<U: Send + 'static> AuthStateListeners<U> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers a new observer; the returned handle removes it again.
    pub fn add_observer(&self, observer: PartialObserver<Option<U>>) -> Unsubscribe {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().unwrap().push((id, observer));

        let observers = self.observers.clone();
        Box::new(move || {
            observers.lock().unwrap().retain(|(entry, _)| *entry != id);
        })
    }

    /// Notifies all observers with the provided user, or `None` after sign-out.
    pub fn notify(&self, user: &Option<U>) {
        for observer in self.snapshot() {
            observer.notify_next(user);
        }
    }

    pub fn notify_error(&self, error: &SubscriptionError) {
        for observer in self.snapshot() {
            observer.notify_error(error);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<PartialObserver<Option<U>>> {
        self.observers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }
}

impl<U: Send + 'static> Default for AuthStateListeners<U> {
    fn default() -> Self {
        Self::new()
    }
}
