//! Test utilities shared across crate-level unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::subscription::{Emitter, SubscriptionError};
use crate::util::{PartialObserver, Unsubscribe};

/// Stand-in for an SDK listener that the test drives by hand.
///
/// Every starter handed out records the emitter it receives, so `emit`/`fail` always go to
/// the most recently started stream.
pub struct ManualStream<T> {
    emitter: Arc<Mutex<Option<Emitter<T>>>>,
    starts: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
}

impl<T: Clone + Send + 'static> ManualStream<T> {
    pub fn new() -> Self {
        Self {
            emitter: Arc::new(Mutex::new(None)),
            starts: Arc::new(AtomicUsize::new(0)),
            cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn starter(&self) -> impl FnOnce(Emitter<T>) -> Unsubscribe {
        let slot = self.emitter.clone();
        let starts = self.starts.clone();
        let cancels = self.cancels.clone();
        move |emitter: Emitter<T>| -> Unsubscribe {
            starts.fetch_add(1, Ordering::SeqCst);
            *slot.lock().unwrap() = Some(emitter);
            Box::new(move || {
                cancels.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    pub fn emit(&self, value: T) {
        let emitter = self.emitter.lock().unwrap().clone();
        if let Some(emitter) = emitter {
            emitter.emit(value);
        }
    }

    pub fn fail(&self, error: SubscriptionError) {
        let emitter = self.emitter.lock().unwrap().clone();
        if let Some(emitter) = emitter {
            emitter.fail(error);
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn cancel_counter(&self) -> Arc<AtomicUsize> {
        self.cancels.clone()
    }
}

/// Observer whose `next` sink appends every update to the returned vector.
pub fn recording_observer<T: Clone + Send + 'static>() -> (PartialObserver<T>, Arc<Mutex<Vec<T>>>)
{
    let updates = Arc::new(Mutex::new(Vec::new()));
    let captured = updates.clone();
    let observer = PartialObserver::new().with_next(move |value: &T| {
        captured.lock().unwrap().push(value.clone());
    });
    (observer, updates)
}
