use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{ready, Context, Poll};

use crate::subscription::completer::{Completer, Completion};
use crate::subscription::error::{SubscriptionError, SubscriptionResult};
use crate::subscription::key::ResourceKey;
use crate::util::{PartialObserver, Unsubscribe};

const DEFAULT_LABEL: &str = "subscription";

/// Shares one live listener between every observer of the same [`ResourceKey`].
///
/// The first observer of a key starts the underlying stream. Each observer receives a
/// future for its first value: the first event of the stream, or the value already cached
/// when it joined late. Events after the first are pushed to every attached observer's
/// `next` sink. When the last observer detaches the stream is cancelled and the entry is
/// forgotten, so a later observer starts over with a fresh stream.
///
/// Cloning the bridge is cheap; clones share the same registry.
pub struct SubscriptionBridge<T> {
    inner: Arc<BridgeInner<T>>,
}

struct BridgeInner<T> {
    label: String,
    next_generation: AtomicU64,
    next_observer: AtomicU64,
    entries: Mutex<HashMap<ResourceKey, SubscriptionEntry<T>>>,
}

struct SubscriptionEntry<T> {
    generation: u64,
    cancel: Option<Unsubscribe>,
    observers: BTreeMap<u64, PartialObserver<T>>,
    waiters: Vec<(u64, Completer<T>)>,
    event_count: u64,
    last_value: Option<T>,
}

impl<T> SubscriptionEntry<T> {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: None,
            observers: BTreeMap::new(),
            waiters: Vec::new(),
            event_count: 0,
            last_value: None,
        }
    }
}

/// Identifies one attached observer. Returned inside every [`Observation`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId {
    key: ResourceKey,
    seq: u64,
}

impl ObserverId {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }
}

/// Handed to the stream starter; delivers events and errors into the bridge.
///
/// An emitter stays bound to the entry it was created for. Once that entry is torn down,
/// anything it delivers is dropped, even if a newer entry exists for the same key.
pub struct Emitter<T> {
    bridge: Weak<BridgeInner<T>>,
    key: ResourceKey,
    generation: u64,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            key: self.key.clone(),
            generation: self.generation,
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Emitter<T> {
    pub fn emit(&self, value: T) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.deliver(&self.key, self.generation, value);
        }
    }

    pub fn fail(&self, error: SubscriptionError) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.fail(&self.key, self.generation, error);
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }
}

/// RAII-style observer registration; dropping the handle detaches the observer.
pub struct ObserverRegistration<T: Clone + Send + 'static> {
    bridge: SubscriptionBridge<T>,
    id: ObserverId,
    attached: bool,
}

impl<T: Clone + Send + 'static> ObserverRegistration<T> {
    pub fn id(&self) -> &ObserverId {
        &self.id
    }

    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.attached) {
            self.bridge.detach(&self.id);
        }
    }

    /// Moves the attachment into a new handle, leaving this one inert.
    fn hand_off(&mut self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            id: self.id.clone(),
            attached: std::mem::take(&mut self.attached),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for ObserverRegistration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistration")
            .field("id", &self.id)
            .field("attached", &self.attached)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Drop for ObserverRegistration<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Result of [`SubscriptionBridge::observe`].
///
/// Awaiting the observation yields the observer's first value together with its
/// [`ObserverRegistration`]; the observer keeps receiving later events until that registration
/// is dropped or detached. [`Observation::into_parts`] splits the two without awaiting.
/// Dropping an observation that has not resolved yet detaches the observer.
#[must_use = "dropping an observation detaches it immediately"]
pub struct Observation<T: Clone + Send + 'static> {
    first_value: Completion<T>,
    registration: ObserverRegistration<T>,
}

impl<T: Clone + Send + 'static> Observation<T> {
    pub fn id(&self) -> &ObserverId {
        self.registration.id()
    }

    pub fn into_parts(self) -> (Completion<T>, ObserverRegistration<T>) {
        (self.first_value, self.registration)
    }
}

impl<T: Clone + Send + 'static> Future for Observation<T> {
    type Output = SubscriptionResult<(T, ObserverRegistration<T>)>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let value = ready!(Pin::new(&mut this.first_value).poll(cx))?;
        Poll::Ready(Ok((value, this.registration.hand_off())))
    }
}

impl<T> Clone for SubscriptionBridge<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for SubscriptionBridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionBridge")
            .field("label", &self.inner.label)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Default for SubscriptionBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> SubscriptionBridge<T> {
    pub fn new() -> Self {
        Self::with_label(DEFAULT_LABEL)
    }

    /// Creates a bridge whose log lines are tagged with `label`.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                label: label.into(),
                next_generation: AtomicU64::new(1),
                next_observer: AtomicU64::new(1),
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Attaches an observer to `key`, starting the underlying stream if nobody observes it yet.
    ///
    /// `start_stream` is only called when no entry exists for `key`; otherwise it is dropped
    /// without being invoked. It runs outside the registry lock and may emit (or fail)
    /// synchronously before returning its cancel handle.
    ///
    /// A late joiner resolves immediately with the value cached by the shared entry, which may
    /// be older than whatever the backend holds by now. Later events still reach it through
    /// `observer.next`.
    pub fn observe<F>(
        &self,
        key: ResourceKey,
        start_stream: F,
        observer: PartialObserver<T>,
    ) -> Observation<T>
    where
        F: FnOnce(Emitter<T>) -> Unsubscribe,
    {
        let (completer, first_value) = Completer::new();
        let seq = self.inner.next_observer.fetch_add(1, Ordering::SeqCst);

        let new_generation = {
            let mut entries = self.inner.entries.lock().unwrap();
            match entries.get_mut(&key) {
                Some(entry) => {
                    entry.observers.insert(seq, observer);
                    match &entry.last_value {
                        Some(value) => {
                            completer.complete(value.clone());
                        }
                        None => entry.waiters.push((seq, completer)),
                    }
                    log::debug!(
                        "[{}] observer {seq} joined {key} ({} attached)",
                        self.inner.label,
                        entry.observers.len()
                    );
                    None
                }
                None => {
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
                    let mut entry = SubscriptionEntry::new(generation);
                    entry.observers.insert(seq, observer);
                    entry.waiters.push((seq, completer));
                    entries.insert(key.clone(), entry);
                    Some(generation)
                }
            }
        };

        if let Some(generation) = new_generation {
            log::debug!(
                "[{}] starting stream for {key} (generation {generation})",
                self.inner.label
            );
            let emitter = Emitter {
                bridge: Arc::downgrade(&self.inner),
                key: key.clone(),
                generation,
            };
            let cancel = start_stream(emitter);
            self.inner.install_cancel(&key, generation, cancel);
        }

        Observation {
            first_value,
            registration: ObserverRegistration {
                bridge: self.clone(),
                id: ObserverId { key, seq },
                attached: true,
            },
        }
    }

    /// Detaches one observer. The last detach for a key cancels its stream.
    ///
    /// Unknown or already detached observers are ignored.
    pub fn detach(&self, id: &ObserverId) {
        let cancel = {
            let mut entries = self.inner.entries.lock().unwrap();
            let Some(entry) = entries.get_mut(&id.key) else {
                return;
            };
            if entry.observers.remove(&id.seq).is_none() {
                return;
            }
            entry.waiters.retain(|(seq, _)| *seq != id.seq);
            if !entry.observers.is_empty() {
                return;
            }
            entries.remove(&id.key).and_then(|entry| entry.cancel)
        };

        log::debug!("[{}] last observer left {}", self.inner.label, id.key);
        // A missing handle means the starter is still running; install_cancel fires it instead.
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn observer_count(&self, key: &ResourceKey) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|entry| entry.observers.len())
            .unwrap_or(0)
    }

    /// Number of events delivered to the live entry for `key`, if there is one.
    pub fn event_count(&self, key: &ResourceKey) -> Option<u64> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|entry| entry.event_count)
    }

    pub fn last_value(&self, key: &ResourceKey) -> Option<T> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(key)
            .and_then(|entry| entry.last_value.clone())
    }

    pub fn is_active(&self, key: &ResourceKey) -> bool {
        self.inner.entries.lock().unwrap().contains_key(key)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }
}

enum Delivery<T> {
    Resolve(Vec<Completer<T>>),
    Update(Vec<PartialObserver<T>>),
}

enum Failure<T> {
    TearDown(SubscriptionEntry<T>),
    Notify(Vec<PartialObserver<T>>),
}

impl<T: Clone + Send + 'static> BridgeInner<T> {
    fn install_cancel(&self, key: &ResourceKey, generation: u64, cancel: Unsubscribe) {
        let orphaned = {
            let mut entries = self.entries.lock().unwrap();
            match entries.get_mut(key) {
                Some(entry) if entry.generation == generation => {
                    entry.cancel = Some(cancel);
                    None
                }
                _ => Some(cancel),
            }
        };

        if let Some(cancel) = orphaned {
            log::debug!(
                "[{}] entry for {key} ended while its stream was starting",
                self.label
            );
            cancel();
        }
    }

    fn deliver(&self, key: &ResourceKey, generation: u64, value: T) {
        let delivery = {
            let mut entries = self.entries.lock().unwrap();
            let Some(entry) = entries.get_mut(key) else {
                log::debug!("[{}] dropping event for inactive {key}", self.label);
                return;
            };
            if entry.generation != generation {
                log::debug!("[{}] dropping event from stale stream of {key}", self.label);
                return;
            }

            entry.event_count += 1;
            entry.last_value = Some(value.clone());
            if entry.event_count == 1 {
                Delivery::Resolve(
                    std::mem::take(&mut entry.waiters)
                        .into_iter()
                        .map(|(_, completer)| completer)
                        .collect(),
                )
            } else {
                Delivery::Update(entry.observers.values().cloned().collect())
            }
        };

        match delivery {
            Delivery::Resolve(waiters) => {
                for waiter in waiters {
                    waiter.complete(value.clone());
                }
            }
            Delivery::Update(observers) => {
                for observer in observers {
                    observer.notify_next(&value);
                }
            }
        }
    }

    fn fail(&self, key: &ResourceKey, generation: u64, error: SubscriptionError) {
        let failure = {
            let mut entries = self.entries.lock().unwrap();
            let awaiting_first_event = match entries.get(key) {
                Some(entry) if entry.generation == generation => entry.event_count == 0,
                _ => return,
            };
            if awaiting_first_event {
                entries.remove(key).map(Failure::TearDown)
            } else {
                entries
                    .get(key)
                    .map(|entry| Failure::Notify(entry.observers.values().cloned().collect()))
            }
        };

        match failure {
            Some(Failure::TearDown(entry)) => {
                log::warn!(
                    "[{}] stream for {key} failed before its first event: {error}",
                    self.label
                );
                for (_, waiter) in entry.waiters {
                    waiter.reject(error.clone());
                }
                if let Some(cancel) = entry.cancel {
                    cancel();
                }
            }
            Some(Failure::Notify(observers)) => {
                log::warn!("[{}] stream for {key} reported an error: {error}", self.label);
                for observer in observers {
                    observer.notify_error(&error);
                }
            }
            None => {}
        }
    }
}
