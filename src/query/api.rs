use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};

use crate::query::cache::{QueryCache, QueryState};
use crate::subscription::error::fetch_failed;
use crate::subscription::{
    Emitter, ObserverRegistration, ResourceKey, SubscriptionBridge, SubscriptionError,
    SubscriptionResult,
};
use crate::util::{PartialObserver, Unsubscribe};

/// Chooses between a one-shot read and a live, deduplicated subscription.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub subscribe: bool,
}

impl SubscribeOptions {
    pub fn subscribed() -> Self {
        Self { subscribe: true }
    }
}

type PendingValue<T> = BoxFuture<'static, SubscriptionResult<T>>;

/// What a hook hands back to its caller.
///
/// [`QueryHandle::resolve`] awaits the first value and stores it in the cache under the
/// query key. For subscribed queries, later values keep flowing into the cache until the
/// handle is detached or dropped.
pub struct QueryHandle<T: Clone + Send + 'static> {
    query_key: ResourceKey,
    cache: Arc<dyn QueryCache<T>>,
    pending: Option<PendingValue<T>>,
    registration: Option<ObserverRegistration<T>>,
    error: Arc<Mutex<Option<SubscriptionError>>>,
    refreshed: Arc<AtomicBool>,
}

impl<T: Clone + Send + 'static> fmt::Debug for QueryHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle")
            .field("query_key", &self.query_key)
            .field("pending", &self.pending.is_some())
            .field("subscribed", &self.registration.is_some())
            .finish()
    }
}

impl<T: Clone + Send + 'static> QueryHandle<T> {
    pub fn query_key(&self) -> &ResourceKey {
        &self.query_key
    }

    pub fn is_subscribed(&self) -> bool {
        self.registration.is_some()
    }

    /// Awaits the first value (only once) and returns the resulting state.
    pub async fn resolve(&mut self) -> QueryState<T> {
        if let Some(pending) = self.pending.take() {
            match pending.await {
                Ok(value) => {
                    // A live update may already have replaced the first value in the cache.
                    if !self.refreshed.load(Ordering::SeqCst) {
                        self.cache.set_query_data(&self.query_key, value);
                    }
                }
                Err(error) => {
                    *self.error.lock().unwrap() = Some(error);
                }
            }
        }
        self.state()
    }

    pub fn state(&self) -> QueryState<T> {
        if let Some(error) = self.error.lock().unwrap().clone() {
            return QueryState::Error(error);
        }
        match self.cache.get_query_data(&self.query_key) {
            Some(value) => QueryState::Data(value),
            None => QueryState::Loading,
        }
    }

    /// Stops receiving live updates. Cached data is left in place.
    pub fn detach(self) {
        if let Some(registration) = self.registration {
            registration.detach();
        }
    }
}

/// Runs a query either as a one-shot `fetch` or as a deduplicated subscription.
///
/// Only one of `fetch` and `start_stream` is ever called, depending on `options.subscribe`.
/// `query_key` names the cache slot; `subscription_key` decides which hooks share a listener.
pub fn use_query<T, C, Fetch, Fut, E, S>(
    cache: Arc<C>,
    bridge: &SubscriptionBridge<T>,
    query_key: ResourceKey,
    subscription_key: ResourceKey,
    options: SubscribeOptions,
    fetch: Fetch,
    start_stream: S,
) -> QueryHandle<T>
where
    T: Clone + Send + 'static,
    C: QueryCache<T> + 'static,
    Fetch: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Error + 'static,
    S: FnOnce(Emitter<T>) -> Unsubscribe,
{
    if options.subscribe {
        return use_subscription(cache, bridge, query_key, subscription_key, start_stream);
    }

    let cache: Arc<dyn QueryCache<T>> = cache;
    let pending = fetch().map(|result| result.map_err(into_fetch_error)).boxed();
    QueryHandle {
        query_key,
        cache,
        pending: Some(pending),
        registration: None,
        error: Arc::new(Mutex::new(None)),
        refreshed: Arc::new(AtomicBool::new(false)),
    }
}

/// Attaches to the shared subscription for `subscription_key` and mirrors its values into
/// `cache` under `query_key`.
pub fn use_subscription<T, C, S>(
    cache: Arc<C>,
    bridge: &SubscriptionBridge<T>,
    query_key: ResourceKey,
    subscription_key: ResourceKey,
    start_stream: S,
) -> QueryHandle<T>
where
    T: Clone + Send + 'static,
    C: QueryCache<T> + 'static,
    S: FnOnce(Emitter<T>) -> Unsubscribe,
{
    let cache: Arc<dyn QueryCache<T>> = cache;
    let error = Arc::new(Mutex::new(None));
    let refreshed = Arc::new(AtomicBool::new(false));

    let observer = {
        let update_cache = cache.clone();
        let update_key = query_key.clone();
        let update_error = error.clone();
        let update_refreshed = refreshed.clone();
        let error_slot = error.clone();
        PartialObserver::new()
            .with_next(move |value: &T| {
                update_refreshed.store(true, Ordering::SeqCst);
                update_error.lock().unwrap().take();
                update_cache.set_query_data(&update_key, value.clone());
            })
            .with_error(move |err: &SubscriptionError| {
                *error_slot.lock().unwrap() = Some(err.clone());
            })
    };

    let observation = bridge.observe(subscription_key, start_stream, observer);
    let (first_value, registration) = observation.into_parts();

    QueryHandle {
        query_key,
        cache,
        pending: Some(first_value.boxed()),
        registration: Some(registration),
        error,
        refreshed,
    }
}

fn into_fetch_error<E: Error + 'static>(err: E) -> SubscriptionError {
    match (&err as &(dyn Error + 'static)).downcast_ref::<SubscriptionError>() {
        Some(error) => error.clone(),
        None => fetch_failed(err.to_string()),
    }
}
