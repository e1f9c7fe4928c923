use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::snapshot::parse_snapshot;
use crate::query::{use_query, QueryCache, QueryHandle, SubscribeOptions};
use crate::subscription::{
    Emitter, ResourceKey, SubscriptionBridge, SubscriptionError, SubscriptionResult,
};
use crate::util::{PartialObserver, Unsubscribe};

const SNAPSHOT_HOOK: &str = "use_database_snapshot";
const VALUE_HOOK: &str = "use_database_value";

/// Capability over a realtime-database reference or query.
///
/// Implementations wrap the SDK: `get` performs a single read and `on_value` registers a
/// value listener that reports the whole node on every change. Listener errors must be
/// mapped to a [`SubscriptionError`](crate::subscription::SubscriptionError) and sent to the
/// observer's `error` sink.
#[async_trait]
pub trait RealtimeSource: Send + Sync {
    /// Path of the node, used to derive the subscription key.
    fn path(&self) -> String;

    async fn get(&self) -> SubscriptionResult<Value>;

    fn on_value(&self, observer: PartialObserver<Value>) -> Unsubscribe;
}

/// Options for [`use_database_value`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatabaseValueOptions {
    pub subscribe: bool,
    /// Turn nodes with children into arrays ordered by key.
    pub to_array: bool,
}

impl From<DatabaseValueOptions> for SubscribeOptions {
    fn from(options: DatabaseValueOptions) -> Self {
        SubscribeOptions {
            subscribe: options.subscribe,
        }
    }
}

/// Reads the raw node at `source`, priority metadata included.
pub fn use_database_snapshot<C, S>(
    cache: Arc<C>,
    bridge: &SubscriptionBridge<Value>,
    query_key: ResourceKey,
    source: Arc<S>,
    options: SubscribeOptions,
) -> SubscriptionResult<QueryHandle<Value>>
where
    C: QueryCache<Value> + 'static,
    S: RealtimeSource + 'static,
{
    let subscription_key = ResourceKey::from_key(&(SNAPSHOT_HOOK, source.path()))?;
    let stream_source = source.clone();

    Ok(use_query(
        cache,
        bridge,
        query_key,
        subscription_key,
        options,
        move || async move { source.get().await },
        move |emitter: Emitter<Value>| {
            listen(stream_source.as_ref(), emitter, |value| value.clone())
        },
    ))
}

/// Reads the node at `source` flattened with [`parse_snapshot`].
pub fn use_database_value<C, S>(
    cache: Arc<C>,
    bridge: &SubscriptionBridge<Value>,
    query_key: ResourceKey,
    source: Arc<S>,
    options: DatabaseValueOptions,
) -> SubscriptionResult<QueryHandle<Value>>
where
    C: QueryCache<Value> + 'static,
    S: RealtimeSource + 'static,
{
    let to_array = options.to_array;
    let subscription_key = ResourceKey::from_key(&(VALUE_HOOK, source.path(), to_array))?;
    let stream_source = source.clone();

    Ok(use_query(
        cache,
        bridge,
        query_key,
        subscription_key,
        options.into(),
        move || async move {
            let value = source.get().await?;
            Ok::<_, SubscriptionError>(parse_snapshot(&value, to_array))
        },
        move |emitter: Emitter<Value>| {
            listen(stream_source.as_ref(), emitter, move |value| {
                parse_snapshot(value, to_array)
            })
        },
    ))
}

fn listen<S, F>(source: &S, emitter: Emitter<Value>, transform: F) -> Unsubscribe
where
    S: RealtimeSource + ?Sized,
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    let errors = emitter.clone();
    let observer = PartialObserver::new()
        .with_next(move |value: &Value| emitter.emit(transform(value)))
        .with_error(move |err| errors.fail(err.clone()));
    source.on_value(observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MemoryQueryCache, QueryState};
    use crate::subscription::error::{stream_failed, SubscriptionErrorCode};
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory node that notifies value listeners synchronously, including once on
    /// registration.
    struct MemoryNode {
        path: String,
        value: Mutex<Value>,
        listeners: Arc<Mutex<Vec<(usize, PartialObserver<Value>)>>>,
        registrations: AtomicUsize,
    }

    impl MemoryNode {
        fn new(path: &str, value: Value) -> Arc<Self> {
            Arc::new(Self {
                path: path.to_string(),
                value: Mutex::new(value),
                listeners: Arc::new(Mutex::new(Vec::new())),
                registrations: AtomicUsize::new(0),
            })
        }

        fn set(&self, value: Value) {
            *self.value.lock().unwrap() = value.clone();
            let listeners: Vec<PartialObserver<Value>> = self
                .listeners
                .lock()
                .unwrap()
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect();
            for observer in listeners {
                observer.notify_next(&value);
            }
        }

        fn break_listeners(&self, error: SubscriptionError) {
            let listeners: Vec<PartialObserver<Value>> = self
                .listeners
                .lock()
                .unwrap()
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect();
            for observer in listeners {
                observer.notify_error(&error);
            }
        }

        fn listener_count(&self) -> usize {
            self.listeners.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RealtimeSource for MemoryNode {
        fn path(&self) -> String {
            self.path.clone()
        }

        async fn get(&self) -> SubscriptionResult<Value> {
            Ok(self.value.lock().unwrap().clone())
        }

        fn on_value(&self, observer: PartialObserver<Value>) -> Unsubscribe {
            let id = self.registrations.fetch_add(1, Ordering::SeqCst);
            self.listeners.lock().unwrap().push((id, observer.clone()));
            let current = self.value.lock().unwrap().clone();
            observer.notify_next(&current);

            let listeners = self.listeners.clone();
            Box::new(move || {
                listeners
                    .lock()
                    .unwrap()
                    .retain(|(listener, _)| *listener != id);
            })
        }
    }

    fn todos() -> Value {
        json!({
            "b": { "title": "write docs", ".priority": 2 },
            "a": { "title": "ship", ".priority": 1 }
        })
    }

    #[test]
    fn one_shot_value_is_flattened() {
        let cache = Arc::new(MemoryQueryCache::new());
        let bridge = SubscriptionBridge::new();
        let node = MemoryNode::new("todos", todos());

        let mut handle = use_database_value(
            cache,
            &bridge,
            ResourceKey::from("todos"),
            node.clone(),
            DatabaseValueOptions {
                subscribe: false,
                to_array: true,
            },
        )
        .unwrap();

        assert_eq!(
            block_on(handle.resolve()),
            QueryState::Data(json!([["ship"], ["write docs"]]))
        );
        assert_eq!(node.listener_count(), 0);
    }

    #[test]
    fn snapshot_keeps_raw_node() {
        let cache = Arc::new(MemoryQueryCache::new());
        let bridge = SubscriptionBridge::new();
        let node = MemoryNode::new("todos", todos());

        let mut handle = use_database_snapshot(
            cache,
            &bridge,
            ResourceKey::from("todos-raw"),
            node,
            SubscribeOptions::subscribed(),
        )
        .unwrap();

        assert_eq!(block_on(handle.resolve()), QueryState::Data(todos()));
    }

    #[test]
    fn subscribed_value_hooks_share_one_listener() {
        let cache = Arc::new(MemoryQueryCache::new());
        let bridge = SubscriptionBridge::new();
        let node = MemoryNode::new("counters/main", json!(1));
        let options = DatabaseValueOptions {
            subscribe: true,
            to_array: false,
        };

        let mut first = use_database_value(
            cache.clone(),
            &bridge,
            ResourceKey::from("counter"),
            node.clone(),
            options,
        )
        .unwrap();
        let mut second = use_database_value(
            cache.clone(),
            &bridge,
            ResourceKey::from("counter"),
            node.clone(),
            options,
        )
        .unwrap();

        assert_eq!(node.listener_count(), 1);
        assert_eq!(block_on(first.resolve()), QueryState::Data(json!(1)));
        assert_eq!(block_on(second.resolve()), QueryState::Data(json!(1)));

        node.set(json!(2));
        assert_eq!(first.state(), QueryState::Data(json!(2)));

        first.detach();
        assert_eq!(node.listener_count(), 1);
        second.detach();
        assert_eq!(node.listener_count(), 0);
    }

    #[test]
    fn raw_and_flattened_hooks_do_not_share() {
        let cache = Arc::new(MemoryQueryCache::new());
        let bridge = SubscriptionBridge::new();
        let node = MemoryNode::new("todos", todos());

        let _raw = use_database_snapshot(
            cache.clone(),
            &bridge,
            ResourceKey::from("raw"),
            node.clone(),
            SubscribeOptions::subscribed(),
        )
        .unwrap();
        let _flat = use_database_value(
            cache,
            &bridge,
            ResourceKey::from("flat"),
            node.clone(),
            DatabaseValueOptions {
                subscribe: true,
                to_array: true,
            },
        )
        .unwrap();

        assert_eq!(node.listener_count(), 2);
        assert_eq!(bridge.active_subscriptions(), 2);
    }

    #[test]
    fn listener_error_after_first_value_marks_state() {
        let cache = Arc::new(MemoryQueryCache::new());
        let bridge = SubscriptionBridge::new();
        let node = MemoryNode::new("counters/main", json!(1));

        let mut handle = use_database_value(
            cache,
            &bridge,
            ResourceKey::from("counter"),
            node.clone(),
            DatabaseValueOptions {
                subscribe: true,
                to_array: false,
            },
        )
        .unwrap();
        block_on(handle.resolve());

        node.break_listeners(stream_failed("permission denied"));
        assert_eq!(
            handle.state().error().map(|err| err.code.clone()),
            Some(SubscriptionErrorCode::StreamFailed)
        );
    }
}
