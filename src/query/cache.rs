use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::subscription::{ResourceKey, SubscriptionError};

/// Storage seam of the reactive query library the hooks write into.
///
/// Hooks only ever push whole values; invalidation, garbage collection and refetch policies
/// belong to the implementor.
pub trait QueryCache<T>: Send + Sync {
    fn set_query_data(&self, key: &ResourceKey, value: T);

    fn get_query_data(&self, key: &ResourceKey) -> Option<T>;

    fn remove_query_data(&self, key: &ResourceKey) -> Option<T>;
}

/// State a hook reports to its caller.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Data(T),
    Error(SubscriptionError),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_data(&self) -> bool {
        matches!(self, QueryState::Data(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SubscriptionError> {
        match self {
            QueryState::Error(error) => Some(error),
            _ => None,
        }
    }
}

struct CachedQuery<T> {
    value: T,
    writes: u64,
}

/// Thread-safe in-memory [`QueryCache`].
pub struct MemoryQueryCache<T> {
    entries: Mutex<HashMap<ResourceKey, CachedQuery<T>>>,
}

impl<T> MemoryQueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of times `key` has been written since it was last removed.
    pub fn write_count(&self, key: &ResourceKey) -> u64 {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|entry| entry.writes)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for MemoryQueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MemoryQueryCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryQueryCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Clone + Send> QueryCache<T> for MemoryQueryCache<T> {
    fn set_query_data(&self, key: &ResourceKey, value: T) {
        let mut entries = self.entries.lock().unwrap();
        let writes = entries.get(key).map(|entry| entry.writes).unwrap_or(0) + 1;
        entries.insert(key.clone(), CachedQuery { value, writes });
    }

    fn get_query_data(&self, key: &ResourceKey) -> Option<T> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|entry| entry.value.clone())
    }

    fn remove_query_data(&self, key: &ResourceKey) -> Option<T> {
        self.entries
            .lock()
            .unwrap()
            .remove(key)
            .map(|entry| entry.value)
    }
}
