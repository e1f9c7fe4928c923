//! # Query hooks
//!
//! Glue between SDK reads and a query cache. A hook is built from two capabilities: a
//! one-shot `fetch` and a `start_stream` that opens a live listener. [`SubscribeOptions`]
//! picks which one runs.
//!
//! Subscribed hooks go through a [`SubscriptionBridge`](crate::subscription::SubscriptionBridge),
//! so hooks sharing a subscription key share a single SDK listener while each writes into its
//! own query key.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use firebase_query_hooks::query::{use_subscription, MemoryQueryCache, QueryState};
//! use firebase_query_hooks::subscription::{ResourceKey, SubscriptionBridge};
//! use firebase_query_hooks::util::Unsubscribe;
//! use futures::executor::block_on;
//!
//! let cache = Arc::new(MemoryQueryCache::new());
//! let bridge = SubscriptionBridge::new();
//! let key = ResourceKey::from("settings/theme");
//!
//! let mut handle = use_subscription(cache.clone(), &bridge, key.clone(), key, |emitter| {
//!     emitter.emit("dark".to_string());
//!     Box::new(|| {}) as Unsubscribe
//! });
//!
//! assert_eq!(block_on(handle.resolve()), QueryState::Data("dark".to_string()));
//! handle.detach();
//! ```

mod api;
mod cache;

#[doc(inline)]
pub use api::{use_query, use_subscription, QueryHandle, SubscribeOptions};

#[doc(inline)]
pub use cache::{MemoryQueryCache, QueryCache, QueryState};
