//! # Subscription bridge
//!
//! Deduplicates live SDK listeners across every hook instance that observes the same
//! resource. The bridge keeps one entry per [`ResourceKey`]: the cancel handle of the
//! underlying listener, the attached observers, the number of events seen and the last value
//! delivered.
//!
//! ## Lifecycle
//!
//! - The first [`SubscriptionBridge::observe`] for a key starts the stream.
//! - The stream's first event resolves every observer still waiting on it.
//! - Later events refresh the cached value and are pushed to each observer's `next` sink.
//! - Observers joining after the first event resolve immediately from the cached value.
//! - An error before the first event rejects every waiter and tears the entry down; the next
//!   observer gets a brand-new stream.
//! - Awaiting an [`Observation`] yields the first value and the observer's
//!   [`ObserverRegistration`]; dropping or detaching the last registration cancels the stream.
//!
//! No retries or timeouts happen here. Wrap the returned future if you need either.
//!
//! ## Example
//!
//! ```
//! use firebase_query_hooks::subscription::{ResourceKey, SubscriptionBridge};
//! use firebase_query_hooks::util::{PartialObserver, Unsubscribe};
//! use futures::executor::block_on;
//!
//! let bridge = SubscriptionBridge::<String>::new();
//! let key = ResourceKey::from("users/42");
//!
//! let observation = bridge.observe(
//!     key.clone(),
//!     |emitter| {
//!         // A real starter registers an SDK listener that calls `emitter.emit`.
//!         emitter.emit("Alice".to_string());
//!         Box::new(|| {}) as Unsubscribe
//!     },
//!     PartialObserver::new(),
//! );
//!
//! assert_eq!(bridge.observer_count(&key), 1);
//! let (first, registration) = block_on(observation).unwrap();
//! assert_eq!(first, "Alice");
//!
//! // Later events keep flowing until the registration goes away.
//! assert!(bridge.is_active(&key));
//! registration.detach();
//! assert!(!bridge.is_active(&key));
//! ```

mod bridge;
mod completer;
pub mod error;
mod key;

#[doc(inline)]
pub use bridge::{Emitter, Observation, ObserverId, ObserverRegistration, SubscriptionBridge};

#[doc(inline)]
pub use completer::{Completer, Completion};

#[doc(inline)]
pub use error::{SubscriptionError, SubscriptionErrorCode, SubscriptionResult};

#[doc(inline)]
pub use key::ResourceKey;
