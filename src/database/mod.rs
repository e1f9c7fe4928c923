//! # Realtime Database hooks
//!
//! Hooks over the realtime tree store. A [`RealtimeSource`] wraps one SDK reference or query;
//! the hooks turn its one-shot reads and value listeners into [`QueryHandle`](crate::query::QueryHandle)s.
//!
//! - [`use_database_snapshot`] hands back the raw node, priority metadata included.
//! - [`use_database_value`] flattens the node with [`parse_snapshot`], optionally into arrays
//!   ordered by database key.
//!
//! Subscribed hooks on the same path and with the same flattening share one SDK listener.

mod api;
mod snapshot;

#[doc(inline)]
pub use api::{use_database_snapshot, use_database_value, DatabaseValueOptions, RealtimeSource};

#[doc(inline)]
pub use snapshot::{compare_keys, ordered_children, parse_snapshot};
