//! # firebase-query-hooks
//!
//! Query hooks over the callback-driven APIs of the Firebase SDK.
//!
//! SDK listeners deliver values through callbacks; query caches want a future for the first
//! value and a way to push later ones. This crate sits in between:
//!
//! - [`subscription`]: the [`SubscriptionBridge`](subscription::SubscriptionBridge), which
//!   shares one SDK listener between every observer of the same resource.
//! - [`query`]: the cache seam and the generic `use_query` / `use_subscription` hooks.
//! - [`database`]: realtime-database hooks and snapshot flattening.
//! - [`auth`]: the signed-in user as a query.
//!
//! The SDK itself is not a dependency. Each hook consumes a small capability trait
//! ([`database::RealtimeSource`], [`auth::AuthStateSource`]) or plain closures that wrap the
//! SDK calls of the application.
//!
//! DISCLAIMER: This is not an official Firebase product, nor it is guaranteed that it has no
//! bugs or that it will work as intended.

pub mod auth;
pub mod database;
pub mod query;
pub mod subscription;
pub mod util;

#[cfg(test)]
pub mod test_support;
