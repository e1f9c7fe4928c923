//! # Auth hooks
//!
//! Exposes the signed-in user as a query. Implement [`AuthStateSource`] over the SDK's
//! `on_auth_state_changed`, then call [`use_auth_user`] from as many places as needed; only one
//! SDK listener is registered per app.

mod api;
mod listeners;

#[doc(inline)]
pub use api::{use_auth_user, AuthStateSource};

#[doc(inline)]
pub use listeners::AuthStateListeners;
