pub mod json;
pub mod sha1;
pub mod subscribe;

pub use json::stable_stringify;
pub use sha1::sha1_hex;
pub use subscribe::{ErrorFn, NextFn, PartialObserver, Unsubscribe};
