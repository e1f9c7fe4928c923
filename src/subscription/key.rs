use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::subscription::error::{invalid_key, SubscriptionResult};
use crate::util::{sha1_hex, stable_stringify};

/// Stable identity of a subscribed resource.
///
/// Built from any serializable caller key (a path, a tuple, a struct). The key is rendered
/// with [`stable_stringify`] and hashed, so two keys compare equal exactly when their stable
/// JSON renderings match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    hash: String,
}

impl ResourceKey {
    pub fn from_key<K>(key: &K) -> SubscriptionResult<Self>
    where
        K: ?Sized + Serialize,
    {
        let canonical = stable_stringify(key)
            .map_err(|err| invalid_key(format!("Key cannot be serialized: {err}")))?;
        Ok(Self::from_canonical(&canonical))
    }

    fn from_canonical(canonical: &str) -> Self {
        Self {
            hash: sha1_hex(canonical),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        // A plain string always serializes as a JSON string literal.
        let canonical = serde_json::Value::String(key.to_owned()).to_string();
        Self::from_canonical(&canonical)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        ResourceKey::from(key.as_str())
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hash)
    }
}
