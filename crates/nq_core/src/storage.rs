use async_trait::async_trait;

use crate::Result;

/// String-keyed durable slot storage. Values are opaque to the store;
/// callers serialize whatever they need into them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` if the slot was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the slot for `key` wholesale. Last writer wins.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
