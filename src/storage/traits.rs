use crate::domain::{Item, ItemMap};
use crate::error::Result;
use async_trait::async_trait;

/// Storage port for items. Every backend classifies its own failures:
/// `InvalidArgument` for id 0, `DuplicateKey` on save collisions and
/// `NotFound` when update/delete miss.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn save(&self, item: &Item) -> Result<()>;

    /// All stored items keyed by id. An empty store yields an empty map.
    async fn list(&self) -> Result<ItemMap>;

    async fn update(&self, item: &Item) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
