use async_trait::async_trait;

use crate::domain::{Item, ItemMap};
use crate::error::Result;

/// Application-facing item operations. Delivery layers (HTTP handlers, CLI)
/// depend on this trait rather than on a concrete use case.
#[async_trait]
pub trait ItemUseCasePort: Send + Sync {
    /// Stamps both timestamps and stores a new item, returning what was stored.
    async fn save_item(&self, item: Item) -> Result<Item>;

    async fn list_items(&self) -> Result<ItemMap>;

    /// Refreshes `updated_at` and replaces the stored item with the same id.
    async fn update_item(&self, item: Item) -> Result<()>;

    async fn delete_item(&self, id: i64) -> Result<()>;

    /// Name of the storage backend the use case was built with.
    fn backend_name(&self) -> &'static str;
}
