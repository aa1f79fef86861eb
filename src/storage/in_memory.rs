use super::ensure_valid_id;
use super::traits::ItemRepository;
use crate::domain::{Item, ItemMap};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory item storage for development/testing. Contents live as long as
/// the process does.
pub struct InMemoryItemRepository {
    items: Mutex<HashMap<i64, Item>>,
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<i64, Item>>> {
        self.items
            .lock()
            .map_err(|_| InventoryError::database("in-memory item store lock poisoned"))
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn save(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        let mut items = self.lock()?;
        if items.contains_key(&item.id) {
            return Err(InventoryError::DuplicateKey(item.id));
        }
        items.insert(item.id, item.clone());

        debug!("Saved item {} ({})", item.id, item.code);
        Ok(())
    }

    async fn list(&self) -> Result<ItemMap> {
        let items = self.lock()?;
        Ok(items.clone())
    }

    async fn update(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        let mut items = self.lock()?;
        let stored = items
            .get_mut(&item.id)
            .ok_or(InventoryError::NotFound(item.id))?;

        let created_at = stored.created_at;
        *stored = item.clone();
        stored.created_at = created_at;

        debug!("Updated item {}", item.id);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        ensure_valid_id(id)?;

        let mut items = self.lock()?;
        if items.remove(&id).is_none() {
            return Err(InventoryError::NotFound(id));
        }

        debug!("Deleted item {}", id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_rejects_zero_id() {
        let repo = InMemoryItemRepository::new();
        let item = Item::new(0, "ZERO", "Nothing", 1.0);

        assert_eq!(repo.save(&item).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(repo.update(&item).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(repo.delete(0).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_save_keeps_first_item() {
        let repo = InMemoryItemRepository::new();
        repo.save(&Item::new(1, "ABC", "First", 10.0)).await.unwrap();

        let err = repo.save(&Item::new(1, "XYZ", "Second", 99.0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        let items = repo.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[&1].code, "ABC");
    }

    #[tokio::test]
    async fn test_update_preserves_created_at() {
        let repo = InMemoryItemRepository::new();
        let mut item = Item::new(5, "ABC", "Widget", 10.0);
        item.created_at = Utc::now() - Duration::hours(1);
        item.updated_at = item.created_at;
        repo.save(&item).await.unwrap();

        let mut changed = Item::new(5, "ABC", "Widget", 12.0);
        changed.updated_at = Utc::now();
        repo.update(&changed).await.unwrap();

        let stored = &repo.list().await.unwrap()[&5];
        assert_eq!(stored.price, 12.0);
        assert_eq!(stored.created_at, item.created_at);
        assert_eq!(stored.updated_at, changed.updated_at);
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let repo = InMemoryItemRepository::new();

        let err = repo.update(&Item::new(9, "A", "B", 1.0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(repo.delete(9).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
