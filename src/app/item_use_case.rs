use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::app::ports::ItemUseCasePort;
use crate::domain::{Item, ItemMap};
use crate::error::{InventoryError, Result};
use crate::observability::metrics::record_item_operation;
use crate::storage::ItemRepository;

/// Use case for managing inventory items over any storage backend
pub struct ItemUseCase {
    repo: Arc<dyn ItemRepository>,
}

impl ItemUseCase {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self { repo }
    }

    fn validate_id(id: i64) -> Result<()> {
        if id == 0 {
            return Err(InventoryError::InvalidArgument(
                "item id must not be 0".to_string(),
            ));
        }
        Ok(())
    }

    fn validate(item: &Item) -> Result<()> {
        Self::validate_id(item.id)?;
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(InventoryError::InvalidArgument(format!(
                "item price must be a non-negative number, got {}",
                item.price
            )));
        }
        Ok(())
    }

    async fn save(&self, mut item: Item) -> Result<Item> {
        Self::validate(&item)?;

        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;

        self.repo.save(&item).await?;
        Ok(item)
    }

    async fn update(&self, mut item: Item) -> Result<()> {
        Self::validate(&item)?;

        item.updated_at = Utc::now();

        self.repo.update(&item).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        Self::validate_id(id)?;
        self.repo.delete(id).await
    }
}

/// Adds operation context, logs and records the outcome without changing it.
fn finish<T>(operation: &'static str, context: &str, started: Instant, result: Result<T>) -> Result<T> {
    let result = result.map_err(|e| e.context(context));
    record_item_operation(operation, started, &result);
    match &result {
        Ok(_) => debug!(operation, "item operation succeeded"),
        Err(e) => warn!(operation, kind = e.kind().as_str(), error = %e, "item operation failed"),
    }
    result
}

#[async_trait]
impl ItemUseCasePort for ItemUseCase {
    async fn save_item(&self, item: Item) -> Result<Item> {
        let started = Instant::now();
        finish("save", "error saving item", started, self.save(item).await)
    }

    async fn list_items(&self) -> Result<ItemMap> {
        let started = Instant::now();
        // An empty store is a normal outcome, not NotFound.
        finish("list", "error listing items", started, self.repo.list().await)
    }

    async fn update_item(&self, item: Item) -> Result<()> {
        let started = Instant::now();
        finish("update", "error updating item", started, self.update(item).await)
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        let started = Instant::now();
        finish("delete", "error deleting item", started, self.delete(id).await)
    }

    fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Repository that counts calls and fails every one of them.
    struct CountingRepository {
        calls: AtomicUsize,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(InventoryError::database("connection refused"))
        }
    }

    #[async_trait]
    impl ItemRepository for CountingRepository {
        async fn save(&self, _item: &Item) -> Result<()> {
            self.hit()
        }

        async fn list(&self) -> Result<ItemMap> {
            self.hit().map(|_| ItemMap::new())
        }

        async fn update(&self, _item: &Item) -> Result<()> {
            self.hit()
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            self.hit()
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_zero_id_never_reaches_repository() {
        let repo = Arc::new(CountingRepository::new());
        let use_case = ItemUseCase::new(repo.clone());

        let item = Item::new(0, "ZERO", "Nothing", 1.0);
        let errors = vec![
            use_case.save_item(item.clone()).await.unwrap_err(),
            use_case.update_item(item).await.unwrap_err(),
            use_case.delete_item(0).await.unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_negative_price_is_invalid() {
        let repo = Arc::new(CountingRepository::new());
        let use_case = ItemUseCase::new(repo.clone());

        let err = use_case
            .save_item(Item::new(1, "NEG", "Refund", -1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_wrapped_not_masked() {
        let repo = Arc::new(CountingRepository::new());
        let use_case = ItemUseCase::new(repo.clone());

        let err = use_case.list_items().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().starts_with("error listing items: "));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }
}
