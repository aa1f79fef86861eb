pub mod in_memory;
#[cfg(feature = "db")]
pub mod turso;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryItemRepository;
pub use sqlite::{SqliteClient, SqliteItemRepository};
pub use traits::ItemRepository;

use crate::error::{InventoryError, Result};

/// Shared precondition for every backend: id 0 is never a valid key.
pub(crate) fn ensure_valid_id(id: i64) -> Result<()> {
    if id == 0 {
        return Err(InventoryError::InvalidArgument(
            "item id must not be 0".to_string(),
        ));
    }
    Ok(())
}

/// Schema shared by the SQL backends.
pub(crate) const ITEMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id          INTEGER PRIMARY KEY,
    code        TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    price       REAL NOT NULL,
    stock       INTEGER NOT NULL,
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#;
