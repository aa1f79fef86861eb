use super::traits::ItemRepository;
use super::{ensure_valid_id, ITEMS_SCHEMA};
use crate::domain::{Item, ItemMap};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const SELECT_ITEMS: &str = "SELECT id, code, title, description, price, stock, status, created_at, updated_at FROM items";

/// Owns the long-lived SQLite connection. Opened once at startup and
/// released with [`SqliteClient::close`] at shutdown.
#[derive(Clone)]
pub struct SqliteClient {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteClient {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite item store at {}", path.display());
        let conn = Connection::open(path)
            .map_err(|e| InventoryError::database(format!("Failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| InventoryError::database(format!("Failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(ITEMS_SCHEMA)
            .map_err(|e| InventoryError::database(format!("Failed to create items table: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Verifies the connection still answers queries.
    pub fn ping(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| InventoryError::database(format!("Ping failed: {e}")))?;
        Ok(())
    }

    /// Closes the connection. If repositories still hold the handle, the
    /// connection is released when the last of them is dropped.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex
                    .into_inner()
                    .map_err(|_| InventoryError::database("SQLite connection lock poisoned"))?;
                conn.close().map_err(|(_, e)| {
                    InventoryError::database(format!("Failed to close database: {e}"))
                })?;
                info!("SQLite item store closed");
            }
            Err(_) => {
                warn!("SQLite connection still shared at close; deferring release");
            }
        }
        Ok(())
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| InventoryError::database("SQLite connection lock poisoned"))
    }
}

/// Item storage backed by the `items` table.
pub struct SqliteItemRepository {
    client: SqliteClient,
}

impl SqliteItemRepository {
    pub fn new(client: &SqliteClient) -> Self {
        Self {
            client: client.clone(),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        stock: row.get(5)?,
        status: row.get(6)?,
        created_at: parse_timestamp(7, row.get(7)?)?,
        updated_at: parse_timestamp(8, row.get(8)?)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

#[async_trait]
impl ItemRepository for SqliteItemRepository {
    async fn save(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO items (id, code, title, description, price, stock, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id,
                item.code,
                item.title,
                item.description,
                item.price,
                item.stock,
                item.status,
                format_timestamp(&item.created_at),
                format_timestamp(&item.updated_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                InventoryError::DuplicateKey(item.id)
            } else {
                InventoryError::database(format!("Failed to insert item: {e}"))
            }
        })?;

        debug!("Inserted item {}", item.id);
        Ok(())
    }

    async fn list(&self) -> Result<ItemMap> {
        let conn = self.client.connection()?;
        let mut stmt = conn
            .prepare(SELECT_ITEMS)
            .map_err(|e| InventoryError::database(format!("Failed to prepare item query: {e}")))?;
        let rows = stmt
            .query_map([], row_to_item)
            .map_err(|e| InventoryError::database(format!("Failed to query items: {e}")))?;

        let mut items = ItemMap::new();
        for row in rows {
            let item = row
                .map_err(|e| InventoryError::database(format!("Failed to read item row: {e}")))?;
            items.insert(item.id, item);
        }
        Ok(items)
    }

    async fn update(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE items
                 SET code = ?1, title = ?2, description = ?3, price = ?4, stock = ?5, status = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    item.code,
                    item.title,
                    item.description,
                    item.price,
                    item.stock,
                    item.status,
                    format_timestamp(&item.updated_at),
                    item.id,
                ],
            )
            .map_err(|e| InventoryError::database(format!("Failed to update item: {e}")))?;

        if changed == 0 {
            return Err(InventoryError::NotFound(item.id));
        }
        debug!("Updated item {}", item.id);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        ensure_valid_id(id)?;

        let conn = self.client.connection()?;
        let changed = conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(|e| InventoryError::database(format!("Failed to delete item: {e}")))?;

        if changed == 0 {
            return Err(InventoryError::NotFound(id));
        }
        debug!("Deleted item {}", id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
