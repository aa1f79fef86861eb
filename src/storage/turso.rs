use super::traits::ItemRepository;
use super::{ensure_valid_id, ITEMS_SCHEMA};
use crate::domain::{Item, ItemMap};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database, Row};
use tracing::{debug, info};

/// SQLITE_CONSTRAINT primary result code.
const SQLITE_CONSTRAINT: i32 = 19;

/// Connection to a Turso/libSQL database holding the `items` table.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Connect to a remote Turso database
    pub async fn connect_remote(url: &str, auth_token: &str) -> Result<Self> {
        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| InventoryError::database(format!("Failed to connect to database: {e}")))?;
        Self::from_database(db).await
    }

    /// Open a local libSQL database file (or `:memory:`)
    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| InventoryError::database(format!("Failed to open database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(|e| {
            InventoryError::database(format!("Failed to get database connection: {e}"))
        })?;

        conn.execute_batch(ITEMS_SCHEMA)
            .await
            .map_err(|e| InventoryError::database(format!("Failed to create items table: {e}")))?;

        Ok(Self { _db: db, conn })
    }

    pub fn close(self) {
        drop(self);
        info!("Turso item store closed");
    }
}

/// Item storage on libSQL. Same contract as the SQLite backend.
pub struct TursoItemRepository {
    conn: Connection,
}

impl TursoItemRepository {
    pub fn new(client: &TursoClient) -> Self {
        Self {
            conn: client.conn.clone(),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| InventoryError::database(format!("Invalid stored timestamp: {e}")))
}

fn is_constraint_violation(err: &libsql::Error) -> bool {
    match err {
        libsql::Error::SqliteFailure(code, _) => code & 0xff == SQLITE_CONSTRAINT,
        other => other.to_string().contains("constraint failed"),
    }
}

fn row_to_item(row: &Row) -> Result<Item> {
    let column = |name: &str, e: libsql::Error| {
        InventoryError::database(format!("Failed to get {name}: {e}"))
    };

    let created_at: String = row.get(7).map_err(|e| column("created_at", e))?;
    let updated_at: String = row.get(8).map_err(|e| column("updated_at", e))?;

    Ok(Item {
        id: row.get(0).map_err(|e| column("id", e))?,
        code: row.get(1).map_err(|e| column("code", e))?,
        title: row.get(2).map_err(|e| column("title", e))?,
        description: row.get(3).map_err(|e| column("description", e))?,
        price: row.get(4).map_err(|e| column("price", e))?,
        stock: row.get(5).map_err(|e| column("stock", e))?,
        status: row.get(6).map_err(|e| column("status", e))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl ItemRepository for TursoItemRepository {
    async fn save(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        self.conn
            .execute(
                "INSERT INTO items (id, code, title, description, price, stock, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    item.id,
                    item.code.clone(),
                    item.title.clone(),
                    item.description.clone(),
                    item.price,
                    item.stock,
                    item.status.clone(),
                    format_timestamp(&item.created_at),
                    format_timestamp(&item.updated_at),
                ],
            )
            .await
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
        let mut rows = self
            .conn
            .query(
                "SELECT id, code, title, description, price, stock, status, created_at, updated_at FROM items",
                libsql::params![],
            )
            .await
            .map_err(|e| InventoryError::database(format!("Failed to query items: {e}")))?;

        let mut items = ItemMap::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| InventoryError::database(format!("Failed to read row: {e}")))?
        {
            let item = row_to_item(&row)?;
            items.insert(item.id, item);
        }
        Ok(items)
    }

    async fn update(&self, item: &Item) -> Result<()> {
        ensure_valid_id(item.id)?;

        let changed = self
            .conn
            .execute(
                "UPDATE items
                 SET code = ?1, title = ?2, description = ?3, price = ?4, stock = ?5, status = ?6, updated_at = ?7
                 WHERE id = ?8",
                libsql::params![
                    item.code.clone(),
                    item.title.clone(),
                    item.description.clone(),
                    item.price,
                    item.stock,
                    item.status.clone(),
                    format_timestamp(&item.updated_at),
                    item.id,
                ],
            )
            .await
            .map_err(|e| InventoryError::database(format!("Failed to update item: {e}")))?;

        if changed == 0 {
            return Err(InventoryError::NotFound(item.id));
        }
        debug!("Updated item {}", item.id);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        ensure_valid_id(id)?;

        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", libsql::params![id])
            .await
            .map_err(|e| InventoryError::database(format!("Failed to delete item: {e}")))?;

        if changed == 0 {
            return Err(InventoryError::NotFound(id));
        }
        debug!("Deleted item {}", id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "libsql"
    }
}
