use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product or stock-keeping unit held in the inventory.
///
/// `id` is assigned by the caller. `created_at` and `updated_at` are owned by
/// the use case layer: whatever a client sends for them is overwritten.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: i64,
    /// Internal code or SKU.
    pub code: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    /// Free-form tag, e.g. "active", "inactive", "sold_out".
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored items keyed by id, as returned from every backend's `list`.
pub type ItemMap = HashMap<i64, Item>;

impl Item {
    pub fn new(id: i64, code: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            code: code.into(),
            title: title.into(),
            price,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}
