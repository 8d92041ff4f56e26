pub mod filter;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

pub use filter::{Bind, Filter};
pub use memory::MemStore;
pub use postgres::PgStore;

/// Tables owned by this service. The registry is closed: handlers never
/// reach tables that are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Roads,
    SubRoads,
    SubSubRoads,
    Addresses,
    Households,
    Members,
    Businesses,
    RoadLamps,
    ActivityLogs,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Roads => "roads",
            Table::SubRoads => "sub_roads",
            Table::SubSubRoads => "sub_sub_roads",
            Table::Addresses => "addresses",
            Table::Households => "households",
            Table::Members => "members",
            Table::Businesses => "businesses",
            Table::RoadLamps => "road_lamps",
            Table::ActivityLogs => "activity_logs",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Table::Roads => "Road",
            Table::SubRoads => "Sub road",
            Table::SubSubRoads => "Development project",
            Table::Addresses => "Address",
            Table::Households => "Household",
            Table::Members => "Member",
            Table::Businesses => "Business",
            Table::RoadLamps => "Road lamp",
            Table::ActivityLogs => "Activity log entry",
        }
    }

    /// The activity log is append-only and carries no soft-delete flag.
    pub fn soft_deletable(self) -> bool {
        !matches!(self, Table::ActivityLogs)
    }

    pub fn has_updated_at(self) -> bool {
        matches!(
            self,
            Table::Households | Table::Members | Table::Businesses | Table::RoadLamps
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The backing store, selected once at startup: a Postgres client when
/// DATABASE_URL is configured, an in-memory fixture otherwise. Rows travel
/// as JSON objects keyed by column name in both directions.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, table: Table, filter: Filter) -> Result<i64, StoreError>;

    /// Insert a row, assigning id / created_at / soft-delete defaults.
    /// Returns the stored row.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError>;

    /// Insert several rows atomically: either every row lands or none does.
    async fn insert_batch(&self, rows: Vec<(Table, Value)>) -> Result<Vec<Value>, StoreError>;

    /// Apply a partial column update to the row with the given id, returning
    /// the updated row. The id lookup ignores the soft-delete flag so that
    /// the flag itself can be set through this path.
    async fn update(&self, table: Table, id: Uuid, changes: Value) -> Result<Value, StoreError>;

    async fn health(&self) -> Result<(), StoreError>;

    async fn select_one(&self, table: Table, filter: Filter) -> Result<Option<Value>, StoreError> {
        let rows = self.select(table, filter.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn exists(&self, table: Table, filter: Filter) -> Result<bool, StoreError> {
        Ok(self.count(table, filter).await? > 0)
    }
}

pub type SharedStore = Arc<dyn Datastore>;

/// Fill in the system columns of a new row. Shared by both store
/// implementations so their observable behavior stays identical.
pub(crate) fn prepare_insert(table: Table, row: &mut Value) -> Result<Uuid, StoreError> {
    let obj = row
        .as_object_mut()
        .ok_or_else(|| StoreError::Query("insert payload must be a JSON object".to_string()))?;

    // Handlers may pre-assign an id to wire up rows inside one batch
    // (household + members); anything else gets a fresh one.
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Uuid::new_v4);
    let now = json!(Utc::now());

    obj.insert("id".to_string(), json!(id));
    obj.insert("created_at".to_string(), now.clone());
    if table.soft_deletable() {
        obj.insert("is_deleted".to_string(), json!(false));
    }
    if table.has_updated_at() {
        obj.insert("updated_at".to_string(), now);
    }
    Ok(id)
}

/// Stamp updated_at on a partial update where the table tracks it.
pub(crate) fn prepare_update(table: Table, changes: &mut Value) -> Result<(), StoreError> {
    let obj = changes
        .as_object_mut()
        .ok_or_else(|| StoreError::Query("update payload must be a JSON object".to_string()))?;

    if obj.contains_key("id") || obj.contains_key("created_at") {
        return Err(StoreError::Query(
            "id and created_at are immutable".to_string(),
        ));
    }
    if table.has_updated_at() {
        obj.insert("updated_at".to_string(), json!(Utc::now()));
    }
    Ok(())
}

/// Select the store implementation for this process. Missing database
/// configuration degrades to the seeded in-memory fixture rather than
/// failing, so the service stays usable for demos and local UI work.
pub async fn connect_from_env() -> anyhow::Result<SharedStore> {
    let db = &crate::config::config().database;
    match &db.url {
        Some(url) => {
            let store = PgStore::connect(url, db.max_connections).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; serving from the in-memory fixture store");
            Ok(Arc::new(MemStore::seeded()))
        }
    }
}
