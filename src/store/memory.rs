use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::filter::{value_cmp, Filter, SortDirection};
use super::{prepare_insert, prepare_update, Datastore, StoreError, Table};

/// In-memory store used when no DATABASE_URL is configured, and by the test
/// suite. Behavior mirrors the Postgres store: same system columns, same
/// soft-delete filtering, all-or-nothing batch inserts.
pub struct MemStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Demo dataset served when the service runs without a database.
    pub fn seeded() -> Self {
        let mut tables: HashMap<Table, Vec<Value>> = HashMap::new();

        let mut road = json!({ "name": "Temple Road" });
        let road_id = prepare_insert(Table::Roads, &mut road).expect("seed road");
        let mut road2 = json!({ "name": "Lake Road" });
        prepare_insert(Table::Roads, &mut road2).expect("seed road");
        tables.insert(Table::Roads, vec![road, road2]);

        let mut sub_road = json!({ "name": "1st Lane", "road_id": road_id });
        let sub_road_id = prepare_insert(Table::SubRoads, &mut sub_road).expect("seed sub road");
        tables.insert(Table::SubRoads, vec![sub_road]);

        let mut address = json!({
            "address": "24/1 Temple Road",
            "road_id": road_id,
            "sub_road_id": null,
            "member": "K. Perera",
        });
        let address_id = prepare_insert(Table::Addresses, &mut address).expect("seed address");
        tables.insert(Table::Addresses, vec![address]);

        let mut lamp = json!({
            "lamp_number": "TL-001",
            "road_id": road_id,
            "sub_road_id": sub_road_id,
            "address_id": address_id,
            "status": "working",
        });
        prepare_insert(Table::RoadLamps, &mut lamp).expect("seed lamp");
        tables.insert(Table::RoadLamps, vec![lamp]);

        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for MemStore {
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r, table.soft_deletable()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((col, dir)) = filter.order_spec() {
            rows.sort_by(|a, b| {
                let ord = value_cmp(&a[col], &b[col]);
                match dir {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let offset = filter.offset_spec().unwrap_or(0) as usize;
        let rows = rows.into_iter().skip(offset);
        Ok(match filter.limit_spec() {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn count(&self, table: Table, filter: Filter) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r, table.soft_deletable()))
                    .count() as i64
            })
            .unwrap_or(0))
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value, StoreError> {
        prepare_insert(table, &mut row)?;
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn insert_batch(&self, rows: Vec<(Table, Value)>) -> Result<Vec<Value>, StoreError> {
        // Prepare everything before touching the tables so a bad payload
        // cannot leave a partial batch behind.
        let mut prepared: Vec<(Table, Value)> = Vec::with_capacity(rows.len());
        for (table, mut row) in rows {
            prepare_insert(table, &mut row)?;
            prepared.push((table, row));
        }

        let mut tables = self.tables.write().await;
        let mut stored = Vec::with_capacity(prepared.len());
        for (table, row) in prepared {
            tables.entry(table).or_default().push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update(&self, table: Table, id: Uuid, mut changes: Value) -> Result<Value, StoreError> {
        prepare_update(table, &mut changes)?;
        let changes = changes
            .as_object()
            .cloned()
            .ok_or_else(|| StoreError::Query("update payload must be a JSON object".to_string()))?;

        let id_str = id.to_string();
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id_str.as_str()))
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", table.singular(), id)))?;

        let obj = row.as_object_mut().expect("stored rows are objects");
        for (key, value) in changes {
            obj.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
