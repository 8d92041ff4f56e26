use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use super::filter::{Bind, Filter};
use super::{prepare_insert, prepare_update, Datastore, StoreError, Table};

/// Postgres-backed store. All SQL is generated at runtime from the closed
/// table/column registry below; identifiers never come from request input.
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColKind {
    Uuid,
    Text,
    Int,
    Float,
    Bool,
    Timestamp,
    TextArray,
    Json,
}

type ColSpec = (&'static str, ColKind);

fn columns(table: Table) -> &'static [ColSpec] {
    use ColKind::*;
    match table {
        Table::Roads => &[
            ("id", Uuid),
            ("name", Text),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
        ],
        Table::SubRoads => &[
            ("id", Uuid),
            ("name", Text),
            ("road_id", Uuid),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
        ],
        Table::SubSubRoads => &[
            ("id", Uuid),
            ("name", Text),
            ("road_id", Uuid),
            ("parent_sub_road_id", Uuid),
            ("width", Float),
            ("height", Float),
            ("square_feet", Float),
            ("cost_per_sq_ft", Float),
            ("total_cost", Float),
            ("development_status", Text),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
        ],
        Table::Addresses => &[
            ("id", Uuid),
            ("address", Text),
            ("road_id", Uuid),
            ("sub_road_id", Uuid),
            ("member", Text),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
        ],
        Table::Households => &[
            ("id", Uuid),
            ("address_id", Uuid),
            ("assessment_number", Text),
            ("resident_type", Text),
            ("waste_disposal", Text),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
            ("updated_at", Timestamp),
        ],
        Table::Members => &[
            ("id", Uuid),
            ("household_id", Uuid),
            ("full_name", Text),
            ("name_with_initial", Text),
            ("member_type", Text),
            ("nic", Text),
            ("gender", Text),
            ("age", Int),
            ("occupation", Text),
            ("school_name", Text),
            ("grade", Text),
            ("university_name", Text),
            ("other_occupation", Text),
            ("offers_receiving", TextArray),
            ("is_disabled", Bool),
            ("land_house_status", Text),
            ("whatsapp_number", Text),
            ("is_drug_user", Bool),
            ("is_thief", Bool),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
            ("updated_at", Timestamp),
        ],
        Table::Businesses => &[
            ("id", Uuid),
            ("business_name", Text),
            ("business_owner", Text),
            ("business_type", Text),
            ("business_address", Text),
            ("business_phone", Text),
            ("road_id", Uuid),
            ("sub_road_id", Uuid),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
            ("updated_at", Timestamp),
        ],
        Table::RoadLamps => &[
            ("id", Uuid),
            ("lamp_number", Text),
            ("road_id", Uuid),
            ("sub_road_id", Uuid),
            ("address_id", Uuid),
            ("status", Text),
            ("is_deleted", Bool),
            ("created_at", Timestamp),
            ("updated_at", Timestamp),
        ],
        Table::ActivityLogs => &[
            ("id", Uuid),
            ("username", Text),
            ("action_type", Text),
            ("resource_type", Text),
            ("resource_id", Text),
            ("description", Text),
            ("ip_address", Text),
            ("user_agent", Text),
            ("metadata", Json),
            ("created_at", Timestamp),
        ],
    }
}

fn col_kind(table: Table, column: &str) -> Option<ColKind> {
    columns(table)
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, kind)| *kind)
}

/// A typed, nullable bind parameter. Nulls must carry the column type so
/// Postgres does not reject the parameter on type inference.
enum SqlParam {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Option<Vec<String>>),
    Json(Option<Value>),
}

impl SqlParam {
    fn from_value(kind: ColKind, value: &Value) -> Result<Self, StoreError> {
        let mismatch = |expected: &str| {
            StoreError::Query(format!("expected {} value, got {}", expected, value))
        };

        if value.is_null() {
            return Ok(match kind {
                ColKind::Uuid => SqlParam::Uuid(None),
                ColKind::Text => SqlParam::Text(None),
                ColKind::Int => SqlParam::Int(None),
                ColKind::Float => SqlParam::Float(None),
                ColKind::Bool => SqlParam::Bool(None),
                ColKind::Timestamp => SqlParam::Timestamp(None),
                ColKind::TextArray => SqlParam::TextArray(None),
                ColKind::Json => SqlParam::Json(None),
            });
        }

        Ok(match kind {
            ColKind::Uuid => SqlParam::Uuid(Some(
                value
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| mismatch("uuid"))?,
            )),
            ColKind::Text => {
                SqlParam::Text(Some(value.as_str().ok_or_else(|| mismatch("text"))?.to_string()))
            }
            ColKind::Int => SqlParam::Int(Some(value.as_i64().ok_or_else(|| mismatch("integer"))?)),
            ColKind::Float => {
                SqlParam::Float(Some(value.as_f64().ok_or_else(|| mismatch("float"))?))
            }
            ColKind::Bool => SqlParam::Bool(Some(value.as_bool().ok_or_else(|| mismatch("bool"))?)),
            ColKind::Timestamp => SqlParam::Timestamp(Some(
                value
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or_else(|| mismatch("timestamp"))?,
            )),
            ColKind::TextArray => {
                let items = value.as_array().ok_or_else(|| mismatch("text array"))?;
                let strings = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| mismatch("text array"))?;
                SqlParam::TextArray(Some(strings))
            }
            ColKind::Json => SqlParam::Json(Some(value.clone())),
        })
    }

    fn from_bind(bind: Bind) -> Self {
        match bind {
            Bind::Uuid(v) => SqlParam::Uuid(Some(v)),
            Bind::Text(v) => SqlParam::Text(Some(v)),
            Bind::Int(v) => SqlParam::Int(Some(v)),
            Bind::Float(v) => SqlParam::Float(Some(v)),
            Bind::Bool(v) => SqlParam::Bool(Some(v)),
            Bind::Timestamp(v) => SqlParam::Timestamp(Some(v)),
        }
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Uuid(v) => query.bind(v),
        SqlParam::Text(v) => query.bind(v),
        SqlParam::Int(v) => query.bind(v),
        SqlParam::Float(v) => query.bind(v),
        SqlParam::Bool(v) => query.bind(v),
        SqlParam::Timestamp(v) => query.bind(v),
        SqlParam::TextArray(v) => query.bind(v),
        SqlParam::Json(v) => query.bind(v),
    }
}

/// Decode a database row back into the JSON shape handlers work with.
fn row_to_value(table: Table, row: &PgRow) -> Result<Value, StoreError> {
    let mut map = Map::new();
    for (name, kind) in columns(table) {
        let value = match kind {
            ColKind::Uuid => row
                .try_get::<Option<Uuid>, _>(*name)?
                .map_or(Value::Null, |v| Value::String(v.to_string())),
            ColKind::Text => row
                .try_get::<Option<String>, _>(*name)?
                .map_or(Value::Null, Value::String),
            ColKind::Int => row
                .try_get::<Option<i64>, _>(*name)?
                .map_or(Value::Null, |v| Value::from(v)),
            ColKind::Float => row
                .try_get::<Option<f64>, _>(*name)?
                .map_or(Value::Null, |v| Value::from(v)),
            ColKind::Bool => row
                .try_get::<Option<bool>, _>(*name)?
                .map_or(Value::Null, Value::Bool),
            ColKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(*name)?
                .map_or(Value::Null, |v| serde_json::json!(v)),
            ColKind::TextArray => row
                .try_get::<Option<Vec<String>>, _>(*name)?
                .map_or(Value::Null, |v| serde_json::json!(v)),
            ColKind::Json => row
                .try_get::<Option<Value>, _>(*name)?
                .unwrap_or(Value::Null),
        };
        map.insert((*name).to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Split a row object into (columns, params) following the registry order.
fn insert_params(table: Table, row: &Value) -> Result<(Vec<&'static str>, Vec<SqlParam>), StoreError> {
    let obj = row
        .as_object()
        .ok_or_else(|| StoreError::Query("insert payload must be a JSON object".to_string()))?;

    let mut cols = Vec::new();
    let mut params = Vec::new();
    for (name, kind) in columns(table) {
        if let Some(value) = obj.get(*name) {
            cols.push(*name);
            params.push(SqlParam::from_value(*kind, value)?);
        }
    }
    if cols.is_empty() {
        return Err(StoreError::Query("no recognized columns in payload".to_string()));
    }
    Ok((cols, params))
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::info!("connected to database");
        Ok(Self { pool })
    }

    fn select_sql(table: Table, filter: &Filter) -> (String, Vec<Bind>) {
        let (where_clause, params) = filter.sql_where(table.soft_deletable());
        let suffix = filter.sql_suffix();
        let sql = [
            format!("SELECT * FROM \"{}\"", table.as_str()),
            if where_clause.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_clause)
            },
            suffix,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        (sql, params)
    }

    async fn insert_on<'e, E>(executor: E, table: Table, row: &Value) -> Result<Value, StoreError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let (cols, params) = insert_params(table, row)?;
        let col_list = cols
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=cols.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            table.as_str(),
            col_list,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for param in params {
            query = bind_param(query, param);
        }
        let row = query.fetch_one(executor).await?;
        row_to_value(table, &row)
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Value>, StoreError> {
        let (sql, params) = Self::select_sql(table, &filter);
        let mut query = sqlx::query(&sql);
        for bind in params {
            query = bind_param(query, SqlParam::from_bind(bind));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_value(table, r)).collect()
    }

    async fn count(&self, table: Table, filter: Filter) -> Result<i64, StoreError> {
        let (where_clause, params) = filter.sql_where(table.soft_deletable());
        let sql = if where_clause.is_empty() {
            format!("SELECT COUNT(*) FROM \"{}\"", table.as_str())
        } else {
            format!("SELECT COUNT(*) FROM \"{}\" WHERE {}", table.as_str(), where_clause)
        };

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in params {
            query = match SqlParam::from_bind(bind) {
                SqlParam::Uuid(v) => query.bind(v),
                SqlParam::Text(v) => query.bind(v),
                SqlParam::Int(v) => query.bind(v),
                SqlParam::Float(v) => query.bind(v),
                SqlParam::Bool(v) => query.bind(v),
                SqlParam::Timestamp(v) => query.bind(v),
                SqlParam::TextArray(v) => query.bind(v),
                SqlParam::Json(v) => query.bind(v),
            };
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value, StoreError> {
        prepare_insert(table, &mut row)?;
        Self::insert_on(&self.pool, table, &row).await
    }

    async fn insert_batch(&self, rows: Vec<(Table, Value)>) -> Result<Vec<Value>, StoreError> {
        let mut prepared = Vec::with_capacity(rows.len());
        for (table, mut row) in rows {
            prepare_insert(table, &mut row)?;
            prepared.push((table, row));
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(prepared.len());
        for (table, row) in &prepared {
            stored.push(Self::insert_on(&mut *tx, *table, row).await?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn update(&self, table: Table, id: Uuid, mut changes: Value) -> Result<Value, StoreError> {
        prepare_update(table, &mut changes)?;
        let obj = changes
            .as_object()
            .ok_or_else(|| StoreError::Query("update payload must be a JSON object".to_string()))?;

        let mut sets = Vec::new();
        let mut params = Vec::new();
        let mut idx = 1usize;
        for (key, value) in obj {
            let kind = col_kind(table, key)
                .ok_or_else(|| StoreError::Query(format!("unknown column: {}", key)))?;
            sets.push(format!("\"{}\" = ${}", key, idx));
            params.push(SqlParam::from_value(kind, value)?);
            idx += 1;
        }
        if sets.is_empty() {
            return Err(StoreError::Query("empty update payload".to_string()));
        }

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${} RETURNING *",
            table.as_str(),
            sets.join(", "),
            idx
        );

        let mut query = sqlx::query(&sql);
        for param in params {
            query = bind_param(query, param);
        }
        query = query.bind(id);

        match query.fetch_optional(&self.pool).await? {
            Some(row) => row_to_value(table, &row),
            None => Err(StoreError::NotFound(format!("{} {}", table.singular(), id))),
        }
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
