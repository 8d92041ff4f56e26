pub mod activity;
pub mod addresses;
pub mod auth;
pub mod businesses;
pub mod dashboard;
pub mod households;
pub mod members;
pub mod road_development;
pub mod road_lamps;
pub mod roads;
pub mod sub_roads;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{Filter, SharedStore, Table};

/// Parse a JSON payload into a typed input, mapping serde failures to the
/// 400 validation shape instead of the framework's rejection.
pub(crate) fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload).map_err(|e| ApiError::validation(format!("invalid payload: {}", e)))
}

/// Fetch an active (non-deleted) row by id or fail with 404.
pub(crate) async fn require_active(
    store: &SharedStore,
    table: Table,
    id: Uuid,
) -> Result<Value, ApiError> {
    store
        .select_one(table, Filter::new().eq("id", id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", table.singular())))
}

pub(crate) fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id").and_then(Value::as_str).and_then(|s| s.parse().ok())
}

pub(crate) fn row_uuid(row: &Value, column: &str) -> Option<Uuid> {
    row.get(column).and_then(Value::as_str).and_then(|s| s.parse().ok())
}
