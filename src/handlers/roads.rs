use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse, require_active, row_id};
use crate::error::ApiError;
use crate::models::road::RoadInput;
use crate::store::{Bind, Filter, Table};
use crate::AppState;

/// GET /roads - all active roads, newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .select(Table::Roads, Filter::new().order_desc("created_at"))
        .await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /roads - create a road; name is unique among active roads
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: RoadInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;
    let name = input.name.trim().to_string();

    let taken = state
        .store
        .exists(Table::Roads, Filter::new().eq("name", name.as_str()))
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!("Road '{}' already exists", name)));
    }

    let row = state.store.insert(Table::Roads, json!({ "name": name })).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /roads/:id - rename a road
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: RoadInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;
    let name = input.name.trim().to_string();

    require_active(&state.store, Table::Roads, id).await?;

    let taken = state
        .store
        .exists(
            Table::Roads,
            Filter::new().eq("name", name.as_str()).ne("id", id),
        )
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!("Road '{}' already exists", name)));
    }

    let row = state
        .store
        .update(Table::Roads, id, json!({ "name": name }))
        .await?;
    Ok(Json(row))
}

/// DELETE /roads/:id - soft delete, guarded by active dependents.
///
/// Deletion requires all three dependent collections (sub roads, road lamps,
/// households reached through the road's addresses) to be empty; the counts
/// run concurrently.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Roads, id).await?;

    let addresses = state
        .store
        .select(Table::Addresses, Filter::new().eq("road_id", id))
        .await?;
    let address_ids: Vec<Bind> = addresses.iter().filter_map(row_id).map(Bind::from).collect();

    let (sub_roads, lamps, households) = futures::future::try_join3(
        state
            .store
            .count(Table::SubRoads, Filter::new().eq("road_id", id)),
        state
            .store
            .count(Table::RoadLamps, Filter::new().eq("road_id", id)),
        state
            .store
            .count(Table::Households, Filter::new().any_of("address_id", address_ids)),
    )
    .await?;

    let mut blockers = Vec::new();
    if sub_roads > 0 {
        blockers.push("sub roads");
    }
    if lamps > 0 {
        blockers.push("road lamps");
    }
    if households > 0 {
        blockers.push("households");
    }
    if !blockers.is_empty() {
        return Err(ApiError::dependency_conflict(format!(
            "Cannot delete road: active {} reference it",
            blockers.join(", ")
        )));
    }

    state
        .store
        .update(Table::Roads, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Road deleted" })))
}
