use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse, require_active, row_uuid};
use crate::error::ApiError;
use crate::models::lamp::{LampInput, LampStatusInput};
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LampQuery {
    pub road_id: Option<Uuid>,
    pub status: Option<String>,
}

async fn ensure_lamp_number_available(
    store: &SharedStore,
    lamp_number: &str,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let mut filter = Filter::new().eq("lamp_number", lamp_number);
    if let Some(id) = exclude {
        filter = filter.ne("id", id);
    }
    if store.exists(Table::RoadLamps, filter).await? {
        return Err(ApiError::duplicate(format!(
            "Lamp number '{}' is already in use",
            lamp_number
        )));
    }
    Ok(())
}

async fn check_parents(store: &SharedStore, input: &LampInput) -> Result<(), ApiError> {
    require_active(store, Table::Roads, input.road_id).await?;
    let sub_road = require_active(store, Table::SubRoads, input.sub_road_id).await?;
    if row_uuid(&sub_road, "road_id") != Some(input.road_id) {
        return Err(ApiError::validation(
            "sub_road_id does not belong to the given road",
        ));
    }
    require_active(store, Table::Addresses, input.address_id).await?;
    Ok(())
}

fn lamp_row(input: &LampInput) -> Value {
    json!({
        "lamp_number": input.lamp_number.trim(),
        "road_id": input.road_id,
        "sub_road_id": input.sub_road_id,
        "address_id": input.address_id,
        "status": input.status,
    })
}

/// GET /road-lamps[?road_id=&status=]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LampQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(road_id) = query.road_id {
        filter = filter.eq("road_id", road_id);
    }
    if let Some(status) = &query.status {
        filter = filter.eq("status", status.as_str());
    }
    let rows = state.store.select(Table::RoadLamps, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /road-lamps - lamp_number is globally unique among active lamps
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: LampInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    check_parents(&state.store, &input).await?;
    ensure_lamp_number_available(&state.store, input.lamp_number.trim(), None).await?;

    let row = state.store.insert(Table::RoadLamps, lamp_row(&input)).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /road-lamps/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: LampInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::RoadLamps, id).await?;
    check_parents(&state.store, &input).await?;
    ensure_lamp_number_available(&state.store, input.lamp_number.trim(), Some(id)).await?;

    let row = state
        .store
        .update(Table::RoadLamps, id, lamp_row(&input))
        .await?;
    Ok(Json(row))
}

/// PATCH /road-lamps/:id/status - working | broken
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: LampStatusInput = parse(payload)?;
    require_active(&state.store, Table::RoadLamps, id).await?;

    let row = state
        .store
        .update(Table::RoadLamps, id, json!({ "status": input.status }))
        .await?;
    Ok(Json(row))
}

/// DELETE /road-lamps/:id - soft delete
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::RoadLamps, id).await?;
    state
        .store
        .update(Table::RoadLamps, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Road lamp deleted" })))
}
