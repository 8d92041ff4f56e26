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
use crate::models::road::SubRoadInput;
use crate::store::{Filter, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubRoadQuery {
    pub road_id: Option<Uuid>,
}

/// GET /sub-roads[?road_id=] - active sub roads, optionally scoped to a road
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SubRoadQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(road_id) = query.road_id {
        filter = filter.eq("road_id", road_id);
    }
    let rows = state.store.select(Table::SubRoads, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// GET /roads/:id/sub-roads
pub async fn list_for_road(
    State(state): State<AppState>,
    Path(road_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Roads, road_id).await?;
    let rows = state
        .store
        .select(
            Table::SubRoads,
            Filter::new().eq("road_id", road_id).order_desc("created_at"),
        )
        .await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /sub-roads - name is unique within the parent road
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: SubRoadInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;
    let name = input.name.trim().to_string();

    require_active(&state.store, Table::Roads, input.road_id).await?;

    let taken = state
        .store
        .exists(
            Table::SubRoads,
            Filter::new()
                .eq("name", name.as_str())
                .eq("road_id", input.road_id),
        )
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!(
            "Sub road '{}' already exists under this road",
            name
        )));
    }

    let row = state
        .store
        .insert(
            Table::SubRoads,
            json!({ "name": name, "road_id": input.road_id }),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /sub-roads/:id - rename; uniqueness stays scoped to the parent road
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    #[derive(Deserialize)]
    struct Rename {
        name: String,
    }
    let input: Rename = parse(payload)?;
    if input.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let name = input.name.trim().to_string();

    let existing = require_active(&state.store, Table::SubRoads, id).await?;
    let road_id = row_uuid(&existing, "road_id")
        .ok_or_else(|| ApiError::internal("sub road row missing road_id"))?;

    let taken = state
        .store
        .exists(
            Table::SubRoads,
            Filter::new()
                .eq("name", name.as_str())
                .eq("road_id", road_id)
                .ne("id", id),
        )
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!(
            "Sub road '{}' already exists under this road",
            name
        )));
    }

    let row = state
        .store
        .update(Table::SubRoads, id, json!({ "name": name }))
        .await?;
    Ok(Json(row))
}

/// DELETE /sub-roads/:id - blocked while addresses, development projects or
/// lamps under it are still active
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::SubRoads, id).await?;

    let (addresses, projects, lamps) = futures::future::try_join3(
        state
            .store
            .count(Table::Addresses, Filter::new().eq("sub_road_id", id)),
        state
            .store
            .count(Table::SubSubRoads, Filter::new().eq("parent_sub_road_id", id)),
        state
            .store
            .count(Table::RoadLamps, Filter::new().eq("sub_road_id", id)),
    )
    .await?;

    let mut blockers = Vec::new();
    if addresses > 0 {
        blockers.push("addresses");
    }
    if projects > 0 {
        blockers.push("development projects");
    }
    if lamps > 0 {
        blockers.push("road lamps");
    }
    if !blockers.is_empty() {
        return Err(ApiError::dependency_conflict(format!(
            "Cannot delete sub road: active {} reference it",
            blockers.join(", ")
        )));
    }

    state
        .store
        .update(Table::SubRoads, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Sub road deleted" })))
}
