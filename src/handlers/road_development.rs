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
use crate::models::development::{DevelopmentInput, DevelopmentProject, DevelopmentStats};
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub road_id: Option<Uuid>,
    pub parent_sub_road_id: Option<Uuid>,
}

async fn check_parents(store: &SharedStore, input: &DevelopmentInput) -> Result<(), ApiError> {
    require_active(store, Table::Roads, input.road_id).await?;
    let sub_road = require_active(store, Table::SubRoads, input.parent_sub_road_id).await?;
    if row_uuid(&sub_road, "road_id") != Some(input.road_id) {
        return Err(ApiError::validation(
            "parent_sub_road_id does not belong to the given road",
        ));
    }
    Ok(())
}

async fn ensure_name_available(
    store: &SharedStore,
    name: &str,
    parent_sub_road_id: Uuid,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let mut filter = Filter::new()
        .eq("name", name)
        .eq("parent_sub_road_id", parent_sub_road_id);
    if let Some(id) = exclude {
        filter = filter.ne("id", id);
    }
    if store.exists(Table::SubSubRoads, filter).await? {
        return Err(ApiError::duplicate(format!(
            "Development project '{}' already exists under this sub road",
            name
        )));
    }
    Ok(())
}

/// Storage row with the derived cost fields recomputed from the three input
/// scalars; anything the client sent for them has already been discarded at
/// parse time.
fn project_row(input: &DevelopmentInput) -> Value {
    json!({
        "name": input.name.trim(),
        "road_id": input.road_id,
        "parent_sub_road_id": input.parent_sub_road_id,
        "width": input.width,
        "height": input.height,
        "square_feet": input.square_feet(),
        "cost_per_sq_ft": input.cost_per_sq_ft,
        "total_cost": input.total_cost(),
        "development_status": input.development_status,
    })
}

/// GET /road-development (also /sub-sub-roads)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(road_id) = query.road_id {
        filter = filter.eq("road_id", road_id);
    }
    if let Some(parent) = query.parent_sub_road_id {
        filter = filter.eq("parent_sub_road_id", parent);
    }
    let rows = state.store.select(Table::SubSubRoads, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /road-development (also /sub-sub-roads)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: DevelopmentInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    check_parents(&state.store, &input).await?;
    ensure_name_available(
        &state.store,
        input.name.trim(),
        input.parent_sub_road_id,
        None,
    )
    .await?;

    let row = state.store.insert(Table::SubSubRoads, project_row(&input)).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /road-development/:id (also /sub-sub-roads/:id)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: DevelopmentInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::SubSubRoads, id).await?;
    check_parents(&state.store, &input).await?;
    ensure_name_available(
        &state.store,
        input.name.trim(),
        input.parent_sub_road_id,
        Some(id),
    )
    .await?;

    let row = state
        .store
        .update(Table::SubSubRoads, id, project_row(&input))
        .await?;
    Ok(Json(row))
}

/// DELETE /road-development/:id (also /sub-sub-roads/:id) - soft delete
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::SubSubRoads, id).await?;
    state
        .store
        .update(Table::SubSubRoads, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Development project deleted" })))
}

/// GET /road-development/stats - status summary over active projects
pub async fn stats(State(state): State<AppState>) -> Result<Json<DevelopmentStats>, ApiError> {
    Ok(Json(collect_stats(&state.store).await?))
}

pub(crate) async fn collect_stats(store: &SharedStore) -> Result<DevelopmentStats, ApiError> {
    let rows = store.select(Table::SubSubRoads, Filter::new()).await?;
    let projects: Vec<DevelopmentProject> = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ApiError::internal(format!("malformed project row: {}", e)))?;
    Ok(DevelopmentStats::from_projects(projects.iter()))
}
