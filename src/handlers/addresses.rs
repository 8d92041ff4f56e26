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
use crate::models::address::AddressInput;
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub road_id: Option<Uuid>,
    pub sub_road_id: Option<Uuid>,
}

/// GET /addresses[?road_id=&sub_road_id=]
///
/// Main-road and sub-road addresses are disjoint sets: a road-scoped query
/// without `sub_road_id` returns only `sub_road_id IS NULL` rows, never the
/// whole road subtree.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(road_id) = query.road_id {
        filter = filter.eq("road_id", road_id);
        filter = match query.sub_road_id {
            Some(sub_road_id) => filter.eq("sub_road_id", sub_road_id),
            None => filter.is_null("sub_road_id"),
        };
    }
    let rows = state.store.select(Table::Addresses, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// GET /roads/:id/addresses - main-road addresses only
pub async fn list_for_road(
    State(state): State<AppState>,
    Path(road_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Roads, road_id).await?;
    let rows = state
        .store
        .select(
            Table::Addresses,
            Filter::new()
                .eq("road_id", road_id)
                .is_null("sub_road_id")
                .order_desc("created_at"),
        )
        .await?;
    Ok(Json(Value::Array(rows)))
}

/// GET /roads/:road_id/sub-roads/:sub_road_id/addresses
pub async fn list_for_sub_road(
    State(state): State<AppState>,
    Path((road_id, sub_road_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Roads, road_id).await?;
    let sub_road = require_active(&state.store, Table::SubRoads, sub_road_id).await?;
    if row_uuid(&sub_road, "road_id") != Some(road_id) {
        return Err(ApiError::not_found("Sub road not found under this road"));
    }

    let rows = state
        .store
        .select(
            Table::Addresses,
            Filter::new()
                .eq("road_id", road_id)
                .eq("sub_road_id", sub_road_id)
                .order_desc("created_at"),
        )
        .await?;
    Ok(Json(Value::Array(rows)))
}

fn duplicate_filter(address: &str, road_id: Uuid, sub_road_id: Option<Uuid>) -> Filter {
    let filter = Filter::new().eq("address", address).eq("road_id", road_id);
    match sub_road_id {
        Some(id) => filter.eq("sub_road_id", id),
        None => filter.is_null("sub_road_id"),
    }
}

async fn check_parents(store: &SharedStore, input: &AddressInput) -> Result<(), ApiError> {
    require_active(store, Table::Roads, input.road_id).await?;
    if let Some(sub_road_id) = input.sub_road_id {
        let sub_road = require_active(store, Table::SubRoads, sub_road_id).await?;
        if row_uuid(&sub_road, "road_id") != Some(input.road_id) {
            return Err(ApiError::validation(
                "sub_road_id does not belong to the given road",
            ));
        }
    }
    Ok(())
}

/// POST /addresses - unique per (address, road, sub-road-or-null)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: AddressInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;
    let address = input.address.trim().to_string();

    check_parents(&state.store, &input).await?;

    let taken = state
        .store
        .exists(
            Table::Addresses,
            duplicate_filter(&address, input.road_id, input.sub_road_id),
        )
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!(
            "Address '{}' already exists at this location",
            address
        )));
    }

    let row = state
        .store
        .insert(
            Table::Addresses,
            json!({
                "address": address,
                "road_id": input.road_id,
                "sub_road_id": input.sub_road_id,
                "member": input.member,
            }),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /addresses/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: AddressInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;
    let address = input.address.trim().to_string();

    require_active(&state.store, Table::Addresses, id).await?;
    check_parents(&state.store, &input).await?;

    let taken = state
        .store
        .exists(
            Table::Addresses,
            duplicate_filter(&address, input.road_id, input.sub_road_id).ne("id", id),
        )
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!(
            "Address '{}' already exists at this location",
            address
        )));
    }

    let row = state
        .store
        .update(
            Table::Addresses,
            id,
            json!({
                "address": address,
                "road_id": input.road_id,
                "sub_road_id": input.sub_road_id,
                "member": input.member,
            }),
        )
        .await?;
    Ok(Json(row))
}

/// DELETE /addresses/:id - blocked while households or lamps reference it
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Addresses, id).await?;

    let (households, lamps) = futures::future::try_join(
        state
            .store
            .count(Table::Households, Filter::new().eq("address_id", id)),
        state
            .store
            .count(Table::RoadLamps, Filter::new().eq("address_id", id)),
    )
    .await?;

    let mut blockers = Vec::new();
    if households > 0 {
        blockers.push("households");
    }
    if lamps > 0 {
        blockers.push("road lamps");
    }
    if !blockers.is_empty() {
        return Err(ApiError::dependency_conflict(format!(
            "Cannot delete address: active {} reference it",
            blockers.join(", ")
        )));
    }

    state
        .store
        .update(Table::Addresses, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Address deleted" })))
}
