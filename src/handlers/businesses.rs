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
use crate::models::business::BusinessInput;
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BusinessQuery {
    pub road_id: Option<Uuid>,
}

/// Uniqueness key: (business_name, road_id, sub_road_id, business_address),
/// with the nullable columns compared as IS NULL.
fn duplicate_filter(input: &BusinessInput) -> Filter {
    let mut filter = Filter::new()
        .eq("business_name", input.business_name.trim())
        .eq("road_id", input.road_id);
    filter = match input.sub_road_id {
        Some(id) => filter.eq("sub_road_id", id),
        None => filter.is_null("sub_road_id"),
    };
    match input.business_address.as_deref() {
        Some(address) => filter.eq("business_address", address),
        None => filter.is_null("business_address"),
    }
}

async fn check_parents(store: &SharedStore, input: &BusinessInput) -> Result<(), ApiError> {
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

fn business_row(input: &BusinessInput) -> Value {
    json!({
        "business_name": input.business_name.trim(),
        "business_owner": input.business_owner,
        "business_type": input.business_type,
        "business_address": input.business_address,
        "business_phone": input.business_phone,
        "road_id": input.road_id,
        "sub_road_id": input.sub_road_id,
    })
}

/// GET /businesses[?road_id=]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BusinessQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(road_id) = query.road_id {
        filter = filter.eq("road_id", road_id);
    }
    let rows = state.store.select(Table::Businesses, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /businesses
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: BusinessInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    check_parents(&state.store, &input).await?;

    if state.store.exists(Table::Businesses, duplicate_filter(&input)).await? {
        return Err(ApiError::duplicate(format!(
            "Business '{}' is already registered at this location",
            input.business_name.trim()
        )));
    }

    let row = state.store.insert(Table::Businesses, business_row(&input)).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /businesses/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: BusinessInput = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::Businesses, id).await?;
    check_parents(&state.store, &input).await?;

    let taken = state
        .store
        .exists(Table::Businesses, duplicate_filter(&input).ne("id", id))
        .await?;
    if taken {
        return Err(ApiError::duplicate(format!(
            "Business '{}' is already registered at this location",
            input.business_name.trim()
        )));
    }

    let row = state
        .store
        .update(Table::Businesses, id, business_row(&input))
        .await?;
    Ok(Json(row))
}

/// DELETE /businesses/:id - soft delete
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Businesses, id).await?;
    state
        .store
        .update(Table::Businesses, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Business deleted" })))
}
