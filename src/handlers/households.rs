use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::members::{ensure_batch_nics_distinct, ensure_nic_available, member_row};
use super::{parse, require_active};
use crate::error::ApiError;
use crate::models::household::{HomeDetails, HouseholdInput};
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

async fn address_texts(store: &SharedStore) -> Result<HashMap<String, Value>, ApiError> {
    // raw lookup: a soft-deleted address should still label its household
    let addresses = store
        .select(Table::Addresses, Filter::new().include_deleted())
        .await?;
    Ok(addresses
        .into_iter()
        .filter_map(|a| {
            let id = a.get("id").and_then(Value::as_str)?.to_string();
            let text = a.get("address").cloned().unwrap_or(Value::Null);
            Some((id, text))
        })
        .collect())
}

fn attach(household: &mut Value, addresses: &HashMap<String, Value>, members: Vec<Value>) {
    let address = household
        .get("address_id")
        .and_then(Value::as_str)
        .and_then(|id| addresses.get(id))
        .cloned()
        .unwrap_or(Value::Null);
    if let Some(obj) = household.as_object_mut() {
        obj.insert("address".to_string(), address);
        obj.insert("members".to_string(), Value::Array(members));
    }
}

/// GET /households - active households with their address text and members
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let households = state
        .store
        .select(Table::Households, Filter::new().order_desc("created_at"))
        .await?;
    let members = state.store.select(Table::Members, Filter::new()).await?;
    let addresses = address_texts(&state.store).await?;

    let mut by_household: HashMap<String, Vec<Value>> = HashMap::new();
    for member in members {
        if let Some(id) = member.get("household_id").and_then(Value::as_str) {
            by_household.entry(id.to_string()).or_default().push(member);
        }
    }

    let rows: Vec<Value> = households
        .into_iter()
        .map(|mut household| {
            let members = household
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| by_household.remove(id))
                .unwrap_or_default();
            attach(&mut household, &addresses, members);
            household
        })
        .collect();

    Ok(Json(Value::Array(rows)))
}

/// GET /households/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut household = require_active(&state.store, Table::Households, id).await?;
    let members = state
        .store
        .select(Table::Members, Filter::new().eq("household_id", id))
        .await?;
    let addresses = address_texts(&state.store).await?;
    attach(&mut household, &addresses, members);
    Ok(Json(household))
}

/// POST /households - register a household together with its members.
///
/// The household row and every member row land in one atomic batch: a
/// rejected member can never strand an empty household.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: HouseholdInput = parse(payload)?;
    input.home_details.validate().map_err(ApiError::validation)?;
    for member in &input.members {
        member.validate().map_err(ApiError::validation)?;
    }
    ensure_batch_nics_distinct(&input.members)?;

    require_active(&state.store, Table::Addresses, input.address_id).await?;
    for member in &input.members {
        ensure_nic_available(&state.store, &member.nic, None).await?;
    }

    let household_id = Uuid::new_v4();
    let mut batch = vec![(
        Table::Households,
        json!({
            "id": household_id,
            "address_id": input.address_id,
            "assessment_number": input.home_details.assessment_number,
            "resident_type": input.home_details.resident_type,
            "waste_disposal": input.home_details.waste_disposal,
        }),
    )];
    for member in &input.members {
        batch.push((Table::Members, member_row(household_id, member)));
    }

    let mut stored = state.store.insert_batch(batch).await?;
    let household = stored.remove(0);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "household": household, "members": stored })),
    ))
}

/// PUT /households/:id - update the home details
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: HomeDetails = parse(payload)?;
    input.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::Households, id).await?;

    let row = state
        .store
        .update(
            Table::Households,
            id,
            json!({
                "assessment_number": input.assessment_number,
                "resident_type": input.resident_type,
                "waste_disposal": input.waste_disposal,
            }),
        )
        .await?;
    Ok(Json(row))
}
