use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse, require_active};
use crate::error::ApiError;
use crate::models::member::MemberInput;
use crate::store::{Filter, SharedStore, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub household_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMember {
    pub household_id: Uuid,
    #[serde(flatten)]
    pub member: MemberInput,
}

/// Storage row for a member payload. Derived here so the single-member and
/// household-batch paths store identical shapes.
pub(crate) fn member_row(household_id: Uuid, input: &MemberInput) -> Value {
    json!({
        "household_id": household_id,
        "full_name": input.full_name,
        "name_with_initial": input.name_with_initial,
        "member_type": input.member_type,
        "nic": input.nic,
        "gender": input.gender,
        "age": input.age,
        "occupation": input.occupation,
        "school_name": input.school_name,
        "grade": input.grade,
        "university_name": input.university_name,
        "other_occupation": input.other_occupation,
        "offers_receiving": input.normalized_offers(),
        "is_disabled": input.is_disabled,
        "land_house_status": input.land_house_status,
        "whatsapp_number": input.whatsapp_number,
        "is_drug_user": input.is_drug_user,
        "is_thief": input.is_thief,
    })
}

/// NIC is the natural key: unique among non-deleted members, excluding the
/// row itself on update.
pub(crate) async fn ensure_nic_available(
    store: &SharedStore,
    nic: &str,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let mut filter = Filter::new().eq("nic", nic);
    if let Some(id) = exclude {
        filter = filter.ne("id", id);
    }
    if store.exists(Table::Members, filter).await? {
        return Err(ApiError::duplicate(format!(
            "A member with NIC '{}' already exists",
            nic
        )));
    }
    Ok(())
}

/// Reject duplicate NICs inside one registration batch before touching the
/// registry.
pub(crate) fn ensure_batch_nics_distinct(members: &[MemberInput]) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    for member in members {
        if !seen.insert(member.nic.trim()) {
            return Err(ApiError::duplicate(format!(
                "Duplicate NIC '{}' in member list",
                member.nic
            )));
        }
    }
    Ok(())
}

/// GET /members[?household_id=] - active members flattened with the parent
/// household's residency fields
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");
    if let Some(household_id) = query.household_id {
        filter = filter.eq("household_id", household_id);
    }
    let members = state.store.select(Table::Members, filter).await?;

    // raw lookup so members still flatten if their household was removed
    let households = state
        .store
        .select(Table::Households, Filter::new().include_deleted())
        .await?;
    let by_id: HashMap<&str, &Value> = households
        .iter()
        .filter_map(|h| h.get("id").and_then(Value::as_str).map(|id| (id, h)))
        .collect();

    let rows: Vec<Value> = members
        .into_iter()
        .map(|mut member| {
            let household = member
                .get("household_id")
                .and_then(Value::as_str)
                .and_then(|id| by_id.get(id));
            if let (Some(household), Some(obj)) = (household, member.as_object_mut()) {
                for key in ["resident_type", "assessment_number", "waste_disposal"] {
                    obj.insert(
                        key.to_string(),
                        household.get(key).cloned().unwrap_or(Value::Null),
                    );
                }
            }
            member
        })
        .collect();

    Ok(Json(Value::Array(rows)))
}

/// POST /members - add a member to an existing household
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let input: CreateMember = parse(payload)?;
    input.member.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::Households, input.household_id).await?;
    ensure_nic_available(&state.store, &input.member.nic, None).await?;

    let row = state
        .store
        .insert(Table::Members, member_row(input.household_id, &input.member))
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /members/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let input: CreateMember = parse(payload)?;
    input.member.validate().map_err(ApiError::validation)?;

    require_active(&state.store, Table::Members, id).await?;
    require_active(&state.store, Table::Households, input.household_id).await?;
    ensure_nic_available(&state.store, &input.member.nic, Some(id)).await?;

    let row = state
        .store
        .update(Table::Members, id, member_row(input.household_id, &input.member))
        .await?;
    Ok(Json(row))
}

/// DELETE /members/:id - soft delete
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_active(&state.store, Table::Members, id).await?;
    state
        .store
        .update(Table::Members, id, json!({ "is_deleted": true }))
        .await?;
    Ok(Json(json!({ "message": "Member deleted" })))
}
