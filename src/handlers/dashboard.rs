use std::collections::BTreeMap;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::road_development::collect_stats;
use crate::error::ApiError;
use crate::models::member::{Member, MemberType};
use crate::store::{Filter, Table};
use crate::AppState;

/// GET /dashboard/stats - entity counts over non-deleted rows
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = &state.store;

    let (roads, sub_roads, addresses) = futures::future::try_join3(
        store.count(Table::Roads, Filter::new()),
        store.count(Table::SubRoads, Filter::new()),
        store.count(Table::Addresses, Filter::new()),
    )
    .await?;
    let (households, members, businesses) = futures::future::try_join3(
        store.count(Table::Households, Filter::new()),
        store.count(Table::Members, Filter::new()),
        store.count(Table::Businesses, Filter::new()),
    )
    .await?;
    let (lamps_total, lamps_working, lamps_broken) = futures::future::try_join3(
        store.count(Table::RoadLamps, Filter::new()),
        store.count(Table::RoadLamps, Filter::new().eq("status", "working")),
        store.count(Table::RoadLamps, Filter::new().eq("status", "broken")),
    )
    .await?;

    let development = collect_stats(store).await?;

    Ok(Json(json!({
        "roads": roads,
        "sub_roads": sub_roads,
        "addresses": addresses,
        "households": households,
        "members": members,
        "businesses": businesses,
        "road_lamps": {
            "total": lamps_total,
            "working": lamps_working,
            "broken": lamps_broken,
        },
        "road_development": development,
    })))
}

/// GET /dashboard/member-stats - demographic breakdown of active members.
/// Every bucket is present even over an empty registry.
pub async fn member_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = state.store.select(Table::Members, Filter::new()).await?;
    let members: Vec<Member> = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ApiError::internal(format!("malformed member row: {}", e)))?;

    let mut by_gender: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_occupation: BTreeMap<String, i64> = BTreeMap::new();
    let mut age_brackets: BTreeMap<&'static str, i64> =
        [("0-17", 0), ("18-35", 0), ("36-55", 0), ("56+", 0)]
            .into_iter()
            .collect();
    let mut permanent = 0i64;
    let mut temporary = 0i64;
    let mut disabled = 0i64;

    for member in &members {
        *by_gender.entry(member.gender.clone()).or_insert(0) += 1;

        // "Other" absorbs missing/blank occupations
        let occupation = match member.occupation.trim() {
            "" => "Other".to_string(),
            value => value.to_string(),
        };
        *by_occupation.entry(occupation).or_insert(0) += 1;

        let bracket = match member.age {
            0..=17 => "0-17",
            18..=35 => "18-35",
            36..=55 => "36-55",
            _ => "56+",
        };
        *age_brackets.get_mut(bracket).expect("fixed brackets") += 1;

        match member.member_type {
            MemberType::Permanent => permanent += 1,
            MemberType::Temporary => temporary += 1,
        }
        if member.is_disabled {
            disabled += 1;
        }
    }

    Ok(Json(json!({
        "total": members.len(),
        "by_gender": by_gender,
        "age_brackets": age_brackets,
        "by_member_type": { "permanent": permanent, "temporary": temporary },
        "by_occupation": by_occupation,
        "disabled": disabled,
    })))
}
