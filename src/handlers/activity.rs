use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::parse;
use crate::error::ApiError;
use crate::models::activity::{ActionType, NewActivityLog};
use crate::store::{Filter, Table};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 100;
const RECENT_LOGINS_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub username: Option<String>,
    pub action_type: Option<String>,
    pub resource_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub recent_logins: Option<bool>,
}

/// GET /activity-logs - bearer protected; newest entries first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Filter::new().order_desc("created_at");

    if query.recent_logins.unwrap_or(false) {
        filter = filter
            .eq("action_type", ActionType::Login.as_str())
            .limit(query.limit.unwrap_or(RECENT_LOGINS_LIMIT));
        let rows = state.store.select(Table::ActivityLogs, filter).await?;
        return Ok(Json(Value::Array(rows)));
    }

    if let Some(username) = &query.username {
        filter = filter.eq("username", username.as_str());
    }
    if let Some(action_type) = &query.action_type {
        let parsed: ActionType = action_type.parse().map_err(ApiError::validation)?;
        filter = filter.eq("action_type", parsed.as_str());
    }
    if let Some(resource_type) = &query.resource_type {
        filter = filter.eq("resource_type", resource_type.as_str());
    }
    if let Some(start) = query.start_date {
        filter = filter.gte("created_at", start);
    }
    if let Some(end) = query.end_date {
        filter = filter.lte("created_at", end);
    }
    filter = filter
        .limit(query.limit.unwrap_or(DEFAULT_LIMIT))
        .offset(query.offset.unwrap_or(0));

    let rows = state.store.select(Table::ActivityLogs, filter).await?;
    Ok(Json(Value::Array(rows)))
}

/// POST /activity-logs - bearer protected; lets the UI append client-side
/// actions (logout, view, export) to the trail
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let mut entry: NewActivityLog = parse(payload)?;
    if entry.username.trim().is_empty() {
        return Err(ApiError::validation("username is required"));
    }

    if entry.ip_address.is_none() {
        entry.ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());
    }
    if entry.user_agent.is_none() {
        entry.user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }

    let row = serde_json::to_value(&entry)
        .map_err(|e| ApiError::internal(format!("failed to serialize entry: {}", e)))?;
    let stored = state.store.insert(Table::ActivityLogs, row).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
