use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::{json, Value};

use crate::auth::{generate_token, verify_password, Claims};
use crate::config;
use crate::error::ApiError;
use crate::models::activity::{ActionType, NewActivityLog};
use crate::AppState;

/// POST /auth/login - validate the single administrator credential pair and
/// mint a session token.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let obj = payload
        .as_object()
        .filter(|o| !o.is_empty())
        .ok_or_else(|| ApiError::validation("username and password are required"))?;

    let username = obj
        .get("username")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("username and password are required"))?;
    let password = obj
        .get("password")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("username and password are required"))?;

    let ip = client_ip(&headers);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let security = &config::config().security;
    if username != security.admin_username {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    if !verify_password(password) {
        state.activity.record(
            NewActivityLog::new(username, ActionType::Login)
                .metadata(json!({ "success": false }))
                .ip_address(ip)
                .user_agent(user_agent),
        );
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let claims = Claims::admin(username.to_string());
    let token = generate_token(&claims).map_err(|e| ApiError::internal(e.to_string()))?;

    state.activity.record(
        NewActivityLog::new(username, ActionType::Login)
            .metadata(json!({ "success": true }))
            .ip_address(ip)
            .user_agent(user_agent),
    );

    Ok(Json(json!({
        "token": token,
        "user": {
            "username": username,
            "isAdmin": true,
        },
    })))
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}
