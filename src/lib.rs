pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use services::activity::ActivityLogger;
use store::SharedStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub activity: ActivityLogger,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            activity: ActivityLogger::new(store.clone()),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth route
        .route("/auth/login", post(handlers::auth::login))
        .merge(location_routes())
        .merge(registry_routes())
        .merge(dashboard_routes())
        .merge(activity_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn location_routes() -> Router<AppState> {
    use handlers::{addresses, road_development, roads, sub_roads};

    Router::new()
        .route("/roads", get(roads::list).post(roads::create))
        .route("/roads/:id", put(roads::update).delete(roads::remove))
        .route("/roads/:id/sub-roads", get(sub_roads::list_for_road))
        .route("/roads/:id/addresses", get(addresses::list_for_road))
        .route(
            "/roads/:road_id/sub-roads/:sub_road_id/addresses",
            get(addresses::list_for_sub_road),
        )
        .route("/sub-roads", get(sub_roads::list).post(sub_roads::create))
        .route(
            "/sub-roads/:id",
            put(sub_roads::update).delete(sub_roads::remove),
        )
        // Development projects answer on both their historical path and the
        // sub-sub-road path
        .route(
            "/sub-sub-roads",
            get(road_development::list).post(road_development::create),
        )
        .route(
            "/sub-sub-roads/:id",
            put(road_development::update).delete(road_development::remove),
        )
        .route(
            "/road-development",
            get(road_development::list).post(road_development::create),
        )
        .route("/road-development/stats", get(road_development::stats))
        .route(
            "/road-development/:id",
            put(road_development::update).delete(road_development::remove),
        )
        .route("/addresses", get(addresses::list).post(addresses::create))
        .route(
            "/addresses/:id",
            put(addresses::update).delete(addresses::remove),
        )
}

fn registry_routes() -> Router<AppState> {
    use handlers::{businesses, households, members, road_lamps};

    Router::new()
        .route(
            "/households",
            get(households::list).post(households::create),
        )
        .route(
            "/households/:id",
            get(households::get).put(households::update),
        )
        .route("/members", get(members::list).post(members::create))
        .route("/members/:id", put(members::update).delete(members::remove))
        .route(
            "/businesses",
            get(businesses::list).post(businesses::create),
        )
        .route(
            "/businesses/:id",
            put(businesses::update).delete(businesses::remove),
        )
        .route(
            "/road-lamps",
            get(road_lamps::list).post(road_lamps::create),
        )
        .route(
            "/road-lamps/:id",
            put(road_lamps::update).delete(road_lamps::remove),
        )
        .route("/road-lamps/:id/status", patch(road_lamps::set_status))
}

fn dashboard_routes() -> Router<AppState> {
    use handlers::dashboard;

    Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/member-stats", get(dashboard::member_stats))
}

fn activity_routes() -> Router<AppState> {
    use handlers::activity;

    // The only bearer-protected surface; everything else is open.
    Router::new()
        .route(
            "/activity-logs",
            get(activity::list).post(activity::create),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_admin))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Village Registry API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Household, member, business and road infrastructure registries",
        "endpoints": {
            "auth": "/auth/login (public)",
            "locations": "/roads, /sub-roads, /addresses, /road-development",
            "registries": "/households, /members, /businesses, /road-lamps",
            "dashboard": "/dashboard/stats, /dashboard/member-stats",
            "activity": "/activity-logs (bearer token)",
        },
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    match state.store.health().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": e.to_string(),
            })),
        ),
    }
}
