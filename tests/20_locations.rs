mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use village_registry_api::models::road::Road;

async fn create_road(app: &axum::Router, name: &str) -> String {
    let (status, row) =
        common::request(app, "POST", "/roads", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "create road: {}", row);
    common::id_of(&row)
}

async fn create_sub_road(app: &axum::Router, name: &str, road_id: &str) -> String {
    let (status, row) = common::request(
        app,
        "POST",
        "/sub-roads",
        Some(json!({ "name": name, "road_id": road_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create sub road: {}", row);
    common::id_of(&row)
}

#[tokio::test]
async fn road_names_are_globally_unique() {
    let app = common::test_app();
    create_road(&app, "Temple Road").await;

    let (status, body) =
        common::request(&app, "POST", "/roads", Some(json!({ "name": "Temple Road" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Temple Road"));

    let (status, body) = common::request(&app, "GET", "/roads", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    // rows deserialize into the typed model
    let road: Road = serde_json::from_value(rows[0].clone()).unwrap();
    assert_eq!(road.name, "Temple Road");
    assert!(!road.is_deleted);
}

#[tokio::test]
async fn road_rename_checks_duplicates_excluding_self() {
    let app = common::test_app();
    let a = create_road(&app, "Temple Road").await;
    let b = create_road(&app, "Lake Road").await;

    // renaming to an existing name conflicts
    let (status, _) = common::request(
        &app,
        "PUT",
        &format!("/roads/{}", b),
        Some(json!({ "name": "Temple Road" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // renaming to its own name is fine
    let (status, row) = common::request(
        &app,
        "PUT",
        &format!("/roads/{}", a),
        Some(json!({ "name": "Temple Road" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["name"], "Temple Road");
}

#[tokio::test]
async fn sub_road_names_unique_per_road_only() {
    let app = common::test_app();
    let a = create_road(&app, "Temple Road").await;
    let b = create_road(&app, "Lake Road").await;

    create_sub_road(&app, "1st Lane", &a).await;

    let (status, _) = common::request(
        &app,
        "POST",
        "/sub-roads",
        Some(json!({ "name": "1st Lane", "road_id": a })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // same name under a different road is a different sub road
    create_sub_road(&app, "1st Lane", &b).await;

    let (status, body) =
        common::request(&app, "GET", &format!("/roads/{}/sub-roads", a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sub_road_requires_existing_road() {
    let app = common::test_app();
    let (status, _) = common::request(
        &app,
        "POST",
        "/sub-roads",
        Some(json!({ "name": "1st Lane", "road_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn main_road_and_sub_road_addresses_are_disjoint() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    // main-road address (sub_road_id null)
    let (status, _) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": road })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // identical (address, road, null) is a duplicate
    let (status, _) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": road })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // same number under the sub road is a distinct address
    let (status, _) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": road, "sub_road_id": sub_road })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // hierarchy endpoints keep the sets apart: omitting sub_road_id means
    // IS NULL, not "all addresses under the road"
    let (status, body) =
        common::request(&app, "GET", &format!("/roads/{}/addresses", road), None).await;
    assert_eq!(status, StatusCode::OK);
    let main_road: Vec<Value> = body.as_array().unwrap().clone();
    assert_eq!(main_road.len(), 1);
    assert!(main_road[0]["sub_road_id"].is_null());

    let (status, body) = common::request(
        &app,
        "GET",
        &format!("/roads/{}/sub-roads/{}/addresses", road, sub_road),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let under_sub: Vec<Value> = body.as_array().unwrap().clone();
    assert_eq!(under_sub.len(), 1);
    assert_eq!(under_sub[0]["sub_road_id"], json!(sub_road));
}

#[tokio::test]
async fn address_sub_road_must_belong_to_road() {
    let app = common::test_app();
    let a = create_road(&app, "Temple Road").await;
    let b = create_road(&app, "Lake Road").await;
    let sub_b = create_sub_road(&app, "1st Lane", &b).await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": a, "sub_road_id": sub_b })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn road_delete_blocked_by_active_sub_roads() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    let (status, body) =
        common::request(&app, "DELETE", &format!("/roads/{}", road), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sub roads"));

    // the road is still visible
    let (_, body) = common::request(&app, "GET", "/roads", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // clearing the dependency unblocks deletion
    let (status, _) =
        common::request(&app, "DELETE", &format!("/sub-roads/{}", sub_road), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::request(&app, "DELETE", &format!("/roads/{}", road), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::request(&app, "GET", "/roads", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn road_delete_blocked_by_households_through_addresses() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;

    let (_, address) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": road })),
    )
    .await;
    let address_id = common::id_of(&address);

    let (status, _) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": {
                "assessment_number": "A-100",
                "resident_type": "permanent",
                "waste_disposal": "local_council",
            },
            "members": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request(&app, "DELETE", &format!("/roads/{}", road), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("households"));
}

#[tokio::test]
async fn sub_road_delete_blocked_by_addresses() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    let (status, _) = common::request(
        &app,
        "POST",
        "/addresses",
        Some(json!({ "address": "10", "road_id": road, "sub_road_id": sub_road })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request(&app, "DELETE", &format!("/sub-roads/{}", sub_road), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("addresses"));
}

#[tokio::test]
async fn development_project_recomputes_derived_fields() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    // client-sent derived values are ignored and recomputed
    let (status, row) = common::request(
        &app,
        "POST",
        "/road-development",
        Some(json!({
            "name": "Lane paving",
            "road_id": road,
            "parent_sub_road_id": sub_road,
            "width": 10.0,
            "height": 20.0,
            "cost_per_sq_ft": 5.0,
            "square_feet": 999.0,
            "total_cost": 999.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", row);
    assert_eq!(row["square_feet"].as_f64().unwrap(), 200.0);
    assert_eq!(row["total_cost"].as_f64().unwrap(), 1000.0);
    assert_eq!(row["development_status"], "undeveloped");

    // updates recompute too
    let id = common::id_of(&row);
    let (status, row) = common::request(
        &app,
        "PUT",
        &format!("/road-development/{}", id),
        Some(json!({
            "name": "Lane paving",
            "road_id": road,
            "parent_sub_road_id": sub_road,
            "width": 5.0,
            "height": 20.0,
            "cost_per_sq_ft": 2.0,
            "development_status": "in_progress",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", row);
    assert_eq!(row["square_feet"].as_f64().unwrap(), 100.0);
    assert_eq!(row["total_cost"].as_f64().unwrap(), 200.0);
}

#[tokio::test]
async fn development_project_rejects_non_positive_inputs() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/road-development",
        Some(json!({
            "name": "Lane paving",
            "road_id": road,
            "parent_sub_road_id": sub_road,
            "width": 0.0,
            "height": 20.0,
            "cost_per_sq_ft": 5.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("width"));
}

#[tokio::test]
async fn development_names_unique_within_parent_sub_road() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let lane1 = create_sub_road(&app, "1st Lane", &road).await;
    let lane2 = create_sub_road(&app, "2nd Lane", &road).await;

    let project = |parent: &str| {
        json!({
            "name": "Paving",
            "road_id": road,
            "parent_sub_road_id": parent,
            "width": 10.0,
            "height": 10.0,
            "cost_per_sq_ft": 1.0,
        })
    };

    let (status, _) =
        common::request(&app, "POST", "/road-development", Some(project(&lane1))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
        common::request(&app, "POST", "/road-development", Some(project(&lane1))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        common::request(&app, "POST", "/road-development", Some(project(&lane2))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn development_stats_reduce_by_status() {
    let app = common::test_app();
    let road = create_road(&app, "Temple Road").await;
    let sub_road = create_sub_road(&app, "1st Lane", &road).await;

    for (name, status_str, width) in [
        ("Segment A", "developed", 10.0),
        ("Segment B", "undeveloped", 20.0),
        ("Segment C", "in_progress", 30.0),
    ] {
        let (status, _) = common::request(
            &app,
            "POST",
            "/road-development",
            Some(json!({
                "name": name,
                "road_id": road,
                "parent_sub_road_id": sub_road,
                "width": width,
                "height": 10.0,
                "cost_per_sq_ft": 1.0,
                "development_status": status_str,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = common::request(&app, "GET", "/road-development/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProjects"], 3);
    assert_eq!(body["developedProjects"], 1);
    assert_eq!(body["undevelopedProjects"], 1);
    assert_eq!(body["inProgressProjects"], 1);
    // 100 + 200 + 300 sq ft at 1/sq ft
    assert_eq!(body["totalEstimatedCost"].as_f64().unwrap(), 600.0);
}
