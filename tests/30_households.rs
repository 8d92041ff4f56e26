mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

async fn setup_address(app: &axum::Router) -> String {
    let (status, road) =
        common::request(app, "POST", "/roads", Some(json!({ "name": "Temple Road" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, address) = common::request(
        app,
        "POST",
        "/addresses",
        Some(json!({ "address": "24/1", "road_id": common::id_of(&road) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    common::id_of(&address)
}

fn member(nic: &str, age: i64) -> Value {
    json!({
        "full_name": "Kamal Perera",
        "name_with_initial": "K. Perera",
        "member_type": "permanent",
        "nic": nic,
        "gender": "male",
        "age": age,
        "occupation": "Farmer",
        "land_house_status": "own",
    })
}

fn home_details() -> Value {
    json!({
        "assessment_number": "A-100",
        "resident_type": "rent",
        "waste_disposal": "home",
    })
}

#[tokio::test]
async fn household_with_members_round_trip() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [member("901234567V", 35), member("927654321V", 32)],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let household_id = common::id_of(&body["household"]);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);

    // the members list returns exactly those rows, flattened with the
    // parent household's residency fields
    let (status, body) = common::request(&app, "GET", "/members", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row["household_id"], json!(household_id));
        assert_eq!(row["resident_type"], "rent");
        assert_eq!(row["assessment_number"], "A-100");
        assert_eq!(row["waste_disposal"], "home");
    }

    // household fetch carries its members and address text
    let (status, body) =
        common::request(&app, "GET", &format!("/households/{}", household_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "24/1");
    assert_eq!(body["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn household_requires_existing_address() {
    let app = common::test_app();
    let (status, _) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": uuid::Uuid::new_v4(),
            "home_details": home_details(),
            "members": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_member_rejects_whole_registration() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;

    let (status, _) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [member("901234567V", 35), member("927654321V", 151)],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // nothing was written: no household, no members
    let (_, body) = common::request(&app, "GET", "/households", None).await;
    assert!(body.as_array().unwrap().is_empty());
    let (_, body) = common::request(&app, "GET", "/members", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn member_age_bounds_are_inclusive() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;
    let (_, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [],
        })),
    )
    .await;
    let household_id = common::id_of(&body["household"]);

    let mut payload = member("901234567V", 151);
    payload["household_id"] = json!(household_id);
    let (status, body) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("age"));

    let mut payload = member("901234567V", 150);
    payload["household_id"] = json!(household_id);
    let (status, _) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn nic_is_a_global_natural_key() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;
    let (_, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [member("901234567V", 35)],
        })),
    )
    .await;
    let household_id = common::id_of(&body["household"]);
    let member_id = common::id_of(&body["members"][0]);

    // same NIC again, via the single-member endpoint
    let mut payload = member("901234567V", 40);
    payload["household_id"] = json!(household_id);
    let (status, body) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("901234567V"));

    // duplicate NICs inside one registration batch are caught too
    let (status, _) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [member("935555555V", 20), member("935555555V", 21)],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // updating a member keeps its own NIC without tripping the check
    let mut payload = member("901234567V", 36);
    payload["household_id"] = json!(household_id);
    let (status, row) = common::request(
        &app,
        "PUT",
        &format!("/members/{}", member_id),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", row);
    assert_eq!(row["age"], 36);
}

#[tokio::test]
async fn soft_deleted_member_leaves_default_reads() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;
    let (_, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [member("901234567V", 35)],
        })),
    )
    .await;
    let member_id = common::id_of(&body["members"][0]);

    let (status, _) =
        common::request(&app, "DELETE", &format!("/members/{}", member_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::request(&app, "GET", "/members", None).await;
    assert!(body.as_array().unwrap().is_empty());

    // the NIC frees up for new registrations once the row is inactive
    let (_, body) = common::request(&app, "GET", "/households", None).await;
    let household_id = common::id_of(&body.as_array().unwrap()[0]);
    let mut payload = member("901234567V", 35);
    payload["household_id"] = json!(household_id);
    let (status, _) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn offers_receiving_singleton_coercion() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;
    let (_, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [],
        })),
    )
    .await;
    let household_id = common::id_of(&body["household"]);

    let mut payload = member("901234567V", 35);
    payload["household_id"] = json!(household_id);
    payload["offers_receiving"] = json!("samurdhi");
    let (status, row) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["offers_receiving"], json!(["samurdhi"]));

    let mut payload = member("927654321V", 30);
    payload["household_id"] = json!(household_id);
    payload["offers_receiving"] = json!(["samurdhi", "", "aswesuma"]);
    let (status, row) = common::request(&app, "POST", "/members", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["offers_receiving"], json!(["samurdhi", "aswesuma"]));
}

#[tokio::test]
async fn household_home_details_update() {
    let app = common::test_app();
    let address_id = setup_address(&app).await;
    let (_, body) = common::request(
        &app,
        "POST",
        "/households",
        Some(json!({
            "address_id": address_id,
            "home_details": home_details(),
            "members": [],
        })),
    )
    .await;
    let household_id = common::id_of(&body["household"]);

    let (status, row) = common::request(
        &app,
        "PUT",
        &format!("/households/{}", household_id),
        Some(json!({
            "assessment_number": "A-200",
            "resident_type": "permanent",
            "waste_disposal": "local_council",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["assessment_number"], "A-200");
    assert_eq!(row["resident_type"], "permanent");
}
