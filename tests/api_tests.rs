//! Router-level tests: authentication, the role gate, envelopes and the
//! resource endpoints, driven through `oneshot` against in-memory SQLite.

use std::sync::Arc;

use axum::http::{StatusCode, header};
use digital_eye::{
    config::AppConfig,
    identity::JwtIdentityProvider,
    models::{Algorithm, EventStatus, RiskLevel, Role},
    server::{AppState, create_app},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    TEST_JWT_SECRET, api_request, body_json, body_text, seed_algorithm, seed_camera, seed_event,
    seed_notification, seed_user, setup_test_app, token_for,
};

#[tokio::test]
async fn missing_token_is_rejected_before_touching_the_database() {
    // A disconnected handle fails any query, so a 401 proves none was made
    let state = AppState {
        config: Arc::new(AppConfig::default()),
        db: DatabaseConnection::default(),
        identity: Arc::new(JwtIdentityProvider::new(TEST_JWT_SECRET, None)),
    };
    let app = create_app(state);

    for (method, uri) in [
        ("GET", "/api/algorithms"),
        ("POST", "/api/algorithms"),
        ("GET", "/api/events/export"),
        ("DELETE", "/api/users/6f1c1f6e-0000-4000-8000-000000000001"),
    ] {
        let response = app
            .clone()
            .oneshot(api_request(method, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing or invalid authorization header");
    }
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let (_db, app) = setup_test_app().await;

    let response = app
        .oneshot(api_request("GET", "/api/cameras", Some("not-a-jwt"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or expired token");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn viewer_cannot_create_algorithms() {
    let (db, app) = setup_test_app().await;
    let viewer = seed_user(&db, Role::Viewer).await;

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/algorithms",
            Some(&token_for(viewer)),
            Some(json!({"name": "Smoke detection", "accuracy": 90})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Insufficient permissions");
    assert_eq!(Algorithm::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn gated_route_without_profile_is_forbidden() {
    let (_db, app) = setup_test_app().await;
    let stranger = Uuid::new_v4();

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/cameras",
            Some(&token_for(stranger)),
            Some(json!({"name": "Gantry 4", "location": "K20+100"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "User profile not found");
}

#[tokio::test]
async fn ungated_reads_only_need_a_valid_token() {
    let (db, app) = setup_test_app().await;
    seed_algorithm(&db, "Lane departure").await;

    // No profile at all: reads still succeed
    let response = app
        .oneshot(api_request(
            "GET",
            "/api/algorithms",
            Some(&token_for(Uuid::new_v4())),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "Lane departure");
}

#[tokio::test]
async fn admin_creates_and_toggling_twice_restores_status() {
    let (db, app) = setup_test_app().await;
    let admin = token_for(seed_user(&db, Role::Admin).await);

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/algorithms",
            Some(&admin),
            Some(json!({
                "name": "Pedestrian on carriageway",
                "accuracy": 88.5,
                "status": "online",
                "type": "safety"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["message"], "Algorithm created successfully");
    assert_eq!(created["data"]["type"], "safety");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/algorithms/{id}/toggle");
    let first = body_json(
        app.clone()
            .oneshot(api_request("PATCH", &uri, Some(&admin), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["data"]["status"], "offline");
    assert_eq!(first["message"], "Algorithm disabled successfully");

    let second = body_json(
        app.oneshot(api_request("PATCH", &uri, Some(&admin), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(second["data"]["status"], "online");
    assert_eq!(second["message"], "Algorithm enabled successfully");
}

#[tokio::test]
async fn validation_failures_list_each_field() {
    let (db, app) = setup_test_app().await;
    let admin = token_for(seed_user(&db, Role::Admin).await);

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/algorithms",
            Some(&admin),
            Some(json!({"accuracy": 140, "status": "sleeping"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"accuracy"));
    assert!(fields.contains(&"status"));
}

#[tokio::test]
async fn malformed_ids_and_missing_rows() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);

    let response = app
        .clone()
        .oneshot(api_request("GET", "/api/cameras/not-a-uuid", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(api_request(
            "GET",
            &format!("/api/cameras/{}", Uuid::new_v4()),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Camera not found");
}

#[tokio::test]
async fn operator_manages_cameras_but_cannot_delete_them() {
    let (db, app) = setup_test_app().await;
    let operator = token_for(seed_user(&db, Role::Operator).await);
    let camera = seed_camera(&db, "Gantry 7", "K31+800").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "PUT",
            &format!("/api/cameras/{camera}"),
            Some(&operator),
            Some(json!({"name": "Gantry 7", "location": "K31+800", "status": "offline"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "offline");

    let status = body_json(
        app.clone()
            .oneshot(api_request(
                "GET",
                &format!("/api/cameras/{camera}/status"),
                Some(&operator),
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["data"]["name"], "Gantry 7");
    assert_eq!(status["data"]["status"], "offline");

    let response = app
        .oneshot(api_request(
            "DELETE",
            &format!("/api/cameras/{camera}"),
            Some(&operator),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn event_pages_report_totals() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);
    for day in 1..=5 {
        seed_event(
            &db,
            &format!("2025-03-0{day}T08:00:00+00:00"),
            RiskLevel::High,
            EventStatus::Pending,
        )
        .await;
    }

    let body = body_json(
        app.oneshot(api_request(
            "GET",
            "/api/events?page=2&limit=2",
            Some(&token),
            None,
        ))
        .await
        .unwrap(),
    )
    .await;

    assert_eq!(
        body["pagination"],
        json!({"page": 2, "limit": 2, "total": 5, "totalPages": 3})
    );
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first: page 2 holds March 3rd and 2nd
    assert!(rows[0]["time"].as_str().unwrap().starts_with("2025-03-03"));
    assert!(rows[1]["time"].as_str().unwrap().starts_with("2025-03-02"));
}

#[tokio::test]
async fn out_of_range_pages_are_rejected() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);
    seed_event(&db, "2025-03-01T08:00:00+00:00", RiskLevel::High, EventStatus::Pending).await;

    for page in ["18446744073709551615", "100000000000000000"] {
        let response = app
            .clone()
            .oneshot(api_request(
                "GET",
                &format!("/api/events?page={page}&limit=100"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"][0]["field"], "page");
    }
}

#[tokio::test]
async fn event_times_with_offsets_sort_and_filter_by_instant() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);
    // 01:00Z, recorded with a +08:00 offset
    let earlier = seed_event(&db, "2025-01-06T09:00:00+08:00", RiskLevel::Low, EventStatus::Pending).await;
    let later = seed_event(&db, "2025-01-06T02:00:00Z", RiskLevel::Low, EventStatus::Pending).await;

    let all = body_json(
        app.clone()
            .oneshot(api_request("GET", "/api/events", Some(&token), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(all["data"][0]["id"], later.to_string());
    assert_eq!(all["data"][1]["id"], earlier.to_string());

    let filtered = body_json(
        app.oneshot(api_request(
            "GET",
            "/api/events?start_date=2025-01-06T09:30:00%2B08:00",
            Some(&token),
            None,
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(filtered["pagination"]["total"], 1);
    assert_eq!(filtered["data"][0]["id"], later.to_string());
}

#[tokio::test]
async fn event_filters_and_stats() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);
    seed_event(&db, "2025-04-01T10:00:00+00:00", RiskLevel::High, EventStatus::Pending).await;
    seed_event(&db, "2025-04-02T10:00:00+00:00", RiskLevel::Low, EventStatus::Handled).await;
    seed_event(&db, "2025-05-01T10:00:00+00:00", RiskLevel::High, EventStatus::Observing).await;

    let filtered = body_json(
        app.clone()
            .oneshot(api_request(
                "GET",
                "/api/events?risk_level=high&start_date=2025-04-01&end_date=2025-04-30",
                Some(&token),
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(filtered["pagination"]["total"], 1);
    assert_eq!(filtered["data"][0]["risk_level"], "high");

    let stats = body_json(
        app.clone()
            .oneshot(api_request(
                "GET",
                "/api/events/stats?start_date=2025-04-01&end_date=2025-04-30",
                Some(&token),
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(
        stats["data"],
        json!({
            "total": 2,
            "byRiskLevel": {"high": 1, "medium": 0, "low": 1},
            "byStatus": {"handled": 1, "pending": 1, "observing": 0}
        })
    );

    let response = app
        .oneshot(api_request(
            "GET",
            "/api/events?status=lost",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_always_has_a_header_row() {
    let (db, app) = setup_test_app().await;
    let token = token_for(seed_user(&db, Role::Viewer).await);

    let response = app
        .clone()
        .oneshot(api_request("GET", "/api/events/export", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"events_"));
    assert_eq!(body_text(response).await.lines().count(), 1);

    seed_event(&db, "2025-06-01T00:00:00+00:00", RiskLevel::Medium, EventStatus::Pending).await;
    seed_event(&db, "2025-06-02T00:00:00+00:00", RiskLevel::Low, EventStatus::Handled).await;
    seed_event(&db, "2025-06-03T00:00:00+00:00", RiskLevel::Low, EventStatus::Pending).await;

    let csv = body_text(
        app.oneshot(api_request(
            "GET",
            "/api/events/export?risk_level=low",
            Some(&token),
            None,
        ))
        .await
        .unwrap(),
    )
    .await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("\"2025-06-03"));
    assert!(lines[2].contains("\"handled\""));
}

#[tokio::test]
async fn operator_records_and_updates_events() {
    let (db, app) = setup_test_app().await;
    let operator = token_for(seed_user(&db, Role::Operator).await);
    let camera = seed_camera(&db, "Gantry 2", "K8+050").await;
    let algorithm = seed_algorithm(&db, "Debris detection").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/events",
            Some(&operator),
            Some(json!({
                "location": "K8+050 southbound",
                "type": "Debris",
                "risk_level": "medium",
                "camera_id": camera,
                "algorithm_id": algorithm
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["status"], "pending");
    assert_eq!(created["data"]["camera_feeds"]["name"], "Gantry 2");
    assert_eq!(created["data"]["algorithms"]["name"], "Debris detection");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let updated = body_json(
        app.clone()
            .oneshot(api_request(
                "PUT",
                &format!("/api/events/{id}"),
                Some(&operator),
                Some(json!({"status": "handled", "description": "Cleared by patrol"})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["message"], "Event updated successfully");
    assert_eq!(updated["data"]["status"], "handled");
    assert_eq!(updated["data"]["description"], "Cleared by patrol");

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/events",
            Some(&operator),
            Some(json!({
                "location": "K9",
                "type": "Debris",
                "camera_id": Uuid::new_v4()
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn self_update_cannot_escalate_role() {
    let (db, app) = setup_test_app().await;
    let viewer = seed_user(&db, Role::Viewer).await;
    let token = token_for(viewer);

    let response = app
        .clone()
        .oneshot(api_request(
            "PUT",
            &format!("/api/users/{viewer}"),
            Some(&token),
            Some(json!({"name": "Night shift", "role": "admin", "permissions": ["*"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Night shift");
    assert_eq!(body["data"]["role"], "viewer");
    assert_eq!(body["data"]["permissions"], json!([]));

    let other = seed_user(&db, Role::Viewer).await;
    let response = app
        .oneshot(api_request(
            "PUT",
            &format!("/api/users/{other}"),
            Some(&token),
            Some(json!({"name": "Hijacked"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_other_users() {
    let (db, app) = setup_test_app().await;
    let admin_id = seed_user(&db, Role::Admin).await;
    let admin = token_for(admin_id);
    let target = seed_user(&db, Role::Viewer).await;

    let promoted = body_json(
        app.clone()
            .oneshot(api_request(
                "PUT",
                &format!("/api/users/{target}"),
                Some(&admin),
                Some(json!({"role": "operator"})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(promoted["data"]["role"], "operator");

    let response = app
        .clone()
        .oneshot(api_request(
            "PATCH",
            &format!("/api/users/{target}/permissions"),
            Some(&admin),
            Some(json!({"permissions": "events:export"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Permissions must be an array");

    let response = app
        .clone()
        .oneshot(api_request(
            "DELETE",
            &format!("/api/users/{admin_id}"),
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Cannot delete your own account");

    let response = app
        .clone()
        .oneshot(api_request(
            "DELETE",
            &format!("/api/users/{target}"),
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "User deleted successfully");

    let users = body_json(
        app.oneshot(api_request("GET", "/api/users", Some(&admin), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(users["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn current_user_requires_a_profile() {
    let (db, app) = setup_test_app().await;
    let operator = seed_user(&db, Role::Operator).await;

    let me = body_json(
        app.clone()
            .oneshot(api_request("GET", "/api/users/me", Some(&token_for(operator)), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(me["data"]["id"], operator.to_string());
    assert_eq!(me["data"]["role"], "operator");

    let response = app
        .oneshot(api_request(
            "GET",
            "/api/users/me",
            Some(&token_for(Uuid::new_v4())),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User profile not found");
}

#[tokio::test]
async fn notifications_are_scoped_to_their_owner() {
    let (db, app) = setup_test_app().await;
    let alice = seed_user(&db, Role::Viewer).await;
    let bob = seed_user(&db, Role::Viewer).await;
    let alices = seed_notification(&db, alice, "Fog alert").await;
    seed_notification(&db, alice, "Congestion").await;
    seed_notification(&db, bob, "Wrong-way driver").await;

    let list = body_json(
        app.clone()
            .oneshot(api_request(
                "GET",
                "/api/notifications",
                Some(&token_for(bob)),
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    let titles: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Wrong-way driver"]);

    // Someone else's notification looks missing
    let response = app
        .clone()
        .oneshot(api_request(
            "PATCH",
            &format!("/api/notifications/{alices}/read"),
            Some(&token_for(bob)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(api_request(
            "PATCH",
            "/api/notifications/read-all",
            Some(&token_for(alice)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["message"], "All notifications marked as read");

    let unread = body_json(
        app.oneshot(api_request(
            "GET",
            "/api/notifications?is_read=false",
            Some(&token_for(alice)),
            None,
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(unread["data"], json!([]));
}

#[tokio::test]
async fn settings_bulk_update_and_read_back() {
    let (db, app) = setup_test_app().await;
    let admin = token_for(seed_user(&db, Role::Admin).await);
    let viewer = token_for(seed_user(&db, Role::Viewer).await);

    let response = app
        .clone()
        .oneshot(api_request(
            "PUT",
            "/api/settings",
            Some(&admin),
            Some(json!({
                "alert_threshold": {"value": 0.75, "category": "alerts"},
                "retention_days": {"value": 30, "category": "storage"}
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Settings updated successfully");

    let response = app
        .clone()
        .oneshot(api_request(
            "PUT",
            "/api/settings/retention_days",
            Some(&viewer),
            Some(json!({"value": 1})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(api_request(
            "PUT",
            "/api/settings/retention_days",
            Some(&admin),
            Some(json!({"value": null})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Value is required");

    let alerts = body_json(
        app.oneshot(api_request(
            "GET",
            "/api/settings?category=alerts",
            Some(&viewer),
            None,
        ))
        .await
        .unwrap(),
    )
    .await;
    let map = alerts["data"].as_object().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["alert_threshold"]["value"], json!(0.75));
}

#[tokio::test]
async fn reports_record_their_author() {
    let (db, app) = setup_test_app().await;
    let operator_id = seed_user(&db, Role::Operator).await;
    let operator = token_for(operator_id);

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/reports",
            Some(&operator),
            Some(json!({
                "title": "April incident summary",
                "type": "monthly",
                "date_range_start": "2025-04-01T00:00:00Z",
                "date_range_end": "2025-04-30T23:59:59Z"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["generated_by"], operator_id.to_string());
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(api_request(
            "DELETE",
            &format!("/api/reports/{id}"),
            Some(&operator),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let (_db, app) = setup_test_app().await;

    let response = app
        .oneshot(api_request("GET", "/api/does-not-exist", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn trace_id_is_echoed_or_generated() {
    let (_db, app) = setup_test_app().await;

    let mut request = api_request("GET", "/health", None, None);
    request
        .headers_mut()
        .insert("x-trace-id", "ops-console-42".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-trace-id"], "ops-console-42");

    let response = app
        .oneshot(api_request("GET", "/api/algorithms", None, None))
        .await
        .unwrap();
    let generated = response.headers()["x-trace-id"].to_str().unwrap().to_string();
    assert!(!generated.is_empty());
    let body = body_json(response).await;
    assert_eq!(body["trace_id"], generated);
}
