//! Internal error exposure follows the profile of the router being built.
//!
//! The flag is process-wide, so this file holds a single test and runs as
//! its own binary.

use std::sync::Arc;

use axum::http::StatusCode;
use digital_eye::{
    config::AppConfig,
    error::{INTERNAL_ERROR_MESSAGE, expose_internal_errors},
    identity::JwtIdentityProvider,
    models::Role,
    server::{AppState, create_app},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use tower::ServiceExt;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{TEST_JWT_SECRET, api_request, body_json, seed_user, setup_test_db, token_for};

fn state_for_profile(db: DatabaseConnection, profile: &str) -> AppState {
    let config = AppConfig {
        profile: profile.to_string(),
        auth_jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        ..Default::default()
    };
    AppState {
        config: Arc::new(config),
        db,
        identity: Arc::new(JwtIdentityProvider::new(TEST_JWT_SECRET, None)),
    }
}

#[tokio::test]
async fn database_failures_are_masked_only_in_production() {
    let db = setup_test_db().await.unwrap();
    let token = token_for(seed_user(&db, Role::Viewer).await);
    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        "DROP TABLE algorithms;".to_string(),
    ))
    .await
    .unwrap();

    let production = create_app(state_for_profile(db.clone(), "production"));
    assert!(!expose_internal_errors());
    let response = production
        .oneshot(api_request("GET", "/api/algorithms", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);

    let development = create_app(state_for_profile(db, "development"));
    assert!(expose_internal_errors());
    let response = development
        .oneshot(api_request("GET", "/api/algorithms", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("algorithms"));
}
