//! Shared helpers for integration tests
//!
//! Every helper works against an in-memory SQLite database with the full
//! migration set applied, and mints HS256 tokens the test app accepts.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use chrono::{DateTime, FixedOffset, Utc};
use digital_eye::{
    config::AppConfig,
    identity::{AccessClaims, JwtIdentityProvider},
    migration::{Migrator, MigratorTrait},
    models::{EventStatus, RiskLevel, Role},
    repositories::{
        AlgorithmInput, AlgorithmRepository, CameraFeedRepository, CameraInput, EventInput,
        EventLogRepository, NewNotification, NewUserProfile, NotificationRepository,
        UserProfileRepository,
    },
    server::{AppState, create_app},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use serde_json::Value;
use uuid::Uuid;

/// Signing secret shared by the test identity provider and [`token_for`]
#[allow(dead_code)]
pub const TEST_JWT_SECRET: &str = "digital-eye-integration-secret";

/// Sets up an in-memory SQLite database with all migrations applied
///
/// # Returns
/// A `DatabaseConnection` to an isolated database for one test
#[allow(dead_code)]
pub async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Let tests insert rows without seeding every referenced table
    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        "PRAGMA foreign_keys = OFF;".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Application state backed by `db` with a local JWT identity provider
#[allow(dead_code)]
pub fn test_state(db: DatabaseConnection) -> AppState {
    let config = AppConfig {
        profile: "test".to_string(),
        auth_jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        ..Default::default()
    };

    AppState {
        config: Arc::new(config),
        db,
        identity: Arc::new(JwtIdentityProvider::new(TEST_JWT_SECRET, None)),
    }
}

/// Fresh database plus the router serving it
#[allow(dead_code)]
pub async fn setup_test_app() -> (DatabaseConnection, Router) {
    let db = setup_test_db().await.expect("Failed to set up test database");
    let app = create_app(test_state(db.clone()));
    (db, app)
}

/// Mints a valid access token for `user_id`
#[allow(dead_code)]
pub fn token_for(user_id: Uuid) -> String {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        email: Some(format!("{}@digital-eye.test", user_id.simple())),
        aud: None,
        exp: Utc::now().timestamp() + 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Creates a profile with `role` and returns its id
#[allow(dead_code)]
pub async fn seed_user(db: &DatabaseConnection, role: Role) -> Uuid {
    let id = Uuid::new_v4();
    UserProfileRepository::new(db)
        .create(NewUserProfile {
            id,
            email: format!("{}@digital-eye.test", id.simple()),
            name: Some(format!("{} user", role)),
            role,
        })
        .await
        .expect("Failed to seed user profile");
    id
}

#[allow(dead_code)]
pub async fn seed_algorithm(db: &DatabaseConnection, name: &str) -> Uuid {
    AlgorithmRepository::new(db)
        .create(AlgorithmInput {
            name: name.to_string(),
            accuracy: Some(92.5),
            ..Default::default()
        })
        .await
        .expect("Failed to seed algorithm")
        .id
}

#[allow(dead_code)]
pub async fn seed_camera(db: &DatabaseConnection, name: &str, location: &str) -> Uuid {
    CameraFeedRepository::new(db)
        .create(CameraInput {
            name: name.to_string(),
            location: location.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to seed camera")
        .id
}

/// Inserts an event at `time` (RFC 3339)
#[allow(dead_code)]
pub async fn seed_event(
    db: &DatabaseConnection,
    time: &str,
    risk_level: RiskLevel,
    status: EventStatus,
) -> Uuid {
    let time: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339(time).expect("Invalid event time in test");
    EventLogRepository::new(db)
        .create(EventInput {
            time: Some(time),
            location: "K12+300 northbound".to_string(),
            kind: "Lane intrusion".to_string(),
            risk_level,
            status,
            camera_id: None,
            algorithm_id: None,
            description: None,
            snapshot_url: None,
        })
        .await
        .expect("Failed to seed event")
        .id
}

#[allow(dead_code)]
pub async fn seed_notification(db: &DatabaseConnection, user_id: Uuid, title: &str) -> Uuid {
    NotificationRepository::new(db)
        .create(NewNotification {
            user_id,
            title: title.to_string(),
            message: format!("{title} detected"),
            kind: Some("alert".to_string()),
            event_id: None,
        })
        .await
        .expect("Failed to seed notification")
        .id
}

/// Builds a request, attaching a bearer token and JSON body when given
#[allow(dead_code)]
pub fn api_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}
