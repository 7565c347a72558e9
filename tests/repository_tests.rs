//! Repository tests against in-memory SQLite

use chrono::DateTime;
use digital_eye::{
    error::RepositoryError,
    models::{EventStatus, RiskLevel, Role},
    repositories::{
        EventFilter, EventLogRepository, NotificationRepository, SettingWrite,
        SystemSettingRepository, UserProfileRepository,
    },
    validation::parse_timestamp,
};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde_json::json;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{seed_event, seed_notification, seed_user, setup_test_db};

#[tokio::test]
async fn events_sort_newest_first_with_stable_ties() {
    let db = setup_test_db().await.unwrap();
    let same_time = "2025-02-01T12:00:00+00:00";
    let a = seed_event(&db, same_time, RiskLevel::Low, EventStatus::Pending).await;
    let b = seed_event(&db, same_time, RiskLevel::Low, EventStatus::Pending).await;
    let newest = seed_event(&db, "2025-02-02T12:00:00+00:00", RiskLevel::Low, EventStatus::Pending).await;

    let repo = EventLogRepository::new(&db);
    let (first, total) = repo.list_page(&EventFilter::default(), 1, 2).await.unwrap();
    let (second, _) = repo.list_page(&EventFilter::default(), 2, 2).await.unwrap();

    assert_eq!(total, 3);
    assert_eq!(first[0].event.id, newest);
    let tied = [first[1].event.id, second[0].event.id];
    assert!(tied.contains(&a) && tied.contains(&b));
    assert_ne!(tied[0], tied[1]);
}

#[tokio::test]
async fn list_page_rejects_zero_page_or_limit() {
    let db = setup_test_db().await.unwrap();
    let repo = EventLogRepository::new(&db);

    assert!(matches!(
        repo.list_page(&EventFilter::default(), 0, 10).await,
        Err(RepositoryError::Validation(_))
    ));
    assert!(matches!(
        repo.list_page(&EventFilter::default(), 1, 0).await,
        Err(RepositoryError::Validation(_))
    ));
}

#[tokio::test]
async fn list_page_rejects_offsets_past_i64() {
    let db = setup_test_db().await.unwrap();
    let repo = EventLogRepository::new(&db);

    assert!(matches!(
        repo.list_page(&EventFilter::default(), u64::MAX, 100).await,
        Err(RepositoryError::Validation(_))
    ));
    assert!(matches!(
        repo.list_page(&EventFilter::default(), 100_000_000_000_000_000, 100).await,
        Err(RepositoryError::Validation(_))
    ));
    let (rows, total) = repo.list_page(&EventFilter::default(), 1_000_000, 100).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn events_with_mixed_offsets_sort_and_filter_by_instant() {
    let db = setup_test_db().await.unwrap();
    let earlier = seed_event(&db, "2025-01-06T09:00:00+08:00", RiskLevel::Low, EventStatus::Pending).await;
    let later = seed_event(&db, "2025-01-06T02:00:00Z", RiskLevel::Low, EventStatus::Pending).await;

    let repo = EventLogRepository::new(&db);
    let (rows, _) = repo.list_page(&EventFilter::default(), 1, 10).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.event.id).collect();
    assert_eq!(ids, [later, earlier]);

    // A non-UTC bound passed straight to the repository still compares by instant
    let filter = EventFilter {
        start: DateTime::parse_from_rfc3339("2025-01-06T09:30:00+08:00").ok(),
        ..Default::default()
    };
    let (rows, total) = repo.list_page(&filter, 1, 10).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].event.id, later);
}

#[tokio::test]
async fn stats_ignore_status_and_risk_filters() {
    let db = setup_test_db().await.unwrap();
    seed_event(&db, "2025-07-01T00:00:00+00:00", RiskLevel::High, EventStatus::Handled).await;
    seed_event(&db, "2025-07-02T00:00:00+00:00", RiskLevel::Medium, EventStatus::Observing).await;

    let filter = EventFilter {
        status: Some(EventStatus::Pending),
        risk_level: Some(RiskLevel::Low),
        start: parse_timestamp("2025-07-01"),
        end: None,
    };
    let stats = EventLogRepository::new(&db).stats(&filter).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_risk_level.high, 1);
    assert_eq!(stats.by_risk_level.medium, 1);
    assert_eq!(stats.by_status.observing, 1);
    assert_eq!(stats.by_status.pending, 0);
}

#[tokio::test]
async fn export_listing_matches_paged_listing() {
    let db = setup_test_db().await.unwrap();
    for day in 10..=14 {
        seed_event(
            &db,
            &format!("2025-08-{day}T06:30:00+00:00"),
            RiskLevel::Medium,
            EventStatus::Pending,
        )
        .await;
    }

    let filter = EventFilter {
        end: parse_timestamp("2025-08-12T23:59:59Z"),
        ..Default::default()
    };
    let repo = EventLogRepository::new(&db);
    let all = repo.list_all(&filter).await.unwrap();
    let (page, total) = repo.list_page(&filter, 1, 100).await.unwrap();

    assert_eq!(all.len(), 3);
    assert_eq!(total, 3);
    assert_eq!(all, page);
}

#[tokio::test]
async fn mark_all_read_only_touches_the_owner() {
    let db = setup_test_db().await.unwrap();
    let owner = seed_user(&db, Role::Viewer).await;
    let other = seed_user(&db, Role::Viewer).await;
    seed_notification(&db, owner, "Fog").await;
    seed_notification(&db, owner, "Ice").await;
    seed_notification(&db, other, "Smoke").await;

    let repo = NotificationRepository::new(&db);
    assert_eq!(repo.mark_all_read(owner).await.unwrap(), 2);
    assert_eq!(repo.mark_all_read(owner).await.unwrap(), 0);

    let others_unread = repo.list_for_user(other, Some(false), 50).await.unwrap();
    assert_eq!(others_unread.len(), 1);
}

#[tokio::test]
async fn deleting_someone_elses_notification_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let owner = seed_user(&db, Role::Viewer).await;
    let id = seed_notification(&db, owner, "Fog").await;

    let repo = NotificationRepository::new(&db);
    assert!(matches!(
        repo.delete(Uuid::new_v4(), id).await,
        Err(RepositoryError::NotFound(_))
    ));
    repo.delete(owner, id).await.unwrap();
}

#[tokio::test]
async fn bulk_settings_are_all_or_nothing() {
    let db = setup_test_db().await.unwrap();
    let admin = seed_user(&db, Role::Admin).await;
    let repo = SystemSettingRepository::new(&db);

    let result = repo
        .upsert_many(
            vec![
                SettingWrite {
                    key: "retention_days".into(),
                    value: json!(30),
                    category: Some("storage".into()),
                    description: None,
                },
                SettingWrite {
                    key: "  ".into(),
                    value: json!(true),
                    category: None,
                    description: None,
                },
            ],
            admin,
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::Validation(_))));
    assert!(repo.list(None).await.unwrap().is_empty());

    let first = repo
        .upsert(
            SettingWrite {
                key: "retention_days".into(),
                value: json!(30),
                category: Some("storage".into()),
                description: Some("Days to keep events".into()),
            },
            admin,
        )
        .await
        .unwrap();
    let second = repo
        .upsert(
            SettingWrite {
                key: "retention_days".into(),
                value: json!(60),
                category: None,
                description: None,
            },
            admin,
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.value, json!(60));
    assert_eq!(second.category.as_deref(), Some("storage"));
}

#[tokio::test]
async fn unknown_stored_roles_read_as_viewer() {
    let db = setup_test_db().await.unwrap();
    let id = seed_user(&db, Role::Operator).await;
    db.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "UPDATE user_profiles SET role = 'supervisor' WHERE id = ?",
        [id.into()],
    ))
    .await
    .unwrap();

    let repo = UserProfileRepository::new(&db);
    assert_eq!(repo.role_of(id).await.unwrap(), Some(Role::Viewer));
    assert_eq!(repo.role_of(Uuid::new_v4()).await.unwrap(), None);
}
