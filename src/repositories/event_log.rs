//! # Event Log Repository
//!
//! Filtered, paginated and exportable queries over safety events. Listings
//! always sort newest first by `time`, breaking ties on `id` so pages are
//! stable. Referenced cameras and algorithms are resolved with one batched
//! lookup per page rather than per row.

use std::collections::{HashMap, HashSet};

use crate::error::RepositoryError;
use crate::models::algorithm::{self, Entity as Algorithm};
use crate::models::camera_feed::{self, Entity as CameraFeed};
use crate::models::event_log::{self, ActiveModel as EventLogActiveModel, Entity as EventLog};
use crate::models::{EventStatus, RiskLevel};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Filters shared by the listing, stats and export queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub risk_level: Option<RiskLevel>,
    /// Inclusive lower bound on `time`
    pub start: Option<DateTimeWithTimeZone>,
    /// Inclusive upper bound on `time`
    pub end: Option<DateTimeWithTimeZone>,
}

impl EventFilter {
    /// Same date range, without the status and risk filters
    pub fn date_range_only(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            ..Self::default()
        }
    }

    fn apply(&self, mut query: Select<EventLog>) -> Select<EventLog> {
        if let Some(status) = self.status {
            query = query.filter(event_log::Column::Status.eq(status.as_str()));
        }
        if let Some(risk_level) = self.risk_level {
            query = query.filter(event_log::Column::RiskLevel.eq(risk_level.as_str()));
        }
        if let Some(start) = self.start {
            query = query.filter(event_log::Column::Time.gte(in_utc(start)));
        }
        if let Some(end) = self.end {
            query = query.filter(event_log::Column::Time.lte(in_utc(end)));
        }
        query
    }
}

/// SQLite compares stored times as text, so every time is kept at UTC
fn in_utc(time: DateTimeWithTimeZone) -> DateTimeWithTimeZone {
    time.with_timezone(&Utc).fixed_offset()
}

fn newest_first(query: Select<EventLog>) -> Select<EventLog> {
    query
        .order_by_desc(event_log::Column::Time)
        .order_by_desc(event_log::Column::Id)
}

/// Camera columns embedded in event responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraRef {
    pub name: String,
    pub location: String,
}

/// Algorithm columns embedded in event responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmRef {
    pub name: String,
}

/// An event with its camera and algorithm resolved
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event: event_log::Model,
    pub camera: Option<CameraRef>,
    pub algorithm: Option<AlgorithmRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RiskLevelCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub handled: u64,
    pub pending: u64,
    pub observing: u64,
}

/// Aggregate counts over a date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: u64,
    pub by_risk_level: RiskLevelCounts,
    pub by_status: StatusCounts,
}

/// Validated fields for a new event
#[derive(Debug, Clone)]
pub struct EventInput {
    /// Defaults to now
    pub time: Option<DateTimeWithTimeZone>,
    pub location: String,
    pub kind: String,
    pub risk_level: RiskLevel,
    pub status: EventStatus,
    pub camera_id: Option<Uuid>,
    pub algorithm_id: Option<Uuid>,
    pub description: Option<String>,
    pub snapshot_url: Option<String>,
}

pub struct EventLogRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EventLogRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// One page of filtered events plus the total number of matching rows.
    ///
    /// `page` is 1-based; `limit` must be positive.
    pub async fn list_page(
        &self,
        filter: &EventFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<EventRecord>, u64), RepositoryError> {
        if page == 0 || limit == 0 {
            return Err(RepositoryError::validation_error(
                "page and limit must be positive",
            ));
        }
        let offset_fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !offset_fits {
            return Err(RepositoryError::validation_error("page is out of range"));
        }

        let paginator = newest_first(filter.apply(EventLog::find())).paginate(self.db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let events = paginator
            .fetch_page(page - 1)
            .await
            .map_err(RepositoryError::database_error)?;

        let records = self.attach_refs(events).await?;
        Ok((records, total))
    }

    /// Every filtered event in listing order, for export
    pub async fn list_all(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, RepositoryError> {
        let events = newest_first(filter.apply(EventLog::find()))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.attach_refs(events).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EventRecord>, RepositoryError> {
        let event = EventLog::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        match event {
            Some(event) => Ok(self.attach_refs(vec![event]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Counts by risk level and status, honouring only the filter's date range
    pub async fn stats(&self, filter: &EventFilter) -> Result<EventStats, RepositoryError> {
        let filter = filter.date_range_only();

        let total = filter
            .apply(EventLog::find())
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let by_risk: Vec<(String, i64)> = filter
            .apply(EventLog::find())
            .select_only()
            .column(event_log::Column::RiskLevel)
            .column_as(event_log::Column::Id.count(), "count")
            .group_by(event_log::Column::RiskLevel)
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let by_status: Vec<(String, i64)> = filter
            .apply(EventLog::find())
            .select_only()
            .column(event_log::Column::Status)
            .column_as(event_log::Column::Id.count(), "count")
            .group_by(event_log::Column::Status)
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let mut stats = EventStats {
            total,
            ..EventStats::default()
        };
        for (level, count) in by_risk {
            let count = u64::try_from(count).unwrap_or_default();
            match level.parse::<RiskLevel>() {
                Ok(RiskLevel::High) => stats.by_risk_level.high = count,
                Ok(RiskLevel::Medium) => stats.by_risk_level.medium = count,
                Ok(RiskLevel::Low) => stats.by_risk_level.low = count,
                Err(_) => tracing::warn!(risk_level = %level, "Unknown risk level in event_logs"),
            }
        }
        for (status, count) in by_status {
            let count = u64::try_from(count).unwrap_or_default();
            match status.parse::<EventStatus>() {
                Ok(EventStatus::Handled) => stats.by_status.handled = count,
                Ok(EventStatus::Pending) => stats.by_status.pending = count,
                Ok(EventStatus::Observing) => stats.by_status.observing = count,
                Err(_) => tracing::warn!(status = %status, "Unknown status in event_logs"),
            }
        }

        Ok(stats)
    }

    pub async fn create(&self, input: EventInput) -> Result<event_log::Model, RepositoryError> {
        if let Some(camera_id) = input.camera_id
            && CameraFeed::find_by_id(camera_id)
                .one(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .is_none()
        {
            return Err(RepositoryError::validation_error(
                "camera_id does not reference an existing camera",
            ));
        }
        if let Some(algorithm_id) = input.algorithm_id
            && Algorithm::find_by_id(algorithm_id)
                .one(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .is_none()
        {
            return Err(RepositoryError::validation_error(
                "algorithm_id does not reference an existing algorithm",
            ));
        }

        let now = Utc::now();
        let event = EventLogActiveModel {
            id: Set(Uuid::new_v4()),
            time: Set(input.time.map_or_else(|| now.into(), in_utc)),
            location: Set(input.location),
            kind: Set(input.kind),
            risk_level: Set(input.risk_level.as_str().to_string()),
            status: Set(input.status.as_str().to_string()),
            camera_id: Set(input.camera_id),
            algorithm_id: Set(input.algorithm_id),
            description: Set(input.description),
            snapshot_url: Set(input.snapshot_url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        event
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Updates the handling state; nothing else about an event is editable
    pub async fn update_status(
        &self,
        id: Uuid,
        status: Option<EventStatus>,
        description: Option<String>,
    ) -> Result<event_log::Model, RepositoryError> {
        let existing = EventLog::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Event not found"))?;

        let mut active = existing.into_active_model();
        if let Some(status) = status {
            active.status = Set(status.as_str().to_string());
        }
        if description.is_some() {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn attach_refs(
        &self,
        events: Vec<event_log::Model>,
    ) -> Result<Vec<EventRecord>, RepositoryError> {
        let camera_ids: HashSet<Uuid> = events.iter().filter_map(|e| e.camera_id).collect();
        let algorithm_ids: HashSet<Uuid> = events.iter().filter_map(|e| e.algorithm_id).collect();

        let cameras: HashMap<Uuid, CameraRef> = if camera_ids.is_empty() {
            HashMap::new()
        } else {
            CameraFeed::find()
                .filter(camera_feed::Column::Id.is_in(camera_ids))
                .all(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .into_iter()
                .map(|camera| {
                    (
                        camera.id,
                        CameraRef {
                            name: camera.name,
                            location: camera.location,
                        },
                    )
                })
                .collect()
        };

        let algorithms: HashMap<Uuid, AlgorithmRef> = if algorithm_ids.is_empty() {
            HashMap::new()
        } else {
            Algorithm::find()
                .filter(algorithm::Column::Id.is_in(algorithm_ids))
                .all(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .into_iter()
                .map(|algorithm| (algorithm.id, AlgorithmRef { name: algorithm.name }))
                .collect()
        };

        Ok(events
            .into_iter()
            .map(|event| EventRecord {
                camera: event.camera_id.and_then(|id| cameras.get(&id).cloned()),
                algorithm: event.algorithm_id.and_then(|id| algorithms.get(&id).cloned()),
                event,
            })
            .collect())
    }
}
