//! # Typed API Client
//!
//! A reqwest-based client for the operations API. Callers pass a [`Session`]
//! to every request; the client itself holds no credentials. Resource groups
//! (`client.events()`, `client.cameras()`, ...) mirror the REST surface.
//!
//! ```no_run
//! # async fn demo() -> Result<(), digital_eye::client::ClientError> {
//! use digital_eye::client::{ApiClient, EventQuery, Session};
//! use digital_eye::models::RiskLevel;
//!
//! let client = ApiClient::new("http://localhost:3001")?;
//! let session = Session::new("access-token");
//!
//! let mut query = Some(EventQuery::default().risk_level(RiskLevel::High).limit(50));
//! while let Some(current) = query {
//!     let page = client.events().list(&session, &current).await?;
//!     query = current.next_page(&page.pagination);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::handlers::algorithms::{AlgorithmDto, AlgorithmRequest};
use crate::handlers::cameras::{CameraDto, CameraRequest, CameraStatusDto};
use crate::handlers::events::{EventDto, EventRequest, EventUpdateRequest};
use crate::handlers::notifications::NotificationDto;
use crate::handlers::reports::{ReportDto, ReportRequest};
use crate::handlers::settings::{SettingDto, SettingRequest, SettingsMap};
use crate::handlers::types::{ApiResponse, MessageResponse, PaginatedResponse, Pagination};
use crate::handlers::users::{PermissionsRequest, UserDto, UserUpdateRequest};
use crate::models::{CameraStatus, EventStatus, RiskLevel};
use crate::repositories::EventStats;

/// Errors returned by [`ApiClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A success envelope arrived without `data`
    #[error("Response envelope has no data")]
    MissingData,
}

impl ClientError {
    /// HTTP status for [`ClientError::Api`]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bearer credentials for one caller
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("token", &"***").finish()
    }
}

/// Filters and pagination for event listing, stats and export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub risk_level: Option<RiskLevel>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl EventQuery {
    pub fn status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    pub fn start_date(mut self, start: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    pub fn end_date(mut self, end: impl Into<String>) -> Self {
        self.end_date = Some(end.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs, omitting unset fields
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(risk_level) = self.risk_level {
            pairs.push(("risk_level", risk_level.as_str().to_string()));
        }
        if let Some(start) = &self.start_date {
            pairs.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_date", end.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }

    /// The same query advanced to the page after `pagination`, if any
    pub fn next_page(&self, pagination: &Pagination) -> Option<Self> {
        pagination.next_page().map(|page| Self {
            page: Some(page),
            limit: Some(pagination.limit),
            ..self.clone()
        })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// HTTP client for the operations API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Client for the API served at `base_url` (for example `http://localhost:3001`)
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn algorithms(&self) -> Algorithms<'_> {
        Algorithms { client: self }
    }

    pub fn cameras(&self) -> Cameras<'_> {
        Cameras { client: self }
    }

    pub fn events(&self) -> Events<'_> {
        Events { client: self }
    }

    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings { client: self }
    }

    pub fn notifications(&self) -> Notifications<'_> {
        Notifications { client: self }
    }

    pub fn reports(&self) -> Reports<'_> {
        Reports { client: self }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(self.request_url(method, self.url(path)?, session))
    }

    fn request_url(&self, method: Method, url: Url, session: &Session) -> RequestBuilder {
        tracing::debug!(%method, %url, "API request");
        self.http.request(method, url).bearer_auth(&session.token)
    }

    async fn execute(request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error,
            Err(_) if body.trim().is_empty() => {
                status.canonical_reason().unwrap_or_default().to_string()
            }
            Err(_) => body,
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let envelope: ApiResponse<T> = Self::decode(request).await?;
        envelope.data.ok_or(ClientError::MissingData)
    }

    async fn message(request: RequestBuilder) -> Result<String, ClientError> {
        let envelope: MessageResponse = Self::decode(request).await?;
        Ok(envelope.message)
    }
}

/// `/api/algorithms`
pub struct Algorithms<'c> {
    client: &'c ApiClient,
}

impl Algorithms<'_> {
    pub async fn list(&self, session: &Session) -> Result<Vec<AlgorithmDto>, ClientError> {
        ApiClient::data(self.client.request(Method::GET, "api/algorithms", session)?).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<AlgorithmDto, ClientError> {
        let path = format!("api/algorithms/{id}");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    pub async fn create(
        &self,
        session: &Session,
        algorithm: &AlgorithmRequest,
    ) -> Result<AlgorithmDto, ClientError> {
        let request = self
            .client
            .request(Method::POST, "api/algorithms", session)?
            .json(algorithm);
        ApiClient::data(request).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        algorithm: &AlgorithmRequest,
    ) -> Result<AlgorithmDto, ClientError> {
        let path = format!("api/algorithms/{id}");
        let request = self.client.request(Method::PUT, &path, session)?.json(algorithm);
        ApiClient::data(request).await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, ClientError> {
        let path = format!("api/algorithms/{id}");
        ApiClient::message(self.client.request(Method::DELETE, &path, session)?).await
    }

    /// Flips online/offline, returning the new state
    pub async fn toggle(&self, session: &Session, id: Uuid) -> Result<AlgorithmDto, ClientError> {
        let path = format!("api/algorithms/{id}/toggle");
        ApiClient::data(self.client.request(Method::PATCH, &path, session)?).await
    }
}

/// `/api/cameras`
pub struct Cameras<'c> {
    client: &'c ApiClient,
}

impl Cameras<'_> {
    pub async fn list(
        &self,
        session: &Session,
        status: Option<CameraStatus>,
    ) -> Result<Vec<CameraDto>, ClientError> {
        let mut request = self.client.request(Method::GET, "api/cameras", session)?;
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        ApiClient::data(request).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<CameraDto, ClientError> {
        let path = format!("api/cameras/{id}");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    pub async fn status(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<CameraStatusDto, ClientError> {
        let path = format!("api/cameras/{id}/status");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    pub async fn create(
        &self,
        session: &Session,
        camera: &CameraRequest,
    ) -> Result<CameraDto, ClientError> {
        let request = self
            .client
            .request(Method::POST, "api/cameras", session)?
            .json(camera);
        ApiClient::data(request).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        camera: &CameraRequest,
    ) -> Result<CameraDto, ClientError> {
        let path = format!("api/cameras/{id}");
        let request = self.client.request(Method::PUT, &path, session)?.json(camera);
        ApiClient::data(request).await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, ClientError> {
        let path = format!("api/cameras/{id}");
        ApiClient::message(self.client.request(Method::DELETE, &path, session)?).await
    }
}

/// `/api/events`
pub struct Events<'c> {
    client: &'c ApiClient,
}

impl Events<'_> {
    /// One page of events
    pub async fn list(
        &self,
        session: &Session,
        query: &EventQuery,
    ) -> Result<PaginatedResponse<EventDto>, ClientError> {
        let request = self
            .client
            .request(Method::GET, "api/events", session)?
            .query(&query.to_query_pairs());
        ApiClient::decode(request).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<EventDto, ClientError> {
        let path = format!("api/events/{id}");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    /// Counts over the query's date range; other filters are ignored by the server
    pub async fn stats(
        &self,
        session: &Session,
        query: &EventQuery,
    ) -> Result<EventStats, ClientError> {
        let request = self
            .client
            .request(Method::GET, "api/events/stats", session)?
            .query(&query.to_query_pairs());
        ApiClient::data(request).await
    }

    /// The filtered events as a CSV document
    pub async fn export(&self, session: &Session, query: &EventQuery) -> Result<String, ClientError> {
        let pairs: Vec<_> = query
            .to_query_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "page" && *key != "limit")
            .collect();
        let request = self
            .client
            .request(Method::GET, "api/events/export", session)?
            .query(&pairs);
        let response = ApiClient::execute(request).await?;
        Ok(response.text().await?)
    }

    pub async fn create(
        &self,
        session: &Session,
        event: &EventRequest,
    ) -> Result<EventDto, ClientError> {
        let request = self
            .client
            .request(Method::POST, "api/events", session)?
            .json(event);
        ApiClient::data(request).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        update: &EventUpdateRequest,
    ) -> Result<EventDto, ClientError> {
        let path = format!("api/events/{id}");
        let request = self.client.request(Method::PUT, &path, session)?.json(update);
        ApiClient::data(request).await
    }
}

/// `/api/users`
pub struct Users<'c> {
    client: &'c ApiClient,
}

impl Users<'_> {
    pub async fn list(&self, session: &Session) -> Result<Vec<UserDto>, ClientError> {
        ApiClient::data(self.client.request(Method::GET, "api/users", session)?).await
    }

    pub async fn me(&self, session: &Session) -> Result<UserDto, ClientError> {
        ApiClient::data(self.client.request(Method::GET, "api/users/me", session)?).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<UserDto, ClientError> {
        let path = format!("api/users/{id}");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        update: &UserUpdateRequest,
    ) -> Result<UserDto, ClientError> {
        let path = format!("api/users/{id}");
        let request = self.client.request(Method::PUT, &path, session)?.json(update);
        ApiClient::data(request).await
    }

    pub async fn set_permissions(
        &self,
        session: &Session,
        id: Uuid,
        permissions: &[String],
    ) -> Result<UserDto, ClientError> {
        let path = format!("api/users/{id}/permissions");
        let body = PermissionsRequest {
            permissions: Some(json!(permissions)),
        };
        let request = self.client.request(Method::PATCH, &path, session)?.json(&body);
        ApiClient::data(request).await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, ClientError> {
        let path = format!("api/users/{id}");
        ApiClient::message(self.client.request(Method::DELETE, &path, session)?).await
    }
}

/// `/api/settings`
pub struct Settings<'c> {
    client: &'c ApiClient,
}

impl Settings<'_> {
    pub async fn list(
        &self,
        session: &Session,
        category: Option<&str>,
    ) -> Result<SettingsMap, ClientError> {
        let mut request = self.client.request(Method::GET, "api/settings", session)?;
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        ApiClient::data(request).await
    }

    pub async fn put(
        &self,
        session: &Session,
        key: &str,
        setting: &SettingRequest,
    ) -> Result<SettingDto, ClientError> {
        // Keys are free-form, so push them as an escaped path segment
        let mut url = self.client.url("api/settings/")?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        let request = self
            .client
            .request_url(Method::PUT, url, session)
            .json(setting);
        ApiClient::data(request).await
    }

    /// Upserts all entries in one transaction
    pub async fn put_many(
        &self,
        session: &Session,
        settings: &BTreeMap<String, SettingRequest>,
    ) -> Result<Vec<SettingDto>, ClientError> {
        let request = self
            .client
            .request(Method::PUT, "api/settings", session)?
            .json(settings);
        ApiClient::data(request).await
    }
}

/// `/api/notifications`, always scoped to the session's user
pub struct Notifications<'c> {
    client: &'c ApiClient,
}

impl Notifications<'_> {
    pub async fn list(
        &self,
        session: &Session,
        is_read: Option<bool>,
        limit: Option<u64>,
    ) -> Result<Vec<NotificationDto>, ClientError> {
        let mut pairs = Vec::new();
        if let Some(is_read) = is_read {
            pairs.push(("is_read", is_read.to_string()));
        }
        if let Some(limit) = limit {
            pairs.push(("limit", limit.to_string()));
        }
        let request = self
            .client
            .request(Method::GET, "api/notifications", session)?
            .query(&pairs);
        ApiClient::data(request).await
    }

    pub async fn mark_read(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<NotificationDto, ClientError> {
        let path = format!("api/notifications/{id}/read");
        ApiClient::data(self.client.request(Method::PATCH, &path, session)?).await
    }

    pub async fn mark_all_read(&self, session: &Session) -> Result<String, ClientError> {
        ApiClient::message(
            self.client
                .request(Method::PATCH, "api/notifications/read-all", session)?,
        )
        .await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, ClientError> {
        let path = format!("api/notifications/{id}");
        ApiClient::message(self.client.request(Method::DELETE, &path, session)?).await
    }
}

/// `/api/reports`
pub struct Reports<'c> {
    client: &'c ApiClient,
}

impl Reports<'_> {
    pub async fn list(&self, session: &Session) -> Result<Vec<ReportDto>, ClientError> {
        ApiClient::data(self.client.request(Method::GET, "api/reports", session)?).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<ReportDto, ClientError> {
        let path = format!("api/reports/{id}");
        ApiClient::data(self.client.request(Method::GET, &path, session)?).await
    }

    pub async fn create(
        &self,
        session: &Session,
        report: &ReportRequest,
    ) -> Result<ReportDto, ClientError> {
        let request = self
            .client
            .request(Method::POST, "api/reports", session)?
            .json(report);
        ApiClient::data(request).await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, ClientError> {
        let path = format!("api/reports/{id}");
        ApiClient::message(self.client.request(Method::DELETE, &path, session)?).await
    }
}
