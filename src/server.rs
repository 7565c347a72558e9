//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Digital
//! Eye operations API.

use std::sync::Arc;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, patch, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::authenticate;
use crate::config::AppConfig;
use crate::error::{ApiError, not_found, set_expose_internal_errors};
use crate::handlers::{self, algorithms, cameras, events, notifications, reports, settings, users};
use crate::identity::IdentityProvider;
use crate::policy::authorize;
use crate::telemetry::{TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    set_expose_internal_errors(state.config.exposes_internal_errors());
    let cors = cors_layer(&state.config);

    // Layers run bottom-up: authentication before the role gate. Route layers
    // only wrap matched routes, so unknown paths fall through to the 404.
    let api = Router::new()
        .route(
            "/api/algorithms",
            get(algorithms::list_algorithms).post(algorithms::create_algorithm),
        )
        .route(
            "/api/algorithms/{id}",
            get(algorithms::get_algorithm)
                .put(algorithms::update_algorithm)
                .delete(algorithms::delete_algorithm),
        )
        .route(
            "/api/algorithms/{id}/toggle",
            patch(algorithms::toggle_algorithm),
        )
        .route(
            "/api/cameras",
            get(cameras::list_cameras).post(cameras::create_camera),
        )
        .route(
            "/api/cameras/{id}",
            get(cameras::get_camera)
                .put(cameras::update_camera)
                .delete(cameras::delete_camera),
        )
        .route("/api/cameras/{id}/status", get(cameras::get_camera_status))
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/events/stats", get(events::event_stats))
        .route("/api/events/export", get(events::export_events))
        .route(
            "/api/events/{id}",
            get(events::get_event).put(events::update_event),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::current_user))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/users/{id}/permissions",
            patch(users::update_permissions),
        )
        .route(
            "/api/settings",
            get(settings::list_settings).put(settings::update_settings),
        )
        .route("/api/settings/{key}", put(settings::update_setting))
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/read-all",
            patch(notifications::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(notifications::mark_notification_read),
        )
        .route(
            "/api/notifications/{id}",
            axum::routing::delete(notifications::delete_notification),
        )
        .route(
            "/api/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route(
            "/api/reports/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .fallback(route_not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

async fn route_not_found() -> ApiError {
    not_found("Route not found")
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = HeaderValue::from_str(&config.cors_origin).ok();
    if origin.is_none() {
        tracing::warn!(cors_origin = %config.cors_origin, "CORS origin is not a valid header value; cross-origin requests will be rejected");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, TRACE_ID_HEADER.clone()])
        .expose_headers([TRACE_ID_HEADER.clone()])
        .allow_credentials(true)
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    identity: Arc<dyn IdentityProvider>,
) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    let state = AppState {
        config: Arc::new(config),
        db,
        identity,
    };
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::algorithms::list_algorithms,
        crate::handlers::algorithms::get_algorithm,
        crate::handlers::algorithms::create_algorithm,
        crate::handlers::algorithms::update_algorithm,
        crate::handlers::algorithms::delete_algorithm,
        crate::handlers::algorithms::toggle_algorithm,
        crate::handlers::cameras::list_cameras,
        crate::handlers::cameras::get_camera,
        crate::handlers::cameras::get_camera_status,
        crate::handlers::cameras::create_camera,
        crate::handlers::cameras::update_camera,
        crate::handlers::cameras::delete_camera,
        crate::handlers::events::list_events,
        crate::handlers::events::event_stats,
        crate::handlers::events::export_events,
        crate::handlers::events::get_event,
        crate::handlers::events::create_event,
        crate::handlers::events::update_event,
        crate::handlers::users::list_users,
        crate::handlers::users::current_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::update_permissions,
        crate::handlers::users::delete_user,
        crate::handlers::settings::list_settings,
        crate::handlers::settings::update_setting,
        crate::handlers::settings::update_settings,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::notifications::mark_all_notifications_read,
        crate::handlers::notifications::delete_notification,
        crate::handlers::reports::list_reports,
        crate::handlers::reports::get_report,
        crate::handlers::reports::create_report,
        crate::handlers::reports::delete_report,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::error::ErrorBody,
            crate::validation::FieldError,
            crate::handlers::types::MessageResponse,
            crate::handlers::types::Pagination,
            crate::handlers::algorithms::AlgorithmDto,
            crate::handlers::algorithms::AlgorithmRequest,
            crate::handlers::cameras::CameraDto,
            crate::handlers::cameras::CameraStatusDto,
            crate::handlers::cameras::CameraRequest,
            crate::handlers::events::EventDto,
            crate::handlers::events::EventCameraDto,
            crate::handlers::events::EventAlgorithmDto,
            crate::handlers::events::EventRequest,
            crate::handlers::events::EventUpdateRequest,
            crate::repositories::EventStats,
            crate::handlers::users::UserDto,
            crate::handlers::users::UserUpdateRequest,
            crate::handlers::users::PermissionsRequest,
            crate::handlers::settings::SettingEntry,
            crate::handlers::settings::SettingsMap,
            crate::handlers::settings::SettingDto,
            crate::handlers::settings::SettingRequest,
            crate::handlers::notifications::NotificationDto,
            crate::handlers::notifications::NotificationEventDto,
            crate::handlers::reports::ReportDto,
            crate::handlers::reports::ReportRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "algorithms", description = "AI detection algorithms"),
        (name = "cameras", description = "Highway camera feeds"),
        (name = "events", description = "Safety events, stats and CSV export"),
        (name = "users", description = "User profiles and permissions"),
        (name = "settings", description = "System settings"),
        (name = "notifications", description = "Per-user notifications"),
        (name = "reports", description = "Generated reports"),
    ),
    info(
        title = "Digital Eye Operations API",
        description = "Cameras, detection algorithms and safety events for the Smart Highway dashboard",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
