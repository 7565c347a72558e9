//! # Role Authorization
//!
//! One table maps `(route pattern, method)` to the roles allowed to call it,
//! and [`authorize`] is the only place that table is evaluated. Routes
//! without an entry only require authentication.

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use metrics::counter;

use crate::auth::{Caller, CallerRole};
use crate::error::{ApiError, forbidden, unauthorized};
use crate::models::Role;
use crate::repositories::UserProfileRepository;
use crate::server::AppState;

const ADMIN: &[Role] = &[Role::Admin];
const ADMIN_OR_OPERATOR: &[Role] = &[Role::Admin, Role::Operator];

/// Role requirement for one route and method
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    /// Route pattern as registered with the router
    pub path: &'static str,
    pub method: &'static str,
    pub roles: &'static [Role],
}

const fn rule(method: &'static str, path: &'static str, roles: &'static [Role]) -> RoutePolicy {
    RoutePolicy {
        path,
        method,
        roles,
    }
}

pub static POLICIES: &[RoutePolicy] = &[
    rule("POST", "/api/algorithms", ADMIN),
    rule("PUT", "/api/algorithms/{id}", ADMIN),
    rule("DELETE", "/api/algorithms/{id}", ADMIN),
    rule("PATCH", "/api/algorithms/{id}/toggle", ADMIN_OR_OPERATOR),
    rule("POST", "/api/cameras", ADMIN_OR_OPERATOR),
    rule("PUT", "/api/cameras/{id}", ADMIN_OR_OPERATOR),
    rule("DELETE", "/api/cameras/{id}", ADMIN),
    rule("POST", "/api/events", ADMIN_OR_OPERATOR),
    rule("PUT", "/api/events/{id}", ADMIN_OR_OPERATOR),
    rule("GET", "/api/users", ADMIN),
    rule("PATCH", "/api/users/{id}/permissions", ADMIN),
    rule("DELETE", "/api/users/{id}", ADMIN),
    rule("PUT", "/api/settings", ADMIN),
    rule("PUT", "/api/settings/{key}", ADMIN),
    rule("POST", "/api/reports", ADMIN_OR_OPERATOR),
    rule("DELETE", "/api/reports/{id}", ADMIN),
];

/// Roles allowed on a route, or `None` when any authenticated caller may use it
pub fn required_roles(path: &str, method: &Method) -> Option<&'static [Role]> {
    POLICIES
        .iter()
        .find(|policy| policy.path == path && policy.method == method.as_str())
        .map(|policy| policy.roles)
}

/// Why a caller was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MissingProfile,
    RoleNotAllowed(Role),
}

/// Decides whether a caller with `role` (None: no profile) may use the route
pub fn evaluate(allowed: &[Role], role: Option<Role>) -> Result<Role, Denial> {
    match role {
        None => Err(Denial::MissingProfile),
        Some(role) if allowed.contains(&role) => Ok(role),
        Some(role) => Err(Denial::RoleNotAllowed(role)),
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::MissingProfile => forbidden(Some("User profile not found")),
            Denial::RoleNotAllowed(_) => forbidden(Some("Insufficient permissions")),
        }
    }
}

/// Authorization middleware; must run after [`crate::auth::authenticate`]
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(path) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
    else {
        return Ok(next.run(request).await);
    };

    let Some(allowed) = required_roles(&path, request.method()) else {
        return Ok(next.run(request).await);
    };

    let caller = request
        .extensions()
        .get::<Caller>()
        .cloned()
        .ok_or_else(|| unauthorized(None))?;

    let role = UserProfileRepository::new(&state.db)
        .role_of(caller.user_id)
        .await?;

    match evaluate(allowed, role) {
        Ok(role) => {
            request.extensions_mut().insert(CallerRole(role));
            Ok(next.run(request).await)
        }
        Err(denial) => {
            let reason = match denial {
                Denial::MissingProfile => "missing_profile",
                Denial::RoleNotAllowed(_) => "role_not_allowed",
            };
            tracing::info!(
                user_id = %caller.user_id,
                method = %request.method(),
                route = %path,
                reason,
                "Authorization denied"
            );
            counter!("api_authorization_denied_total", "route" => path, "reason" => reason)
                .increment(1);
            Err(denial.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn table_has_no_duplicate_entries() {
        for (i, a) in POLICIES.iter().enumerate() {
            for b in &POLICIES[i + 1..] {
                assert!(
                    !(a.path == b.path && a.method == b.method),
                    "duplicate policy for {} {}",
                    a.method,
                    a.path
                );
            }
        }
    }

    #[test]
    fn lookups_match_route_and_method() {
        assert_eq!(
            required_roles("/api/algorithms", &Method::POST),
            Some(ADMIN)
        );
        assert_eq!(
            required_roles("/api/algorithms/{id}/toggle", &Method::PATCH),
            Some(ADMIN_OR_OPERATOR)
        );
        assert_eq!(required_roles("/api/cameras/{id}", &Method::DELETE), Some(ADMIN));
        assert_eq!(
            required_roles("/api/cameras/{id}", &Method::PUT),
            Some(ADMIN_OR_OPERATOR)
        );
        assert_eq!(required_roles("/api/algorithms", &Method::GET), None);
        assert_eq!(required_roles("/api/users/{id}", &Method::PUT), None);
        assert_eq!(required_roles("/api/users", &Method::GET), Some(ADMIN));
    }

    #[test]
    fn evaluate_distinguishes_missing_profile_from_wrong_role() {
        assert_eq!(evaluate(ADMIN, Some(Role::Admin)), Ok(Role::Admin));
        assert_eq!(evaluate(ADMIN, None), Err(Denial::MissingProfile));
        assert_eq!(
            evaluate(ADMIN_OR_OPERATOR, Some(Role::Viewer)),
            Err(Denial::RoleNotAllowed(Role::Viewer))
        );
        assert_eq!(
            evaluate(ADMIN_OR_OPERATOR, Some(Role::Operator)),
            Ok(Role::Operator)
        );
    }

    #[test]
    fn viewers_are_never_allowed_on_gated_routes() {
        for policy in POLICIES {
            assert!(evaluate(policy.roles, Some(Role::Viewer)).is_err());
            assert!(evaluate(policy.roles, Some(Role::Admin)).is_ok());
        }
    }

    #[test]
    fn denials_map_to_forbidden() {
        let missing: ApiError = Denial::MissingProfile.into();
        assert_eq!(missing.status, StatusCode::FORBIDDEN);
        assert_eq!(missing.message, Box::from("User profile not found"));

        let role: ApiError = Denial::RoleNotAllowed(Role::Viewer).into();
        assert_eq!(role.message, Box::from("Insufficient permissions"));
    }
}
