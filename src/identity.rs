//! # Identity Providers
//!
//! Bearer tokens are issued by an external auth service. This module verifies
//! them and yields the authenticated user's id and email. Two implementations
//! are provided:
//!
//! - [`JwtIdentityProvider`] checks HS256 access tokens against the shared
//!   signing secret without a network round trip.
//! - [`RemoteIdentityProvider`] asks the auth service itself via
//!   `GET {auth_url}/user`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

/// Identity attached to a request once its bearer token is verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is malformed, expired, or rejected by the provider
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The provider could not be reached or answered unexpectedly
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum IdentitySetupError {
    #[error("no identity provider configured")]
    NotConfigured,
    #[error("failed to build identity provider HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Verifies bearer tokens issued by the auth service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Access token claims used by the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Auth service user id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Verifies HS256 tokens locally with the shared signing secret
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
            IdentityError::InvalidToken(format!("subject '{}' is not a UUID", data.claims.sub))
        })?;

        Ok(VerifiedIdentity {
            user_id,
            email: data.claims.email,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies tokens by asking the hosted auth service who they belong to
pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(auth_url: &str, api_key: &str) -> Result<Self, IdentitySetupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            user_url: format!("{}/user", auth_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .http
            .get(&self.user_url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Err(IdentityError::InvalidToken(format!(
                "auth service answered {status}"
            )));
        }
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!(
                "auth service answered {status}"
            )));
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed user payload: {e}")))?;

        Ok(VerifiedIdentity {
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Chooses the identity provider from configuration.
///
/// A configured `auth_url` wins over a local JWT secret.
pub fn build_identity_provider(
    config: &AppConfig,
) -> Result<Arc<dyn IdentityProvider>, IdentitySetupError> {
    if let (Some(url), Some(key)) = (&config.auth_url, &config.auth_api_key) {
        tracing::info!(auth_url = %url, "Using remote identity provider");
        return Ok(Arc::new(RemoteIdentityProvider::new(url, key)?));
    }

    if let Some(secret) = &config.auth_jwt_secret {
        tracing::info!("Using local JWT identity provider");
        return Ok(Arc::new(JwtIdentityProvider::new(
            secret,
            config.auth_jwt_audience.as_deref(),
        )));
    }

    Err(IdentitySetupError::NotConfigured)
}
