//! Request validation helpers.
//!
//! Validation collects every failing field before responding, so a client
//! sees all problems at once. Failures become a 400 with
//! `details: [{field, message}]`.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, field_error, validation_error};
use crate::models::ParseStatusError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;
/// Largest page whose row offset still fits a signed 64-bit SQL bind
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// One failing field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulates field failures across a request
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(())` when nothing failed, otherwise the 400 response
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let details = serde_json::to_value(&self.errors).unwrap_or(Value::Null);
        Err(validation_error("Validation error", details))
    }

    /// Records a missing or blank required string
    pub fn required(&mut self, field: &str, value: Option<&str>) {
        match value {
            None => self.push(field, format!("\"{field}\" is required")),
            Some(v) if v.trim().is_empty() => {
                self.push(field, format!("\"{field}\" is not allowed to be empty"))
            }
            Some(_) => {}
        }
    }

    /// Checks the character count of an optional string
    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value
            && v.chars().count() > max
        {
            self.push(
                field,
                format!("\"{field}\" length must be less than or equal to {max} characters long"),
            );
        }
    }

    pub fn range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        match value {
            Some(v) if !v.is_finite() => self.push(field, format!("\"{field}\" must be a number")),
            Some(v) if v < min => self.push(
                field,
                format!("\"{field}\" must be greater than or equal to {min}"),
            ),
            Some(v) if v > max => self.push(
                field,
                format!("\"{field}\" must be less than or equal to {max}"),
            ),
            _ => {}
        }
    }

    /// Requires an absolute URI when the value is present
    pub fn uri(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value
            && url::Url::parse(v).is_err()
        {
            self.push(field, format!("\"{field}\" must be a valid uri"));
        }
    }

    /// Parses an optional enum-valued string, recording a failure on mismatch
    pub fn one_of<E>(&mut self, field: &str, value: Option<&str>) -> Option<E>
    where
        E: FromStr<Err = ParseStatusError>,
    {
        let raw = value?;
        match raw.parse::<E>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.push(
                    field,
                    format!("\"{field}\" must be one of [{}]", err.expected.join(", ")),
                );
                None
            }
        }
    }

    pub fn uuid(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        let raw = value?;
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, format!("\"{field}\" must be a valid GUID"));
                None
            }
        }
    }

    /// Parses a timestamp filter; see [`parse_timestamp`]
    pub fn timestamp(&mut self, field: &str, value: Option<&str>) -> Option<DateTime<FixedOffset>> {
        let raw = value.filter(|v| !v.is_empty())?;
        match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            None => {
                self.push(field, format!("\"{field}\" must be a valid date"));
                None
            }
        }
    }

    /// Parses a positive integer query parameter bounded by `max`
    pub fn bounded_u64(
        &mut self,
        field: &str,
        value: Option<&str>,
        default: u64,
        max: Option<u64>,
    ) -> u64 {
        let Some(raw) = value.filter(|v| !v.is_empty()) else {
            return default;
        };
        match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => {
                self.push(field, format!("\"{field}\" must be a positive integer"));
                default
            }
            Ok(n) => match max {
                Some(max) if n > max => {
                    self.push(
                        field,
                        format!("\"{field}\" must be less than or equal to {max}"),
                    );
                    default
                }
                _ => n,
            },
        }
    }
}

/// Parses a path id, answering 400 on field `id` when it is not a UUID
pub fn parse_path_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| field_error("id", "\"id\" must be a valid GUID"))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
///
/// A bare date means midnight UTC at the start of that day. Results are
/// normalized to UTC so they compare correctly against stored event times.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).fixed_offset());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc).fixed_offset())
}

/// Page and limit for list endpoints, validated against `1..=MAX_PAGE` and `1..=100`
pub fn page_params(errors: &mut FieldErrors, page: Option<&str>, limit: Option<&str>) -> (u64, u64) {
    let page = errors.bounded_u64("page", page, DEFAULT_PAGE, Some(MAX_PAGE));
    let limit = errors.bounded_u64("limit", limit, DEFAULT_LIMIT, Some(MAX_LIMIT));
    (page, limit)
}
