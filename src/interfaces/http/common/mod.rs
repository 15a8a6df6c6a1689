//! Response envelope and error mapping shared by all handlers

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response wrapper
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty payload for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) | DomainError::Timeout(_) => StatusCode::CONFLICT,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a core failure onto its transport response.
pub fn domain_error(e: DomainError) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

pub fn query_error(rejection: QueryRejection) -> ApiError {
    bad_request(format!("Invalid query: {}", rejection.body_text()))
}

/// Parse a `YYYY-MM-DD` path segment.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| bad_request(format!("Invalid date '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&DomainError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DomainError::not_found("Slot", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DomainError::Conflict("full".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::Timeout("slow".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::Internal("db".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn dates_parse_or_reject() {
        assert_eq!(
            parse_date("2025-07-08").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 8).unwrap()
        );
        let (status, Json(body)) = parse_date("08/07/2025").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
    }

    #[test]
    fn error_envelope_has_no_data() {
        let (_, Json(body)) = domain_error(DomainError::Conflict("slot 3 is full".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["error"], "Conflict: slot 3 is full");
    }
}
