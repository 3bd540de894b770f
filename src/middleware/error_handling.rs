use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Request-level failure taxonomy.
///
/// Validation failures are produced before any store access and map to 400.
/// Not-found is a status, not an error: the body is whatever the endpoint's
/// documented empty-result contract says. Store failures surface the
/// database-native message under `details`; anything else is an unexpected
/// error. Store errors are also logged server-side at the boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{error}: {message}")]
    BadRequest { error: &'static str, message: String },

    #[error("invalid date format: {details}")]
    InvalidDate { details: String },

    #[error("not found")]
    NotFound(serde_json::Value),

    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn database(context: &'static str, source: sqlx::Error) -> Self {
        AppError::Database { context, source }
    }

    pub fn bad_request(error: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            error,
            message: message.into(),
        }
    }

    pub fn missing_parameters(message: impl Into<String>) -> Self {
        Self::bad_request("Missing required parameters", message)
    }

    pub fn invalid_date(details: impl Into<String>) -> Self {
        AppError::InvalidDate {
            details: details.into(),
        }
    }

    pub fn not_found(body: serde_json::Value) -> Self {
        AppError::NotFound(body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database { context, source } => {
                tracing::error!("Database error: {:?}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": context, "details": source.to_string() }),
                )
            }
            AppError::BadRequest { error, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": error, "message": message }),
            ),
            AppError::InvalidDate { details } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid date format", "details": details }),
            ),
            AppError::NotFound(body) => (StatusCode::NOT_FOUND, body),
            AppError::Unexpected(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred", "details": err.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response =
            AppError::missing_parameters("Please provide both 'startdate' and 'enddate'.")
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_carries_the_endpoint_body() {
        let response = AppError::not_found(json!({ "message": "No record found" })).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_date_maps_to_400() {
        let err = crate::models::parse_iso_date("not-a-date").unwrap_err();
        let response = AppError::invalid_date(err.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
