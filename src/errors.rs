//! # Error Handling for the Catalog API
//!
//! Every failure leaves the API as an [`ApiError`], which picks the HTTP status,
//! renders the `{ success, status, message }` envelope and logs whatever must
//! not reach the client.
//!
//! Database and upstream failures are logged through `tracing` and replaced by a
//! generic message. Validation failures (bad sort method, missing limit, ...)
//! are raised before any database round trip.
//!
//! ```rust,ignore
//! async fn handler(State(state): State<AppState>) -> Result<Json<ServiceDetail>, ApiError> {
//!     let detail = state.catalog.find_by_id(kind, id).await?; // DbErr converts automatically
//!     Ok(Json(detail))
//! }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// API error type with automatic logging and sanitized responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - invalid query input (sort method, limit, filter value)
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 404 Not Found - a single-resource lookup matched nothing
    NotFound {
        /// Resource type (e.g., "Media partner")
        resource: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 401 Unauthorized - missing or unverifiable credential
    Unauthorized {
        /// User-facing error message
        message: String,
    },

    /// 403 Forbidden - caller is neither owner nor admin
    Forbidden {
        /// User-facing error message
        message: String,
    },

    /// 408 Request Timeout - the handler did not finish in time
    Timeout,

    /// 500 Internal Server Error - database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - an upstream HTTP collaborator failed
    Upstream {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: String,
    },

    /// 500 Internal Server Error - generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 404 Not Found error
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Create a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a 500 error from a database error. The details are logged, never returned.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "Internal server error".to_string(),
            internal: err,
        }
    }

    /// Create a 500 error for a failed upstream call
    pub fn upstream(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            internal: internal.into(),
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Database { .. } | Self::Upstream { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::Timeout => "Request timed out".to_string(),
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Database { message, .. }
            | Self::Upstream { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Upstream { internal, .. } => {
                tracing::error!(details = %internal, "Upstream call failed");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error envelope sent to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Sanitized message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            status: status.as_u16(),
            message: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `RecordNotFound` becomes a 404, every other `DbErr` a sanitized 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => Self::not_found(msg, None),
            other => Self::database(other),
        }
    }
}

/// Malformed path segments (e.g. an id that is not a UUID).
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Query strings serde cannot decode, such as a repeated key.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Missing, mistyped or syntactically broken JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Statement builder errors are programming errors, never caller input.
impl From<sea_orm::sea_query::error::Error> for ApiError {
    fn from(err: sea_orm::sea_query::error::Error) -> Self {
        Self::internal("Internal server error", Some(err.to_string()))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream("Recommendation service unavailable", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("Rental", None).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::upstream("down", "connect refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_body_rejections_become_bad_requests() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::builder()
            .method("PATCH")
            .body(Body::from("{"))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        let err = ApiError::from(rejection);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.user_message().contains("Content-Type"), "{err}");
    }

    #[test]
    fn test_database_details_are_not_exposed() {
        let err = ApiError::database(DbErr::Custom("relation \"media_partner\" does not exist".into()));
        let message = err.user_message();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("media_partner"));
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("Sponsorship", Some("abc".to_string()));
        assert_eq!(err.user_message(), "Sponsorship with ID 'abc' not found");
    }

    #[test]
    fn test_record_not_found_converts_to_404() {
        let err: ApiError = DbErr::RecordNotFound("Rental not found".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::bad_request("Wrong sorting method").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "Wrong sorting method");
    }
}
