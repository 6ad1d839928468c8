//! Response bodies and error mapping.
//!
//! # Responsibilities
//! - JSON bodies for route and reverse endpoints
//! - Map reverse errors to status codes
//!
//! # Design Decisions
//! - Error bodies share one shape: `{"error": {"code", "message"}}`
//! - `NoMatchingRoute` is 404, `InvalidArgument` is 400

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::routing::TableId;
use crate::urls::ReverseError;

/// Body returned by every configured route.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub table: TableId,
    pub route: String,
    pub subdomain: Option<String>,
    /// The route's own URL, reversed with the request's context.
    pub url: String,
}

/// Body returned by the reverse endpoint.
#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
}

impl IntoResponse for ReverseError {
    fn into_response(self) -> Response {
        let status = match self {
            ReverseError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ReverseError::NoMatchingRoute { .. } => StatusCode::NOT_FOUND,
        };
        let body = ErrorBody {
            error: ErrorInfo {
                code: self.kind(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        let response = ReverseError::InvalidArgument("both".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ReverseError::NoMatchingRoute {
            route: "view".into(),
            reason: "missing".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
