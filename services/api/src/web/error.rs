//! services/api/src/web/error.rs
//!
//! Maps port errors onto HTTP statuses and the JSON error body the client
//! renders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use somnova_core::ports::PortError;
use tracing::error;
use utoipa::ToSchema;

/// The stable error body returned by every failing endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// A port error tagged for HTTP transport.
#[derive(Debug)]
pub struct HttpError(pub PortError);

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PortError::Validation(_) => StatusCode::BAD_REQUEST,
            PortError::Unauthorized => StatusCode::UNAUTHORIZED,
            PortError::NotFound(_) => StatusCode::NOT_FOUND,
            PortError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
