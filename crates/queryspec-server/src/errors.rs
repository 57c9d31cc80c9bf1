use crate::metrics::ERRORS_TOTAL;
use crate::params::ParamError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use queryspec_core::{SpecError, StoreError, ValidationError};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("forecast {0} was not found")]
    NotFound(i64),
    #[error("Request Canceled")]
    Cancelled,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cancelled => ApiError::Cancelled,
            other => ApiError::Store(other),
        }
    }
}

impl From<queryspec_core::Error> for ApiError {
    fn from(e: queryspec_core::Error) -> Self {
        match e {
            queryspec_core::Error::Spec(e) => e.into(),
            queryspec_core::Error::Store(e) => e.into(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Spec(_) | ApiError::Params(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Cancelled => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Problem-details body; server faults never echo their cause to the client.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_id = Uuid::new_v4();
        ERRORS_TOTAL.with_label_values(&[status.as_str()]).inc();
        let detail = if status.is_server_error() {
            error!(%error_id, error = %self, "request failed");
            "An unexpected error occurred.".to_string()
        } else {
            warn!(%error_id, error = %self, status = status.as_u16(), "request rejected");
            self.to_string()
        };
        let title = match &self {
            ApiError::Cancelled => "Request Canceled",
            _ => status.canonical_reason().unwrap_or("Error"),
        };
        (
            status,
            Json(json!({
                "status": status.as_u16(),
                "title": title,
                "detail": detail,
                "errorId": error_id,
            })),
        )
            .into_response()
    }
}
