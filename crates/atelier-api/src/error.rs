//! HTTP error mapping
//!
//! Every handler error flows through [`ApiError`], which turns the taxonomy
//! code into a status and a `{ code, message }` body. The mapping is the
//! contract: clients branch on `code`, not on message text.

use atelier_core::AtelierError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub AtelierError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<AtelierError> for ApiError {
    fn from(err: AtelierError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.code() {
            "INVALID_INPUT" | "UNSUPPORTED" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" | "CAMPAIGN_NOT_FOUND" => StatusCode::NOT_FOUND,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "MODIFICATION_FAILED" | "REVISION_FAILED" => StatusCode::UNPROCESSABLE_ENTITY,
            "PUBLISH_FAILED" | "SUGGESTIONS_FAILED" | "INTEGRATION_ERROR" => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "internal error surfaced to caller");
        }
        let body = Json(json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
