use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use verity_core::error::{ClientCode, VerityError};

/// Handler error carrying a client-facing code.
#[derive(Debug)]
pub struct ApiError(pub VerityError);

impl From<VerityError> for ApiError {
    fn from(e: VerityError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::Unauthorized => StatusCode::FORBIDDEN,
        ClientCode::NotRegistered => StatusCode::NOT_FOUND,
        ClientCode::AlreadyRegistered => StatusCode::CONFLICT,
        ClientCode::BadRequest
        | ClientCode::InvalidIdentity
        | ClientCode::InvalidSelector
        | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::StaticCallViolation | ClientCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let message = match &self.0 {
            VerityError::Internal(_) => {
                tracing::error!(error = %self.0, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: code.as_str(),
            message,
        };
        (status_for(code), Json(body)).into_response()
    }
}
