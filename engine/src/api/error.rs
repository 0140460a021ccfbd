use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sdk::errors::{ConductorError, ConductorErrorExt};
use serde_json::json;

use crate::secrets::SecretManager;

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Domain error from the registry or the orchestrator
    #[error(transparent)]
    Conductor(#[from] ConductorError),

    /// Body present but not valid JSON for the endpoint
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conductor(err) => match err {
                ConductorError::Validation(_) => StatusCode::BAD_REQUEST,
                ConductorError::NotFound { .. } => StatusCode::NOT_FOUND,
                ConductorError::AlreadyCompleted(_)
                | ConductorError::TaskBlocked(_)
                | ConductorError::NotAssigned(_) => StatusCode::CONFLICT,
                ConductorError::AssignmentService(_) | ConductorError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ConductorError::Config(_) | ConductorError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn hint(&self) -> &str {
        match self {
            ApiError::Conductor(err) => err.user_hint(),
            ApiError::InvalidBody(_) => "Send a JSON body matching the endpoint's fields",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": SecretManager::scrub(&self.to_string()),
            "hint": self.hint(),
        }));

        (status, body).into_response()
    }
}
