use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures the relay reports itself. Upstream error responses are not
/// represented here; they are passed through as-is.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("request body must be a JSON object")]
    InvalidJson,
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("invalid chat request: {0}")]
    InvalidRequest(String),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingApiKey | RelayError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::InvalidJson
            | RelayError::MissingFields(_)
            | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RelayError::MissingFields(missing) => {
                tracing::warn!(?missing, "rejected chat request");
                json!({ "error": self.to_string(), "missing": missing })
            }
            RelayError::Transport(err) => {
                tracing::error!(error = %err, "chat relay failed before an upstream response");
                json!({ "error": "Internal server error", "message": err.to_string() })
            }
            RelayError::MissingApiKey => {
                tracing::error!("chat request received but no API key is configured");
                json!({ "error": self.to_string() })
            }
            RelayError::InvalidJson | RelayError::InvalidRequest(_) => {
                tracing::warn!(error = %self, "rejected chat request");
                json!({ "error": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
