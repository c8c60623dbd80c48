use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or invalid caller input, rejected before any backend call.
    #[error("{0}")]
    Validation(String),

    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Malformed backend response: {0}")]
    Decode(String),

    /// The backend answered with `status=error`.
    #[error("Backend rejected query ({error_type}): {message}")]
    Upstream { error_type: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    /// Short label used for the failure counters.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::Transport(_) => "transport",
            GatewayError::Decode(_) => "decode",
            GatewayError::Upstream { .. } => "upstream",
            GatewayError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = GatewayError::validation("Namespace parameter is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Namespace parameter is required");
    }

    #[test]
    fn backend_failures_map_to_internal_server_error() {
        let errors = [
            GatewayError::Transport("connection refused".into()),
            GatewayError::Decode("expected value at line 1".into()),
            GatewayError::Upstream {
                error_type: "bad_data".into(),
                message: "parse error".into(),
            },
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn upstream_message_carries_backend_detail() {
        let err = GatewayError::Upstream {
            error_type: "bad_data".into(),
            message: "1:5: parse error: unexpected end of input".into(),
        };
        assert_eq!(
            err.to_string(),
            "Backend rejected query (bad_data): 1:5: parse error: unexpected end of input"
        );
        assert_eq!(err.reason(), "upstream");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: GatewayError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
