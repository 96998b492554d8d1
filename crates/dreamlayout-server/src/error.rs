use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dreamlayout_generator::{GeneratorError, MalformedResponse};
use dreamlayout_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing project and someone else's project look the same.
    #[error("Project not found or access denied")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("The model returned an unreadable layout: {}", .0.reason)]
    Malformed(MalformedResponse),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::AccessDenied => ServerError::NotFound,
            StoreError::Conflict(msg) => ServerError::Conflict(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<GeneratorError> for ServerError {
    fn from(err: GeneratorError) -> Self {
        if err.is_upstream() {
            ServerError::Upstream(err.to_string())
        } else {
            ServerError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Malformed(malformed) => {
                let body = serde_json::json!({
                    "error": self.to_string(),
                    "raw_content": malformed.raw,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
            }
            ServerError::Upstream(detail) => {
                tracing::error!(error = %detail, "upstream call failed");
                (StatusCode::BAD_GATEWAY, "Layout generation failed".to_string())
            }
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_and_missing_are_merged() {
        assert!(matches!(ServerError::from(StoreError::NotFound), ServerError::NotFound));
        assert!(matches!(ServerError::from(StoreError::AccessDenied), ServerError::NotFound));
        assert_eq!(
            ServerError::NotFound.to_string(),
            "Project not found or access denied"
        );
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServerError::NotFound, StatusCode::NOT_FOUND),
            (ServerError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServerError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServerError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServerError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
            (
                ServerError::Malformed(MalformedResponse {
                    reason: "bad".into(),
                    raw: "raw".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_generator_errors() {
        let config = GeneratorError::Configuration("no key".into());
        assert!(matches!(ServerError::from(config), ServerError::Internal(_)));

        let api = GeneratorError::Api { status: 500, message: "boom".into() };
        assert!(matches!(ServerError::from(api), ServerError::Upstream(_)));
    }
}
