use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storyboard_core::error::CoreError;
use storyboard_pipeline::OrchestratorError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`OrchestratorError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `storyboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A caller mistake reported by the generation orchestrator.
    #[error(transparent)]
    Generation(#[from] OrchestratorError),

    /// The image backend is disabled or unreachable.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(error: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %error, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Io(_)
                | CoreError::Serialization(_)
                | CoreError::Archive(_)
                | CoreError::Internal(_) => internal(core),
            },

            // --- Generation ---
            AppError::Generation(err) => match err {
                OrchestratorError::ShotNotFound(n) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("shot with id {n} not found"),
                ),
                OrchestratorError::AlreadyGenerating(_) => {
                    (StatusCode::CONFLICT, "CONFLICT", err.to_string())
                }
                OrchestratorError::NoShots => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
            },
            AppError::BackendUnavailable(msg) => {
                tracing::error!(error = %msg, "Image backend unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE", msg.clone())
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("background task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    // -- status mapping --

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (AppError::from(CoreError::not_found("project", "x")), StatusCode::NOT_FOUND),
            (AppError::from(CoreError::Validation("bad".into())), StatusCode::BAD_REQUEST),
            (AppError::from(CoreError::Conflict("busy".into())), StatusCode::CONFLICT),
            (
                AppError::from(CoreError::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_of(err), expected);
        }
    }

    #[test]
    fn generation_errors_map_to_statuses() {
        assert_eq!(
            status_of(OrchestratorError::ShotNotFound(3).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(OrchestratorError::AlreadyGenerating(3).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(OrchestratorError::NoShots.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::BackendUnavailable("off".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
