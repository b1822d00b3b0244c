//! API error type rendered into the response envelope.
//!
//! Every article error keeps the historical conflated `400 Bad Request`
//! status; only faults of the request worker itself surface as `500`.

use article_core::ArticleError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use thiserror::Error;

use crate::envelope::Envelope;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Any failure reported by the article service (400).
    #[error(transparent)]
    Article(#[from] ArticleError),

    /// No route matches the request (404).
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// The path exists but not for this method (405).
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The blocking request worker panicked or was cancelled (500).
    /// The message is logged, never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Article(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Article(ArticleError::InvalidInput(_)) => "invalid_input",
            Self::Article(ArticleError::ValidationFailed(_)) => "validation_failed",
            Self::Article(ArticleError::DuplicateTitle(_)) => "duplicate_title",
            Self::Article(ArticleError::NotFound(_)) => "not_found",
            Self::Article(ArticleError::Store(_)) => "store_error",
            Self::RouteNotFound(_) => "route_not_found",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error_code();

        let message = match &self {
            Self::Internal(_) => {
                error!(
                    "event=http_error module=api status=error error_code={} error={}",
                    code, self
                );
                "an internal error occurred".to_string()
            }
            Self::Article(ArticleError::Store(_)) => {
                error!(
                    "event=http_error module=api status=error error_code={} error={}",
                    code, self
                );
                self.to_string()
            }
            other => {
                warn!(
                    "event=http_error module=api status=error error_code={} error={}",
                    code, other
                );
                other.to_string()
            }
        };

        Envelope::failure(message).with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use article_core::{ArticleError, ArticleKey};
    use axum::http::StatusCode;

    #[test]
    fn article_errors_keep_conflated_bad_request() {
        let errors = [
            ArticleError::InvalidInput("bad id".to_string()),
            ArticleError::DuplicateTitle("Money".to_string()),
            ArticleError::NotFound(ArticleKey::Id(7)),
        ];
        for err in errors {
            assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn unmatched_method_is_method_not_allowed() {
        let err = ApiError::MethodNotAllowed("PATCH /article/1".to_string());
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "method not allowed: PATCH /article/1");
    }

    #[test]
    fn worker_faults_are_internal() {
        let err = ApiError::Internal("task panicked".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn article_error_message_passes_through() {
        let err = ApiError::from(ArticleError::NotFound(ArticleKey::Id(7)));
        assert_eq!(err.to_string(), "article not found: id=7");
    }
}
