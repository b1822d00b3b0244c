//! HTTP surface for the article service.
//!
//! Builds the axum router that dispatches `/article` requests onto
//! [`article_core::ArticleService`], wraps every result in the
//! `{success, data}` envelope, and marks every response as readable from
//! any origin.

pub mod envelope;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, Method, Uri};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::articles::router())
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(state)
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound(format!("{method} {}", uri.path()))
}
