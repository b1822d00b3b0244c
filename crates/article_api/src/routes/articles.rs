//! # Article Routes
//!
//! - `GET    /article`      list, filtered by `category`, `publisher`,
//!   `created_at`, `published_at`
//! - `POST   /article`      create
//! - `GET    /article/:id`  fetch one
//! - `PUT    /article/:id`  partial update
//! - `DELETE /article/:id`  delete, `204` with an empty body
//!
//! Every path also answers with a trailing slash.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;

use article_core::{
    decode_article, encode_article, encode_articles, ArticleError, ArticleId, ArticleListQuery,
};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/article", collection_routes())
        .route("/article/", collection_routes())
        .route("/article/:id", item_routes())
        .route("/article/:id/", item_routes())
}

fn collection_routes() -> MethodRouter<AppState> {
    get(list_articles)
        .post(create_article)
        .fallback(method_not_allowed)
}

fn item_routes() -> MethodRouter<AppState> {
    get(get_article)
        .put(update_article)
        .delete(delete_article)
        .fallback(method_not_allowed)
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{method} {}", uri.path()))
}

/// Builds the list filter from raw query pairs.
///
/// The first value of a repeated key wins; unknown keys are ignored.
fn list_query(pairs: Vec<(String, String)>) -> ArticleListQuery {
    let mut query = ArticleListQuery::default();
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "category" => &mut query.category,
            "publisher" => &mut query.publisher,
            "created_at" => &mut query.created_at,
            "published_at" => &mut query.published_at,
            _ => continue,
        };
        slot.get_or_insert(value);
    }
    query
}

async fn list_articles(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = pairs.map_err(|rejection| invalid_input(rejection.body_text()))?;
    let query = list_query(pairs);

    let articles = state
        .with_article_service(move |service| service.list_from_query(&query))
        .await?;
    Ok(Envelope::success(encode_articles(&articles)).with_status(StatusCode::OK))
}

async fn create_article(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(|rejection| invalid_input(rejection.body_text()))?;
    let candidate = decode_article(&body)
        .map_err(ArticleError::from)?
        .into_new_article();

    let article = state
        .with_article_service(move |service| service.create(candidate))
        .await?;
    Ok(Envelope::success(encode_article(&article)).with_status(StatusCode::CREATED))
}

async fn get_article(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = article_id(id)?;

    let article = state
        .with_article_service(move |service| service.get(id))
        .await?;
    Ok(Envelope::success(encode_article(&article)).with_status(StatusCode::OK))
}

async fn update_article(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let id = article_id(id)?;
    let body = body.map_err(|rejection| invalid_input(rejection.body_text()))?;
    let patch = decode_article(&body)
        .map_err(ArticleError::from)?
        .into_patch();

    let article = state
        .with_article_service(move |service| service.update(id, patch))
        .await?;
    Ok(Envelope::success(encode_article(&article)).with_status(StatusCode::OK))
}

async fn delete_article(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = article_id(id)?;

    state
        .with_article_service(move |service| service.delete(id))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn article_id(raw: Result<Path<String>, PathRejection>) -> Result<ArticleId, ApiError> {
    let Path(raw) = raw.map_err(|rejection| invalid_input(rejection.body_text()))?;
    parse_article_id(&raw).map_err(ApiError::from)
}

/// Accepts plain ASCII digit strings that fit an article id.
fn parse_article_id(raw: &str) -> Result<ArticleId, ArticleError> {
    Some(raw)
        .filter(|raw| !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|raw| raw.parse::<u64>().ok())
        .and_then(|id| ArticleId::try_from(id).ok())
        .ok_or_else(|| {
            ArticleError::InvalidInput(format!(
                "invalid article id `{raw}`: expected a non-negative integer"
            ))
        })
}

fn invalid_input(message: String) -> ApiError {
    ApiError::Article(ArticleError::InvalidInput(message))
}
