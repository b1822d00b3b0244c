//! Shared application state and the per-request service bridge.
//!
//! # Invariants
//! - Each request opens its own SQLite connection on a blocking worker.
//! - Every store statement of a request shares one deadline derived from
//!   the configured request timeout.

use article_core::db::{open_db, DbError};
use article_core::{
    AppConfig, ArticleError, ArticleResult, ArticleService, SqliteArticleStore, StoreError,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
            request_timeout,
        }
    }

    /// Validates the configured driver and migrates the database once.
    pub fn from_config(config: &AppConfig) -> Result<Self, DbError> {
        let db_path = config.db.sqlite_path()?;
        drop(open_db(&db_path)?);
        info!(
            "event=db_ready module=api status=ok path={}",
            db_path.display()
        );
        Ok(Self::new(db_path, config.server.request_timeout()))
    }

    /// Runs `op` against a freshly opened article service on a blocking
    /// worker thread.
    pub async fn with_article_service<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&ArticleService<SqliteArticleStore<'_>>) -> ArticleResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        let deadline = Instant::now() + self.request_timeout;

        let joined = tokio::task::spawn_blocking(move || -> ArticleResult<T> {
            let conn = open_db(db_path.as_path())
                .map_err(|err| ArticleError::Store(StoreError::Db(err)))?;
            let service =
                ArticleService::new(SqliteArticleStore::new(&conn).with_deadline(deadline));
            op(&service)
        })
        .await;

        match joined {
            Ok(result) => result.map_err(ApiError::from),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }
}
