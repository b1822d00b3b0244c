//! Article use-case service.
//!
//! # Responsibility
//! - Validate candidates and enforce title uniqueness.
//! - Resolve category/publisher names before any article write.
//! - Merge partial updates onto the stored article.
//!
//! # Invariants
//! - No store write happens after a validation or decoding failure.
//! - Lookup resolution always completes before the article row is written.
//! - Errors are returned to the caller unchanged in kind; nothing is retried.

use crate::codec::article_codec::{parse_timestamp, CodecError};
use crate::model::article::{
    Article, ArticleFilter, ArticleId, ArticleKey, ArticlePatch, ArticleValidationError,
    NewArticle, PublishedAtPatch,
};
use crate::model::lookup::{LookupEntity, LookupKind};
use crate::repo::article_store::{ArticleStore, ArticleWrite, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ArticleResult<T> = Result<T, ArticleError>;

/// Error taxonomy surfaced by every article operation.
#[derive(Debug)]
pub enum ArticleError {
    /// Malformed body, id, or date string.
    InvalidInput(String),
    /// A required field is missing or empty.
    ValidationFailed(ArticleValidationError),
    /// Another article already owns this title.
    DuplicateTitle(String),
    NotFound(ArticleKey),
    Store(StoreError),
}

impl Display for ArticleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::ValidationFailed(err) => write!(f, "{err}"),
            Self::DuplicateTitle(title) => write!(f, "title already exists: `{title}`"),
            Self::NotFound(key) => write!(f, "article not found: {key}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArticleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ArticleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(key) => Self::NotFound(key),
            StoreError::TitleConflict(title) => Self::DuplicateTitle(title),
            other => Self::Store(other),
        }
    }
}

impl From<CodecError> for ArticleError {
    fn from(value: CodecError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<ArticleValidationError> for ArticleError {
    fn from(value: ArticleValidationError) -> Self {
        Self::ValidationFailed(value)
    }
}

/// Raw list filter as it arrives from a query string.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleListQuery {
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub created_at: Option<String>,
    pub published_at: Option<String>,
}

impl ArticleListQuery {
    /// Parses date fields; fails with `InvalidInput` on a malformed date.
    pub fn to_filter(&self) -> ArticleResult<ArticleFilter> {
        Ok(ArticleFilter {
            title: None,
            category: non_empty(self.category.as_deref()).map(str::to_string),
            publisher: non_empty(self.publisher.as_deref()).map(str::to_string),
            created_at: non_empty(self.created_at.as_deref())
                .map(|value| parse_timestamp("created_at", value))
                .transpose()?,
            published_at: non_empty(self.published_at.as_deref())
                .map(|value| parse_timestamp("published_at", value))
                .transpose()?,
        })
    }
}

/// Article service over an injected store.
pub struct ArticleService<S: ArticleStore> {
    store: S,
}

impl<S: ArticleStore> ArticleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists articles matching `filter`, in insertion order.
    pub fn list(&self, filter: &ArticleFilter) -> ArticleResult<Vec<Article>> {
        Ok(self.store.find(filter)?)
    }

    /// Parses a raw query and lists; date errors short-circuit the store.
    pub fn list_from_query(&self, query: &ArticleListQuery) -> ArticleResult<Vec<Article>> {
        let filter = query.to_filter()?;
        self.list(&filter)
    }

    /// Creates an article.
    ///
    /// # Contract
    /// - Validation, then title uniqueness, then lookup resolution, then insert.
    /// - Returns the persisted article with store-assigned `id`/`created_at`.
    pub fn create(&self, candidate: NewArticle) -> ArticleResult<Article> {
        candidate.validate()?;
        self.ensure_title_available(&candidate.title, None)?;

        let (category, publisher) =
            self.resolve_lookups(&candidate.category, &candidate.publisher)?;
        let article = self.store.create(&ArticleWrite {
            title: &candidate.title,
            body: &candidate.body,
            category: &category,
            publisher: &publisher,
            published_at: candidate.published_at,
        })?;

        info!(
            "event=article_create module=service status=ok article_id={} category_id={} publisher_id={}",
            article.id, category.id, publisher.id
        );
        Ok(article)
    }

    pub fn get(&self, id: ArticleId) -> ArticleResult<Article> {
        Ok(self.store.find_one(&ArticleKey::Id(id))?)
    }

    /// Merges `patch` onto the stored article and persists the result.
    ///
    /// Absent patch fields keep their stored values; present ones overwrite,
    /// so an explicit empty string fails validation instead of being ignored.
    pub fn update(&self, id: ArticleId, patch: ArticlePatch) -> ArticleResult<Article> {
        let existing = self.store.find_one(&ArticleKey::Id(id))?;
        let merged = merge_patch(existing, patch);
        merged.validate()?;
        self.ensure_title_available(&merged.title, Some(id))?;

        let (category, publisher) = self.resolve_lookups(&merged.category, &merged.publisher)?;
        let article = self.store.update(
            id,
            &ArticleWrite {
                title: &merged.title,
                body: &merged.body,
                category: &category,
                publisher: &publisher,
                published_at: merged.published_at,
            },
        )?;

        info!("event=article_update module=service status=ok article_id={id}");
        Ok(article)
    }

    /// Deletes an article. Its category/publisher rows are kept.
    pub fn delete(&self, id: ArticleId) -> ArticleResult<()> {
        self.store.find_one(&ArticleKey::Id(id))?;
        self.store.delete(id)?;

        info!("event=article_delete module=service status=ok article_id={id}");
        Ok(())
    }

    fn ensure_title_available(&self, title: &str, owner: Option<ArticleId>) -> ArticleResult<()> {
        match self.store.find_one(&ArticleKey::Title(title.to_string())) {
            Ok(existing) if Some(existing.id) == owner => Ok(()),
            Ok(_) => Err(ArticleError::DuplicateTitle(title.to_string())),
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve_lookups(
        &self,
        category: &str,
        publisher: &str,
    ) -> ArticleResult<(LookupEntity, LookupEntity)> {
        let category = self
            .store
            .find_or_create_lookup(LookupKind::Category, category)?;
        let publisher = self
            .store
            .find_or_create_lookup(LookupKind::Publisher, publisher)?;
        Ok((category, publisher))
    }
}

/// Overwrites every field present in `patch`; `id` and `created_at` are
/// never touched.
pub fn merge_patch(mut article: Article, patch: ArticlePatch) -> Article {
    if let Some(title) = patch.title {
        article.title = title;
    }
    if let Some(body) = patch.body {
        article.body = body;
    }
    if let Some(category) = patch.category {
        article.category = category;
    }
    if let Some(publisher) = patch.publisher {
        article.publisher = publisher;
    }
    match patch.published_at {
        PublishedAtPatch::Keep => {}
        PublishedAtPatch::Clear => article.published_at = None,
        PublishedAtPatch::Set(at) => article.published_at = Some(at),
    }
    article
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
