//! Article record, write candidates and required-field validation.
//!
//! # Invariants
//! - `created_at` is set once by the store and never rewritten.
//! - `updated_at` is internal bookkeeping and is never encoded for clients.
//! - Title, body, category and publisher must be non-empty on every write.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned article identifier.
pub type ArticleId = i64;

/// Wire names of the fields every persisted article must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "body", "category", "publisher"];

/// A persisted article with its category/publisher resolved to names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub body: String,
    pub category: String,
    pub publisher: String,
    pub created_at: DateTime<Utc>,
    /// Client-supplied, second resolution.
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        check_required([
            self.title.as_str(),
            self.body.as_str(),
            self.category.as_str(),
            self.publisher.as_str(),
        ])
    }
}

/// Candidate for the create operation, as decoded from a request.
///
/// Missing text fields are empty strings; validation rejects them later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub category: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewArticle {
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        check_required([
            self.title.as_str(),
            self.body.as_str(),
            self.category.as_str(),
            self.publisher.as_str(),
        ])
    }
}

/// How an update treats the stored `published_at` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishedAtPatch {
    /// Field absent from the request.
    #[default]
    Keep,
    /// Field sent as `null` or `""`.
    Clear,
    Set(DateTime<Utc>),
}

/// Partial update. `None` means "absent from the request", not "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub published_at: PublishedAtPatch,
}

/// Exact-match list filter. Unset (or empty) fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Unique lookup key for a single article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleKey {
    Id(ArticleId),
    Title(String),
}

impl Display for ArticleKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Title(title) => write!(f, "title=`{title}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    /// Wire names of the empty required fields, in declaration order.
    MissingFields(Vec<&'static str>),
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
        }
    }
}

impl Error for ArticleValidationError {}

fn check_required(values: [&str; 4]) -> Result<(), ArticleValidationError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .zip(values)
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ArticleValidationError::MissingFields(missing))
    }
}
