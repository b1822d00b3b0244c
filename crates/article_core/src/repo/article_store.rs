//! Article store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide filter/read/write/delete APIs over `articles`.
//! - Resolve category/publisher names with an at-most-one-creation upsert.
//!
//! # Invariants
//! - Article writes take resolved `LookupEntity` values, so a row can never
//!   reference a name that failed to resolve.
//! - `find_or_create_lookup` relies on the `UNIQUE(name)` constraint, not on
//!   any in-process lock; it is safe across connections and processes.
//! - Every statement honors the optional request deadline.

use crate::db::DbError;
use crate::model::article::{Article, ArticleFilter, ArticleId, ArticleKey};
use crate::model::lookup::{LookupEntity, LookupKind};
use chrono::{DateTime, SubsecRound, Utc};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const ARTICLE_SELECT_SQL: &str = "SELECT
    a.id,
    a.title,
    a.body,
    c.name AS category,
    p.name AS publisher,
    a.created_at,
    a.published_at,
    a.updated_at
FROM articles a
INNER JOIN categories c ON c.id = a.category_id
INNER JOIN publishers p ON p.id = a.publisher_id";

const MAX_BUSY_WAIT: Duration = Duration::from_secs(5);

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for article persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(ArticleKey),
    /// The `articles.title` unique constraint rejected a write.
    TitleConflict(String),
    InvalidData(String),
    /// The request deadline passed before the next statement ran.
    DeadlineExceeded,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "article not found: {key}"),
            Self::TitleConflict(title) => write!(f, "title already exists: `{title}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
            Self::DeadlineExceeded => write!(f, "request deadline exceeded"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column values for an article insert/update.
///
/// Category and publisher are borrowed lookup rows, which callers can only
/// obtain from [`ArticleStore::find_or_create_lookup`].
#[derive(Debug, Clone, Copy)]
pub struct ArticleWrite<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub category: &'a LookupEntity,
    pub publisher: &'a LookupEntity,
    pub published_at: Option<DateTime<Utc>>,
}

/// Store interface for article persistence.
pub trait ArticleStore {
    /// Returns all articles matching every set filter field, oldest id first.
    fn find(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>>;
    /// Returns exactly one article or `NotFound`.
    fn find_one(&self, key: &ArticleKey) -> StoreResult<Article>;
    /// Inserts an article, assigning `id` and `created_at`.
    fn create(&self, write: &ArticleWrite<'_>) -> StoreResult<Article>;
    /// Rewrites every mutable column of an existing article.
    fn update(&self, id: ArticleId, write: &ArticleWrite<'_>) -> StoreResult<Article>;
    /// Hard-deletes an article. Lookup rows are left in place.
    fn delete(&self, id: ArticleId) -> StoreResult<()>;
    /// Returns the lookup row named `name`, creating it when absent.
    fn find_or_create_lookup(&self, kind: LookupKind, name: &str) -> StoreResult<LookupEntity>;
}

/// SQLite-backed article store.
pub struct SqliteArticleStore<'conn> {
    conn: &'conn Connection,
    deadline: Option<Instant>,
}

impl<'conn> SqliteArticleStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            deadline: None,
        }
    }

    /// Bounds every subsequent statement (and its lock waits) by `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn check_deadline(&self) -> StoreResult<()> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(StoreError::DeadlineExceeded);
        }
        self.conn.busy_timeout(remaining.min(MAX_BUSY_WAIT))?;
        Ok(())
    }
}

impl ArticleStore for SqliteArticleStore<'_> {
    fn find(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>> {
        self.check_deadline()?;

        let mut sql = format!("{ARTICLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        let text_predicates = [
            ("a.title", filter.title.as_deref()),
            ("c.name", filter.category.as_deref()),
            ("p.name", filter.publisher.as_deref()),
        ];
        for (column, value) in text_predicates {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                sql.push_str(&format!(" AND {column} = ?"));
                bind_values.push(Value::Text(value.to_string()));
            }
        }

        let time_predicates = [
            ("a.created_at", filter.created_at),
            ("a.published_at", filter.published_at),
        ];
        for (column, value) in time_predicates {
            if let Some(value) = value {
                sql.push_str(&format!(" AND {column} = ?"));
                bind_values.push(Value::Integer(value.timestamp_millis()));
            }
        }

        sql.push_str(" ORDER BY a.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        Ok(articles)
    }

    fn find_one(&self, key: &ArticleKey) -> StoreResult<Article> {
        self.check_deadline()?;

        let (predicate, value) = match key {
            ArticleKey::Id(id) => ("a.id", Value::Integer(*id)),
            ArticleKey::Title(title) => ("a.title", Value::Text(title.clone())),
        };
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE {predicate} = ?1;"))?;

        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => parse_article_row(row),
            None => Err(StoreError::NotFound(key.clone())),
        }
    }

    fn create(&self, write: &ArticleWrite<'_>) -> StoreResult<Article> {
        self.check_deadline()?;

        let now = Utc::now();
        // Truncated so created_at survives a round trip through the wire layout.
        let created_at = now.trunc_subsecs(0);
        self.conn
            .execute(
                "INSERT INTO articles (
                    title,
                    body,
                    category_id,
                    publisher_id,
                    created_at,
                    published_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    write.title,
                    write.body,
                    write.category.id,
                    write.publisher.id,
                    created_at.timestamp_millis(),
                    write.published_at.map(|at| at.timestamp_millis()),
                    now.timestamp_millis(),
                ],
            )
            .map_err(|err| map_write_error(err, write.title))?;

        let id = self.conn.last_insert_rowid();
        self.find_one(&ArticleKey::Id(id))
    }

    fn update(&self, id: ArticleId, write: &ArticleWrite<'_>) -> StoreResult<Article> {
        self.check_deadline()?;

        let changed = self
            .conn
            .execute(
                "UPDATE articles
                 SET
                    title = ?1,
                    body = ?2,
                    category_id = ?3,
                    publisher_id = ?4,
                    published_at = ?5,
                    updated_at = ?6
                 WHERE id = ?7;",
                params![
                    write.title,
                    write.body,
                    write.category.id,
                    write.publisher.id,
                    write.published_at.map(|at| at.timestamp_millis()),
                    Utc::now().timestamp_millis(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, write.title))?;

        if changed == 0 {
            return Err(StoreError::NotFound(ArticleKey::Id(id)));
        }

        self.find_one(&ArticleKey::Id(id))
    }

    fn delete(&self, id: ArticleId) -> StoreResult<()> {
        self.check_deadline()?;

        let changed = self
            .conn
            .execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(ArticleKey::Id(id)));
        }

        Ok(())
    }

    fn find_or_create_lookup(&self, kind: LookupKind, name: &str) -> StoreResult<LookupEntity> {
        self.check_deadline()?;

        let table = kind.table();
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO {table} (name, created_at, updated_at)
                 VALUES (?1, ?2, ?2)
                 ON CONFLICT (name) DO NOTHING;"
            ),
            params![name, Utc::now().timestamp_millis()],
        )?;

        self.check_deadline()?;
        let id: i64 = self.conn.query_row(
            &format!("SELECT id FROM {table} WHERE name = ?1;"),
            [name],
            |row| row.get(0),
        )?;

        debug!(
            "event=lookup_resolve module=repo status=ok kind={} id={} created={}",
            kind,
            id,
            inserted == 1
        );

        Ok(LookupEntity {
            id,
            kind,
            name: name.to_string(),
        })
    }
}

fn parse_article_row(row: &Row<'_>) -> StoreResult<Article> {
    let created_at = millis_to_datetime(row.get("created_at")?, "created_at")?;
    let updated_at = millis_to_datetime(row.get("updated_at")?, "updated_at")?;
    let published_at = match row.get::<_, Option<i64>>("published_at")? {
        Some(millis) => Some(millis_to_datetime(millis, "published_at")?),
        None => None,
    };

    Ok(Article {
        id: row.get("id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        category: row.get("category")?,
        publisher: row.get("publisher")?,
        created_at,
        published_at,
        updated_at,
    })
}

fn millis_to_datetime(millis: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "timestamp `{millis}` out of range in articles.{column}"
        ))
    })
}

fn map_write_error(err: rusqlite::Error, title: &str) -> StoreError {
    if is_title_conflict(&err) {
        StoreError::TitleConflict(title.to_string())
    } else {
        err.into()
    }
}

fn is_title_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation && message.contains("articles.title")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{ArticleStore, SqliteArticleStore, StoreError};
    use crate::db::open_db_in_memory;
    use crate::model::article::ArticleFilter;
    use std::time::{Duration, Instant};

    #[test]
    fn expired_deadline_fails_before_touching_the_database() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteArticleStore::new(&conn)
            .with_deadline(Instant::now() - Duration::from_millis(1));

        let err = store.find(&ArticleFilter::default()).unwrap_err();
        assert!(matches!(err, StoreError::DeadlineExceeded));
    }

    #[test]
    fn future_deadline_allows_queries() {
        let conn = open_db_in_memory().unwrap();
        let store =
            SqliteArticleStore::new(&conn).with_deadline(Instant::now() + Duration::from_secs(30));

        assert!(store.find(&ArticleFilter::default()).unwrap().is_empty());
    }
}
