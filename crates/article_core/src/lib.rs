//! Core domain logic for the article service.
//! This crate is the single source of truth for article business rules.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::article_codec::{
    decode_article, encode_article, encode_articles, format_timestamp, parse_timestamp,
    ArticleInput, CodecError, DATE_TIME_LAYOUT,
};
pub use config::{AppConfig, ConfigError, DbConfig, DbDriver, LogConfig, ServerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::article::{
    Article, ArticleFilter, ArticleId, ArticleKey, ArticlePatch, ArticleValidationError,
    NewArticle, PublishedAtPatch, REQUIRED_FIELDS,
};
pub use model::lookup::{LookupEntity, LookupKind};
pub use repo::article_store::{
    ArticleStore, ArticleWrite, SqliteArticleStore, StoreError, StoreResult,
};
pub use service::article_service::{
    merge_patch, ArticleError, ArticleListQuery, ArticleResult, ArticleService,
};

