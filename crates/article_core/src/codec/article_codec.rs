//! Article JSON codec.
//!
//! # Invariants
//! - A malformed `published_at` fails decoding before anything else runs.
//! - Missing required text fields decode successfully; validation is the
//!   service's job.
//! - Encoded output never contains lookup ids or `updated_at`.

use crate::model::article::{Article, ArticlePatch, NewArticle, PublishedAtPatch};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Human-readable form of the timestamp layout, used in error messages.
pub const DATE_TIME_LAYOUT: &str = "YYYY-MM-DD HH:MM:SS";
const CHRONO_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

// chrono accepts unpadded fields; the wire layout does not.
static LAYOUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("valid layout regex")
});

const FIELD_TITLE: &str = "title";
const FIELD_BODY: &str = "body";
const FIELD_CATEGORY: &str = "category";
const FIELD_PUBLISHER: &str = "publisher";
const FIELD_PUBLISHED_AT: &str = "published_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Body is not valid JSON.
    MalformedBody(String),
    /// Body is valid JSON but not an object.
    NotAnObject,
    /// A known field carries the wrong JSON type.
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    /// A timestamp does not match the fixed layout or is not a real date.
    InvalidTimestamp { field: &'static str, value: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedBody(details) => {
                write!(f, "unable to decode json request body: {details}")
            }
            Self::NotAnObject => write!(f, "request body must be a json object"),
            Self::FieldType { field, expected } => {
                write!(f, "field `{field}` must be a {expected}")
            }
            Self::InvalidTimestamp { field, value } => write!(
                f,
                "invalid {field} `{value}`: expected format {DATE_TIME_LAYOUT}"
            ),
        }
    }
}

impl Error for CodecError {}

/// Decoded request body, keeping field presence for partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub published_at: PublishedAtPatch,
}

impl ArticleInput {
    /// Create candidate; absent text fields become empty strings.
    pub fn into_new_article(self) -> NewArticle {
        NewArticle {
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            published_at: match self.published_at {
                PublishedAtPatch::Set(at) => Some(at),
                PublishedAtPatch::Keep | PublishedAtPatch::Clear => None,
            },
        }
    }

    pub fn into_patch(self) -> ArticlePatch {
        ArticlePatch {
            title: self.title,
            body: self.body,
            category: self.category,
            publisher: self.publisher,
            published_at: self.published_at,
        }
    }
}

/// Decodes an article request body.
///
/// Rules:
/// - Text fields: absent or `null` -> `None`, string -> `Some`, else error.
/// - `published_at`: absent -> keep, `null`/`""` -> clear, string -> parsed.
/// - Unknown fields (including a client-sent `id`) are ignored.
pub fn decode_article(bytes: &[u8]) -> Result<ArticleInput, CodecError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| CodecError::MalformedBody(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(CodecError::NotAnObject);
    };

    // published_at first so a bad date is reported ahead of type errors.
    let published_at = published_at_field(&fields)?;

    Ok(ArticleInput {
        title: text_field(&fields, FIELD_TITLE)?,
        body: text_field(&fields, FIELD_BODY)?,
        category: text_field(&fields, FIELD_CATEGORY)?,
        publisher: text_field(&fields, FIELD_PUBLISHER)?,
        published_at,
    })
}

/// Encodes one article into the public response shape.
pub fn encode_article(article: &Article) -> Value {
    json!({
        "id": article.id,
        FIELD_TITLE: article.title,
        FIELD_BODY: article.body,
        FIELD_CATEGORY: article.category,
        FIELD_PUBLISHER: article.publisher,
        "created_at": format_timestamp(article.created_at),
        FIELD_PUBLISHED_AT: article.published_at.map(format_timestamp),
    })
}

pub fn encode_articles(articles: &[Article]) -> Value {
    Value::Array(articles.iter().map(encode_article).collect())
}

/// Parses a timestamp in the fixed layout, interpreted as UTC.
///
/// `field` only feeds the error message.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, CodecError> {
    let invalid = || CodecError::InvalidTimestamp {
        field,
        value: value.to_string(),
    };

    if !LAYOUT_RE.is_match(value) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(value, CHRONO_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(CHRONO_LAYOUT).to_string()
}

fn text_field(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, CodecError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(CodecError::FieldType {
            field,
            expected: "string",
        }),
    }
}

fn published_at_field(fields: &Map<String, Value>) -> Result<PublishedAtPatch, CodecError> {
    match fields.get(FIELD_PUBLISHED_AT) {
        None => Ok(PublishedAtPatch::Keep),
        Some(Value::Null) => Ok(PublishedAtPatch::Clear),
        Some(Value::String(value)) if value.is_empty() => Ok(PublishedAtPatch::Clear),
        Some(Value::String(value)) => {
            parse_timestamp(FIELD_PUBLISHED_AT, value).map(PublishedAtPatch::Set)
        }
        Some(_) => Err(CodecError::FieldType {
            field: FIELD_PUBLISHED_AT,
            expected: "string",
        }),
    }
}
