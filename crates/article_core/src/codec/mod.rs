//! Wire codecs for the HTTP-facing JSON shapes.
//!
//! # Responsibility
//! - Decode request bodies into write candidates/patches field by field.
//! - Encode articles into the public response shape.
//! - Own the fixed `YYYY-MM-DD HH:MM:SS` timestamp layout.

pub mod article_codec;
