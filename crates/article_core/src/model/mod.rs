//! Article domain model.
//!
//! # Responsibility
//! - Define the article record and the write-side shapes used to build it.
//! - Define the category/publisher lookup entities referenced by name.
//!
//! # Invariants
//! - Required-field lists are explicit data, not derived metadata.
//! - Lookup entities are only ever obtained from the store, never built by
//!   request parsing.

pub mod article;
pub mod lookup;
