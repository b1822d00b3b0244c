//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the article store contract consumed by the service layer.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `TitleConflict`) in
//!   addition to DB transport errors.
//! - Lookup rows are created only through `find_or_create_lookup`.

pub mod article_store;
