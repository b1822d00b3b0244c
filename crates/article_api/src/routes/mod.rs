//! Route modules.
//!
//! - `articles`: list/create on `/article`, get/update/delete on
//!   `/article/:id`, each with a trailing-slash variant.

pub mod articles;
