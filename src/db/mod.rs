//! Database module: row models and SQL repositories.
//!
//! - `model`: raw rows as stored in SQLite and their conversion into domain types.
//! - `repo`: SQL-only functions for the `batches` table.
//!
//! Callers import from `catalog_mirror::db`; the repository API is re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::BatchRow;
