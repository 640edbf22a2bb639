//! Relational staging layer for the herbarium importer
//!
//! Importers stage rows keyed by natural keys (slugs, scientific names,
//! composite tuples) and save them in one reconciling pass per table.
//! Cross-table references are staged as natural keys and rewritten to
//! surrogate ids through fresh id maps once the referenced table is saved.

pub mod database;
pub mod schema;
pub mod table;
pub mod value;

pub use database::Database;
pub use schema::ensure_schema;
pub use table::{SaveOutcome, StagedRow, Table};
pub use value::Value;
