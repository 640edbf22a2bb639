//! Curated-data importers for the plant identification site
//!
//! The data arrives as Access CSV exports, partner spreadsheets and
//! object-store listings; each importer decodes one of them and stages
//! its rows through the [`herbarium_db`] upsert layer so repeat runs
//! converge instead of duplicating.

pub mod importers;
pub mod normalize;
pub mod rows;
pub mod status;
pub mod store;

pub use importers::*;
pub use rows::{open_csv, CsvRows, Row};
pub use store::{open_store, DirStore, ObjectStore, S3Store};
