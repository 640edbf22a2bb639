//! Environment-driven path and storage configuration

use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the lookups to avoid repeated environment reads
static DATABASE_PATH: OnceLock<PathBuf> = OnceLock::new();
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static STORAGE_URL: OnceLock<String> = OnceLock::new();

/// Get the SQLite database path
/// Checks HERBARIUM_DB environment variable, falls back to ./herbarium.db
pub fn database_path() -> PathBuf {
    DATABASE_PATH
        .get_or_init(|| {
            if let Ok(path) = std::env::var("HERBARIUM_DB") {
                PathBuf::from(path)
            } else {
                PathBuf::from("herbarium.db")
            }
        })
        .clone()
}

/// Get the local data directory holding CSV side-files
/// Checks HERBARIUM_DATA environment variable, falls back to ./data
pub fn data_dir() -> PathBuf {
    DATA_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("HERBARIUM_DATA") {
                PathBuf::from(path)
            } else {
                PathBuf::from("data")
            }
        })
        .clone()
}

/// Get the path of a named file inside the data directory
pub fn data_file(name: &str) -> PathBuf {
    data_dir().join(name)
}

/// Get the object-storage location, `s3://bucket` or `file:///dir`
/// Checks HERBARIUM_STORAGE environment variable, falls back to s3://newfs
pub fn storage_url() -> String {
    STORAGE_URL
        .get_or_init(|| {
            std::env::var("HERBARIUM_STORAGE").unwrap_or_else(|_| "s3://newfs".to_string())
        })
        .clone()
}
