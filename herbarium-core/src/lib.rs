//! Core utilities and types shared across all herbarium crates

pub mod error;
pub mod report;
pub mod system;

// Re-export commonly used types
pub use error::{HerbariumError, HerbariumResult};
pub use report::{Event, LogReporter, RecordingReporter, Reporter, Severity};

// Re-export system utilities
pub use system::{data_dir, data_file, database_path, storage_url};

/// Version information for the herbarium project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
