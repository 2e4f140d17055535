pub mod config;
pub mod error;
pub mod inventory;
pub mod metadata;
pub mod sync;
pub mod types;

pub use config::{BisyncConfig, ConfigLoader, ConfigValidator};
pub use error::AppError;
pub use inventory::{ApplicationRecord, BiConfig, Inventory, Lookup, StoredBiConfig};
pub use metadata::DatabaseMetadata;
pub use sync::{ExportSummary, ImportTarget};
pub use types::*;
