// VAST City Dashboard - Core Library
// ETL (raw CSV → snapshot cache) and the dashboard that reads the cache

pub mod error;
pub mod table;
pub mod temporal;
pub mod config;
pub mod loader;
pub mod snapshot;
pub mod aggregate;
pub mod store;
pub mod etl;
pub mod dashboard;
pub mod logging;

#[cfg(test)]
mod test_fixtures;

// Re-export commonly used types
pub use error::{Result, VastError};
pub use table::{Column, ColumnData, DType, Table, Value};
pub use config::{DatasetGroup, DatasetLayout, EtlSettings, GraphSettings, NullPolicy};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotMeta};
pub use aggregate::Aggregates;
pub use store::DataStore;
pub use etl::{run_etl, EtlReport};
pub use dashboard::Dashboard;
pub use dashboard::pages::Page;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
