// ⚙️ Configuration - dataset layout, snapshot naming and pipeline settings
//
// Everything is working-directory relative by default; no environment
// variables are consulted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASETS_DIR: &str = "Datasets";
pub const DEFAULT_STATUS_LOG_SHARDS: usize = 72;
pub const SNAPSHOT_EXTENSION: &str = "db";

/// Logical group a directory-discovered table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetGroup {
    Attributes,
    Journals,
}

impl DatasetGroup {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DatasetGroup::Attributes => "Attributes",
            DatasetGroup::Journals => "Journals",
        }
    }

    /// Suffix used in snapshot file names
    pub fn suffix(&self) -> &'static str {
        match self {
            DatasetGroup::Attributes => "attributes",
            DatasetGroup::Journals => "journals",
        }
    }
}

// ============================================================================
// DATASET LAYOUT
// ============================================================================

/// Where raw CSVs are read from and where snapshots are written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub datasets_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        DatasetLayout::new(DEFAULT_DATASETS_DIR, ".")
    }
}

impl DatasetLayout {
    pub fn new(datasets_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        DatasetLayout {
            datasets_dir: datasets_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn activity_logs_dir(&self) -> PathBuf {
        self.datasets_dir.join("ActivityLogs")
    }

    pub fn group_dir(&self, group: DatasetGroup) -> PathBuf {
        self.datasets_dir.join(group.dir_name())
    }

    /// `ParticipantStatusLogs{shard}.csv`, shards numbered from 1
    pub fn status_log_shard(&self, shard: usize) -> PathBuf {
        self.activity_logs_dir()
            .join(format!("ParticipantStatusLogs{}.csv", shard))
    }

    fn snapshot(&self, stem: &str) -> PathBuf {
        self.cache_dir
            .join(format!("processed_{}.{}", stem, SNAPSHOT_EXTENSION))
    }

    pub fn status_logs_snapshot(&self) -> PathBuf {
        self.snapshot("participant_status_logs")
    }

    pub fn household_kid_counts_snapshot(&self) -> PathBuf {
        self.snapshot("household_kid_counts")
    }

    /// `processed_<csvFileName>_<group>.db`, the CSV extension kept
    pub fn table_snapshot(&self, group: DatasetGroup, file_name: &str) -> PathBuf {
        self.snapshot(&format!("{}_{}", file_name, group.suffix()))
    }
}

/// Whether a path names a CSV file
pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e == "csv")
}

// ============================================================================
// PIPELINE SETTINGS
// ============================================================================

/// What to do with rows that contain a null cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum NullPolicy {
    /// Remove every row with at least one null cell
    #[default]
    Drop,
    /// Leave tables untouched
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlSettings {
    pub status_log_shards: usize,
    pub null_policy: NullPolicy,
}

impl Default for EtlSettings {
    fn default() -> Self {
        EtlSettings {
            status_log_shards: DEFAULT_STATUS_LOG_SHARDS,
            null_policy: NullPolicy::Drop,
        }
    }
}

/// Social graph selection knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSettings {
    /// How many participants count as "top" by outgoing weight
    pub top_participants: usize,
    /// Edges must be strictly heavier than this
    pub min_edge_weight: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        GraphSettings {
            top_participants: 10,
            min_edge_weight: 200,
        }
    }
}
