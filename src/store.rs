// 🗄️ Data Store - every snapshot the dashboard needs, loaded once at startup

use crate::config::{DatasetGroup, DatasetLayout};
use crate::error::{Result, VastError};
use crate::loader::list_csv_files;
use crate::snapshot::{missing_snapshots, read_snapshot, SnapshotMeta};
use crate::table::Table;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub const PARTICIPANTS: &str = "Participants.csv";
pub const JOBS: &str = "Jobs.csv";
pub const FINANCIAL_JOURNAL: &str = "FinancialJournal.csv";
pub const SOCIAL_NETWORK: &str = "SocialNetwork.csv";

#[derive(Debug, Clone)]
pub struct DataStore {
    pub status_logs: Table,
    pub attributes: BTreeMap<String, Table>,
    pub journals: BTreeMap<String, Table>,
    pub household_kid_counts: Table,
    /// Provenance of every loaded snapshot, in load order
    pub manifest: Vec<SnapshotMeta>,
}

/// Snapshot paths the dashboard expects, derived from the CSVs on disk
pub fn expected_snapshots(layout: &DatasetLayout) -> Result<Vec<PathBuf>> {
    let mut paths = vec![layout.status_logs_snapshot()];
    for group in [DatasetGroup::Attributes, DatasetGroup::Journals] {
        for file_name in list_csv_files(&layout.group_dir(group))? {
            paths.push(layout.table_snapshot(group, &file_name));
        }
    }
    paths.push(layout.household_kid_counts_snapshot());
    Ok(paths)
}

impl DataStore {
    /// Read every snapshot; any absent file aborts the load
    pub fn load(layout: &DatasetLayout) -> Result<Self> {
        let missing = missing_snapshots(&expected_snapshots(layout)?);
        if let Some(first) = missing.first() {
            for path in &missing {
                error!(path = %path.display(), "snapshot missing, run the ETL stage first");
            }
            return Err(VastError::missing(first));
        }

        let mut manifest = Vec::new();

        let logs = read_snapshot(&layout.status_logs_snapshot())?;
        manifest.push(logs.meta);

        let mut groups = BTreeMap::new();
        for group in [DatasetGroup::Attributes, DatasetGroup::Journals] {
            let mut tables = BTreeMap::new();
            for file_name in list_csv_files(&layout.group_dir(group))? {
                let snapshot = read_snapshot(&layout.table_snapshot(group, &file_name))?;
                manifest.push(snapshot.meta);
                tables.insert(file_name, snapshot.table);
            }
            groups.insert(group.suffix(), tables);
        }

        let counts = read_snapshot(&layout.household_kid_counts_snapshot())?;
        manifest.push(counts.meta);

        let mut run_ids: Vec<_> = manifest.iter().map(|m| m.run_id).collect();
        run_ids.sort();
        run_ids.dedup();
        if run_ids.len() > 1 {
            warn!(runs = run_ids.len(), "snapshots come from different ETL runs");
        }

        let store = DataStore {
            status_logs: logs.table,
            attributes: groups.remove("attributes").unwrap_or_default(),
            journals: groups.remove("journals").unwrap_or_default(),
            household_kid_counts: counts.table,
            manifest,
        };
        info!(
            attributes = store.attributes.len(),
            journals = store.journals.len(),
            status_log_rows = store.status_logs.height(),
            "loaded data store"
        );
        Ok(store)
    }

    pub fn attribute(&self, name: &str) -> Result<&Table> {
        self.attributes
            .get(name)
            .ok_or_else(|| VastError::missing(name))
    }

    pub fn journal(&self, name: &str) -> Result<&Table> {
        self.journals
            .get(name)
            .ok_or_else(|| VastError::missing(name))
    }
}
