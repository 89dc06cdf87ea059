// 🗄️ ETL Stage - raw CSV → typed tables → snapshots
//
// Everything is loaded before anything is written, so a parse failure never
// leaves a half-refreshed cache behind.

use crate::aggregate::participants::household_kid_counts;
use crate::config::{DatasetGroup, DatasetLayout, EtlSettings};
use crate::error::{Result, VastError};
use crate::loader::{load_group, load_status_logs};
use crate::snapshot::{write_snapshot, SnapshotMeta};
use crate::store::PARTICIPANTS;
use crate::table::Table;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WrittenSnapshot {
    pub path: PathBuf,
    pub meta: SnapshotMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct EtlReport {
    pub run_id: Uuid,
    pub snapshots: Vec<WrittenSnapshot>,
}

impl EtlReport {
    pub fn total_rows(&self) -> usize {
        self.snapshots.iter().map(|s| s.meta.row_count).sum()
    }
}

pub fn run_etl(layout: &DatasetLayout, settings: &EtlSettings) -> Result<EtlReport> {
    let run_id = Uuid::new_v4();
    info!(%run_id, datasets = %layout.datasets_dir.display(), "starting ETL run");

    // 1. Load
    let status_logs = load_status_logs(layout, settings)?;
    let attributes = load_group(layout, DatasetGroup::Attributes, settings.null_policy)?;
    let journals = load_group(layout, DatasetGroup::Journals, settings.null_policy)?;

    let participants = attributes
        .get(PARTICIPANTS)
        .ok_or_else(|| VastError::missing(layout.group_dir(DatasetGroup::Attributes).join(PARTICIPANTS)))?;
    let kid_counts = household_kid_counts(participants)?;

    // 2. Write
    let mut snapshots = Vec::new();
    let mut write = |path: PathBuf, table: &Table| -> Result<()> {
        let meta = write_snapshot(&path, table, run_id)?;
        snapshots.push(WrittenSnapshot { path, meta });
        Ok(())
    };

    write(layout.status_logs_snapshot(), &status_logs)?;
    for (group, tables) in [
        (DatasetGroup::Attributes, &attributes),
        (DatasetGroup::Journals, &journals),
    ] {
        for (file_name, table) in tables {
            write(layout.table_snapshot(group, file_name), table)?;
        }
    }
    write(layout.household_kid_counts_snapshot(), &kid_counts)?;

    let report = EtlReport { run_id, snapshots };
    info!(%run_id, snapshots = report.snapshots.len(), rows = report.total_rows(), "ETL run complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullPolicy;
    use crate::snapshot::read_snapshot;
    use crate::table::DType;
    use crate::test_fixtures::{fixture_settings, write_dataset};
    use tempfile::TempDir;

    #[test]
    fn test_run_etl_writes_every_snapshot() {
        let dir = TempDir::new().unwrap();
        let layout = write_dataset(dir.path());

        let report = run_etl(&layout, &fixture_settings()).unwrap();

        // status logs + 6 attribute tables + 2 journals + household counts
        assert_eq!(report.snapshots.len(), 10);
        assert!(report.snapshots.iter().all(|s| s.path.is_file()));
        assert!(report.snapshots.iter().all(|s| s.meta.run_id == report.run_id));
        assert!(layout
            .table_snapshot(DatasetGroup::Attributes, "Participants.csv")
            .is_file());
        assert!(layout
            .table_snapshot(DatasetGroup::Journals, "SocialNetwork.csv")
            .is_file());

        let logs = read_snapshot(&layout.status_logs_snapshot()).unwrap().table;
        assert_eq!(logs.height(), 2, "row with a null jobId is dropped");
        assert_eq!(logs.require("timestamp").unwrap().dtype(), DType::DateTime);

        let counts = read_snapshot(&layout.household_kid_counts_snapshot()).unwrap().table;
        assert_eq!(counts.ints("householdSize").unwrap().to_vec(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(counts.ints("count").unwrap().to_vec(), vec![Some(2), Some(1), Some(2)]);
    }

    #[test]
    fn test_keep_policy_passes_nulls_through() {
        let dir = TempDir::new().unwrap();
        let layout = write_dataset(dir.path());
        let settings = EtlSettings {
            null_policy: NullPolicy::Keep,
            ..fixture_settings()
        };

        run_etl(&layout, &settings).unwrap();

        let logs = read_snapshot(&layout.status_logs_snapshot()).unwrap().table;
        assert_eq!(logs.height(), 3);
        assert_eq!(logs.ints("jobId").unwrap()[1], None);
    }

    #[test]
    fn test_parse_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let layout = write_dataset(dir.path());
        std::fs::write(
            layout.status_log_shard(2),
            "timestamp,participantId\n2022/03/01 00:10,2\n",
        )
        .unwrap();

        let err = run_etl(&layout, &fixture_settings()).unwrap_err();
        assert!(matches!(err, VastError::Parse { .. }));
        assert!(!layout.status_logs_snapshot().exists());
    }

    #[test]
    fn test_missing_participants_is_fatal() {
        let dir = TempDir::new().unwrap();
        let layout = write_dataset(dir.path());
        std::fs::remove_file(layout.group_dir(DatasetGroup::Attributes).join(PARTICIPANTS)).unwrap();

        assert!(matches!(
            run_etl(&layout, &fixture_settings()),
            Err(VastError::DatasetMissing { .. })
        ));
    }

    #[test]
    fn test_nan_cells_survive_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let layout = write_dataset(dir.path());
        std::fs::write(
            layout.group_dir(DatasetGroup::Attributes).join("Pubs.csv"),
            "pubId,hourlyCost,maxOccupancy,location,buildingId\n\
             442,NAN,64,POINT (12.5 7.25),44\n\
             443,-nan,48,POINT (1 1),45\n\
             444,6.5,32,POINT (2 2),46\n",
        )
        .unwrap();
        let settings = EtlSettings {
            null_policy: NullPolicy::Keep,
            ..fixture_settings()
        };

        run_etl(&layout, &settings).unwrap();

        let pubs = read_snapshot(&layout.table_snapshot(DatasetGroup::Attributes, "Pubs.csv"))
            .unwrap()
            .table;
        assert_eq!(pubs.numbers("hourlyCost").unwrap(), vec![None, None, Some(6.5)]);
    }
}
