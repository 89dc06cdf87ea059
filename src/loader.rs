// 📂 CSV Loader & Type Normalizer
//
// Reads raw CSVs into typed Tables:
// - per-column type inference (int64 → float64 → bool → str)
// - datetime coercion of every column whose name mentions "time"
// - the configured null policy, applied and kept

use crate::config::{is_csv, DatasetGroup, DatasetLayout, EtlSettings, NullPolicy};
use crate::error::{Result, VastError};
use crate::table::{Column, ColumnData, Table};
use crate::temporal::{is_time_column, parse_inferred, parse_strict};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Cell texts treated as missing values, compared case-insensitively
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "NaN", "-NaN", "NULL", "None", "#N/A", "#N/A N/A", "#NA", "<NA>",
    "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

/// How datetime columns are recognised and parsed for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCoercion {
    /// Columns whose name contains "time", format inferred per value
    Inferred,
    /// The named column in the exact status-log format; other "time"
    /// columns are inferred
    Strict(&'static str),
}

// ============================================================================
// RAW TABLE (strings, column-major)
// ============================================================================

struct RawTable {
    name: String,
    headers: Vec<String>,
    cells: Vec<Vec<Option<String>>>,
}

fn is_null_token(cell: &str) -> bool {
    let cell = cell.trim();
    NULL_TOKENS.iter().any(|token| token.eq_ignore_ascii_case(cell))
}

fn read_raw(path: &Path, name: &str) -> Result<RawTable> {
    if !path.exists() {
        return Err(VastError::missing(path));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(VastError::Parse {
                table: name.to_string(),
                column: "*".to_string(),
                row,
                value: record.iter().collect::<Vec<_>>().join(","),
                reason: format!(
                    "row has {} fields, header has {}",
                    record.len(),
                    headers.len()
                ),
            });
        }
        for (i, column) in cells.iter_mut().enumerate() {
            let cell = record
                .get(i)
                .filter(|c| !is_null_token(c))
                .map(|c| c.to_string());
            column.push(cell);
        }
    }

    Ok(RawTable {
        name: name.to_string(),
        headers,
        cells,
    })
}

// ============================================================================
// TYPE INFERENCE
// ============================================================================

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn all_parse<T>(cells: &[Option<String>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(text) => parse(text).map(Some),
        })
        .collect()
}

/// Narrowest dtype every non-null cell fits; a column without any value is `Str`
pub fn infer_column(cells: Vec<Option<String>>) -> ColumnData {
    if cells.iter().all(Option::is_none) {
        return ColumnData::Str(cells);
    }
    if let Some(ints) = all_parse(&cells, |c| c.trim().parse::<i64>().ok()) {
        return ColumnData::Int64(ints);
    }
    if let Some(floats) = all_parse(&cells, |c| c.trim().parse::<f64>().ok()) {
        // NaN has no snapshot representation other than null
        return ColumnData::Float64(
            floats.into_iter().map(|c| c.filter(|x| !x.is_nan())).collect(),
        );
    }
    if let Some(bools) = all_parse(&cells, parse_bool) {
        return ColumnData::Bool(bools);
    }
    ColumnData::Str(cells)
}

fn coerce_datetimes(
    table: &str,
    column: &str,
    cells: &[Option<String>],
    parse: fn(&str) -> std::result::Result<DateTime<Utc>, String>,
) -> Result<ColumnData> {
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(text) => parse(text).map(Some).map_err(|reason| VastError::Parse {
                table: table.to_string(),
                column: column.to_string(),
                row,
                value: text.clone(),
                reason,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ColumnData::DateTime(values))
}

impl RawTable {
    fn into_table(self, coercion: TimeCoercion) -> Result<Table> {
        let mut columns = Vec::with_capacity(self.headers.len());
        for (header, cells) in self.headers.into_iter().zip(self.cells) {
            let data = match coercion {
                TimeCoercion::Strict(name) if header == name => {
                    coerce_datetimes(&self.name, &header, &cells, parse_strict)?
                }
                _ if is_time_column(&header) => {
                    coerce_datetimes(&self.name, &header, &cells, parse_inferred)?
                }
                _ => infer_column(cells),
            };
            columns.push(Column::new(header, data));
        }
        Table::from_columns(self.name, columns)
    }
}

// ============================================================================
// PUBLIC LOADERS
// ============================================================================

/// Read one CSV file into a typed table
pub fn read_csv(path: &Path, name: &str, coercion: TimeCoercion) -> Result<Table> {
    read_raw(path, name)?.into_table(coercion)
}

pub fn apply_null_policy(table: Table, policy: NullPolicy) -> Table {
    match policy {
        NullPolicy::Keep => table,
        NullPolicy::Drop => {
            let cleaned = table.drop_nulls();
            let dropped = table.height() - cleaned.height();
            if dropped > 0 {
                warn!(table = %table.name, dropped, "dropped rows containing nulls");
            }
            cleaned
        }
    }
}

/// Load every `*.csv` in a directory, keyed by file name
pub fn load_directory(dir: &Path, policy: NullPolicy) -> Result<BTreeMap<String, Table>> {
    let mut tables = BTreeMap::new();
    for file_name in list_csv_files(dir)? {
        let table = read_csv(&dir.join(&file_name), &file_name, TimeCoercion::Inferred)?;
        let table = apply_null_policy(table, policy);
        info!(table = %file_name, rows = table.height(), columns = table.width(), "loaded table");
        tables.insert(file_name, table);
    }
    Ok(tables)
}

/// Load the attribute or journal group of a dataset
pub fn load_group(
    layout: &DatasetLayout,
    group: DatasetGroup,
    policy: NullPolicy,
) -> Result<BTreeMap<String, Table>> {
    load_directory(&layout.group_dir(group), policy)
}

/// CSV file names in a directory, sorted
pub fn list_csv_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(VastError::missing(dir));
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_csv(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Union of every participant status log shard
pub fn load_status_logs(layout: &DatasetLayout, settings: &EtlSettings) -> Result<Table> {
    let dir = layout.activity_logs_dir();
    if !dir.is_dir() {
        return Err(VastError::missing(dir));
    }

    let mut shards = Vec::with_capacity(settings.status_log_shards);
    for shard in 1..=settings.status_log_shards {
        let path = layout.status_log_shard(shard);
        let name = format!("ParticipantStatusLogs{}", shard);
        let table = read_csv(&path, &name, TimeCoercion::Strict("timestamp"))?;
        debug!(shard, rows = table.height(), "read status log shard");
        shards.push(table);
    }

    let logs = Table::concat("participant_status_logs", &shards);
    let logs = apply_null_policy(logs, settings.null_policy);
    info!(rows = logs.height(), shards = shards.len(), "loaded participant status logs");
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DType;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_infer_column_types() {
        let cells = |v: &[&str]| v.iter().map(|s| Some(s.to_string())).collect::<Vec<_>>();

        assert_eq!(infer_column(cells(&["1", "2"])).dtype(), DType::Int64);
        assert_eq!(infer_column(cells(&["1", "2.5"])).dtype(), DType::Float64);
        assert_eq!(infer_column(cells(&["TRUE", "false"])).dtype(), DType::Bool);
        assert_eq!(infer_column(cells(&["1", "x"])).dtype(), DType::Str);
        assert_eq!(infer_column(vec![None, Some("3".into())]).dtype(), DType::Int64);
    }

    #[test]
    fn test_time_columns_coerced() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Jobs.csv",
            "jobId,startTime,educationRequirement\n1,7:30:00 AM,Bachelors\n2,9:00:00 AM,HighSchoolOrCollege\n",
        );

        let table = read_csv(&dir.path().join("Jobs.csv"), "Jobs.csv", TimeCoercion::Inferred).unwrap();
        assert_eq!(table.require("startTime").unwrap().dtype(), DType::DateTime);
        assert_eq!(table.require("jobId").unwrap().dtype(), DType::Int64);
        assert_eq!(table.require("educationRequirement").unwrap().dtype(), DType::Str);
    }

    #[test]
    fn test_malformed_time_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Bad.csv", "id,timestamp\n1,2022-03-01T00:00:00Z\n2,soon\n");

        let err = read_csv(&dir.path().join("Bad.csv"), "Bad.csv", TimeCoercion::Inferred).unwrap_err();
        match err {
            VastError::Parse { column, row, value, .. } => {
                assert_eq!(column, "timestamp");
                assert_eq!(row, 1);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_status_log_timestamp() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.csv", "timestamp,participantId\n2022-03-01T00:05:00Z,1\n");
        write(dir.path(), "bad.csv", "timestamp,participantId\n2022-03-01 00:05:00,1\n");

        let strict = TimeCoercion::Strict("timestamp");
        assert!(read_csv(&dir.path().join("ok.csv"), "ok", strict).is_ok());
        assert!(matches!(
            read_csv(&dir.path().join("bad.csv"), "bad", strict),
            Err(VastError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_directory_applies_null_policy() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Pubs.csv", "pubId,location\n1,POINT (1 2)\n2,\n");
        write(dir.path(), "notes.txt", "ignored");

        let dropped = load_directory(dir.path(), NullPolicy::Drop).unwrap();
        assert_eq!(dropped.keys().collect::<Vec<_>>(), vec!["Pubs.csv"]);
        assert_eq!(dropped["Pubs.csv"].height(), 1);

        let kept = load_directory(dir.path(), NullPolicy::Keep).unwrap();
        assert_eq!(kept["Pubs.csv"].height(), 2);
    }

    #[test]
    fn test_missing_directory_is_dataset_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_directory(&dir.path().join("nope"), NullPolicy::Drop).unwrap_err();
        assert!(matches!(err, VastError::DatasetMissing { .. }));
    }

    #[test]
    fn test_status_log_shards_union() {
        let dir = TempDir::new().unwrap();
        let layout = DatasetLayout::new(dir.path(), dir.path());
        fs::create_dir_all(layout.activity_logs_dir()).unwrap();
        fs::write(
            layout.status_log_shard(1),
            "timestamp,participantId\n2022-03-01T00:00:00Z,1\n",
        )
        .unwrap();
        fs::write(
            layout.status_log_shard(2),
            "timestamp,participantId,jobId\n2022-03-01T00:05:00Z,2,7\n",
        )
        .unwrap();

        let settings = EtlSettings {
            status_log_shards: 2,
            null_policy: NullPolicy::Keep,
        };
        let logs = load_status_logs(&layout, &settings).unwrap();
        assert_eq!(logs.height(), 2);
        assert_eq!(logs.ints("jobId").unwrap().to_vec(), vec![None, Some(7)]);

        let missing_shard = EtlSettings {
            status_log_shards: 3,
            null_policy: NullPolicy::Keep,
        };
        assert!(matches!(
            load_status_logs(&layout, &missing_shard),
            Err(VastError::DatasetMissing { .. })
        ));
    }

    #[test]
    fn test_empty_and_all_null_columns_are_str() {
        assert_eq!(infer_column(vec![]).dtype(), DType::Str);
        assert_eq!(infer_column(vec![None, None]).dtype(), DType::Str);

        let dir = TempDir::new().unwrap();
        write(dir.path(), "Pubs.csv", "pubId,hourlyCost,location,buildingId\n");
        let table = read_csv(&dir.path().join("Pubs.csv"), "Pubs.csv", TimeCoercion::Inferred).unwrap();
        assert_eq!(table.height(), 0);
        assert_eq!(table.require("location").unwrap().dtype(), DType::Str);
    }

    #[test]
    fn test_nan_spellings_are_null() {
        for token in ["NAN", "-nan", "-NaN", "#NA", "1.#IND", "1.#QNAN", "null", "n/a"] {
            assert!(is_null_token(token), "{} should be null", token);
        }
        assert!(!is_null_token("Nancy"));

        let column = infer_column(vec![Some("1.5".into()), Some("+nan".into())]);
        assert_eq!(column, ColumnData::Float64(vec![Some(1.5), None]));
    }

    #[test]
    fn test_status_log_time_columns_besides_timestamp() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "shard.csv",
            "timestamp,participantId,lastMealTime\n2022-03-01T00:05:00Z,1,2022-03-01 07:30:00\n",
        );

        let logs = read_csv(&dir.path().join("shard.csv"), "shard", TimeCoercion::Strict("timestamp")).unwrap();
        assert_eq!(logs.require("timestamp").unwrap().dtype(), DType::DateTime);
        assert_eq!(logs.require("lastMealTime").unwrap().dtype(), DType::DateTime);

        write(
            dir.path(),
            "bad.csv",
            "timestamp,lastMealTime\n2022-03-01T00:05:00Z,breakfast\n",
        );
        assert!(matches!(
            read_csv(&dir.path().join("bad.csv"), "bad", TimeCoercion::Strict("timestamp")),
            Err(VastError::Parse { .. })
        ));
    }
}
