// 💾 Snapshot Cache - one SQLite file per processed table
//
// Layout of a snapshot file:
//   snapshot_meta(key, value)            name, run_id, created_at, row_count, fingerprint
//   snapshot_columns(position, name, dtype)
//   snapshot_rows(row_index, c0 .. cN)   one SQL column per table column
//
// Reading rebuilds the exact table and checks its SHA-256 fingerprint.

use crate::error::{Result, VastError};
use crate::table::{Column, ColumnData, DType, Table};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const FORMAT_VERSION: &str = "1";

/// Provenance stored alongside every snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMeta {
    pub name: String,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: Table,
    pub meta: SnapshotMeta,
}

// ============================================================================
// FINGERPRINT
// ============================================================================

/// SHA-256 over schema and every cell, column by column
pub fn fingerprint(table: &Table) -> String {
    let mut hasher = Sha256::new();
    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(column.dtype().name().as_bytes());
        hasher.update([0u8]);
    }
    for column in table.columns() {
        match &column.data {
            ColumnData::Int64(v) => v.iter().for_each(|c| match c {
                None => hasher.update([0u8]),
                Some(x) => {
                    hasher.update([1u8]);
                    hasher.update(x.to_le_bytes());
                }
            }),
            ColumnData::Float64(v) => v.iter().for_each(|c| match c {
                None => hasher.update([0u8]),
                Some(x) => {
                    hasher.update([1u8]);
                    hasher.update(x.to_bits().to_le_bytes());
                }
            }),
            ColumnData::Bool(v) => v.iter().for_each(|c| match c {
                None => hasher.update([0u8]),
                Some(x) => hasher.update([1u8, *x as u8]),
            }),
            ColumnData::Str(v) => v.iter().for_each(|c| match c {
                None => hasher.update([0u8]),
                Some(s) => {
                    hasher.update([1u8]);
                    hasher.update((s.len() as u64).to_le_bytes());
                    hasher.update(s.as_bytes());
                }
            }),
            ColumnData::DateTime(v) => v.iter().for_each(|c| match c {
                None => hasher.update([0u8]),
                Some(dt) => {
                    hasher.update([1u8]);
                    hasher.update(dt.timestamp().to_le_bytes());
                    hasher.update(dt.timestamp_subsec_nanos().to_le_bytes());
                }
            }),
        }
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// WRITER
// ============================================================================

fn sql_type(dtype: DType) -> &'static str {
    match dtype {
        DType::Int64 | DType::Bool => "INTEGER",
        DType::Float64 => "REAL",
        DType::Str | DType::DateTime => "TEXT",
    }
}

fn to_sql(data: &ColumnData, row: usize) -> SqlValue {
    match data {
        ColumnData::Int64(v) => v[row].map_or(SqlValue::Null, SqlValue::Integer),
        ColumnData::Float64(v) => v[row].map_or(SqlValue::Null, SqlValue::Real),
        ColumnData::Bool(v) => v[row].map_or(SqlValue::Null, |b| SqlValue::Integer(b as i64)),
        ColumnData::Str(v) => v[row].clone().map_or(SqlValue::Null, SqlValue::Text),
        ColumnData::DateTime(v) => v[row].map_or(SqlValue::Null, |dt| {
            SqlValue::Text(dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
        }),
    }
}

fn setup_snapshot(conn: &Connection, table: &Table) -> Result<()> {
    conn.execute(
        "CREATE TABLE snapshot_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    conn.execute(
        "CREATE TABLE snapshot_columns (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            dtype TEXT NOT NULL
        )",
        [],
    )?;

    let mut ddl = String::from("CREATE TABLE snapshot_rows (row_index INTEGER PRIMARY KEY");
    for (i, column) in table.columns().iter().enumerate() {
        ddl.push_str(&format!(", c{} {}", i, sql_type(column.dtype())));
    }
    ddl.push(')');
    conn.execute(&ddl, [])?;
    Ok(())
}

/// Write a table to `path`, replacing any previous snapshot there
pub fn write_snapshot(path: &Path, table: &Table, run_id: Uuid) -> Result<SnapshotMeta> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let mut conn = Connection::open(path)?;
    setup_snapshot(&conn, table)?;

    let meta = SnapshotMeta {
        name: table.name.clone(),
        run_id,
        created_at: Utc::now(),
        row_count: table.height(),
        fingerprint: fingerprint(table),
    };

    let tx = conn.transaction()?;
    {
        let mut insert_meta = tx.prepare("INSERT INTO snapshot_meta (key, value) VALUES (?1, ?2)")?;
        for (key, value) in [
            ("format_version", FORMAT_VERSION.to_string()),
            ("name", meta.name.clone()),
            ("run_id", meta.run_id.to_string()),
            ("created_at", meta.created_at.to_rfc3339()),
            ("row_count", meta.row_count.to_string()),
            ("fingerprint", meta.fingerprint.clone()),
        ] {
            insert_meta.execute(params![key, value])?;
        }

        let mut insert_column =
            tx.prepare("INSERT INTO snapshot_columns (position, name, dtype) VALUES (?1, ?2, ?3)")?;
        for (i, column) in table.columns().iter().enumerate() {
            insert_column.execute(params![i as i64, column.name, column.dtype().name()])?;
        }

        let placeholders: Vec<String> = (0..=table.width()).map(|i| format!("?{}", i + 1)).collect();
        let names: Vec<String> = (0..table.width()).map(|i| format!(", c{}", i)).collect();
        let mut insert_row = tx.prepare(&format!(
            "INSERT INTO snapshot_rows (row_index{}) VALUES ({})",
            names.concat(),
            placeholders.join(", ")
        ))?;

        let mut values = Vec::with_capacity(table.width() + 1);
        for row in 0..table.height() {
            values.clear();
            values.push(SqlValue::Integer(row as i64));
            values.extend(table.columns().iter().map(|c| to_sql(&c.data, row)));
            insert_row.execute(params_from_iter(values.iter()))?;
        }
    }
    tx.commit()?;

    info!(table = %meta.name, rows = meta.row_count, path = %path.display(), "wrote snapshot");
    Ok(meta)
}

// ============================================================================
// READER
// ============================================================================

fn corrupt(path: &Path, reason: impl Into<String>) -> VastError {
    VastError::SnapshotCorrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_meta(conn: &Connection, path: &Path) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM snapshot_meta")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let meta = rows.collect::<rusqlite::Result<HashMap<_, _>>>()?;
    let version = meta.get("format_version").cloned();
    match version.as_deref() {
        Some(FORMAT_VERSION) => Ok(meta),
        Some(other) => Err(corrupt(path, format!("unsupported format version {}", other))),
        None => Err(corrupt(path, "missing format version")),
    }
}

fn meta_field<'a>(meta: &'a HashMap<String, String>, key: &str, path: &Path) -> Result<&'a str> {
    meta.get(key)
        .map(String::as_str)
        .ok_or_else(|| corrupt(path, format!("missing meta key {}", key)))
}

fn push_cell(data: &mut ColumnData, value: SqlValue, path: &Path) -> Result<()> {
    match (data, value) {
        (ColumnData::Int64(v), SqlValue::Null) => v.push(None),
        (ColumnData::Float64(v), SqlValue::Null) => v.push(None),
        (ColumnData::Bool(v), SqlValue::Null) => v.push(None),
        (ColumnData::Str(v), SqlValue::Null) => v.push(None),
        (ColumnData::DateTime(v), SqlValue::Null) => v.push(None),
        (ColumnData::Int64(v), SqlValue::Integer(x)) => v.push(Some(x)),
        (ColumnData::Float64(v), SqlValue::Real(x)) => v.push(Some(x)),
        (ColumnData::Float64(v), SqlValue::Integer(x)) => v.push(Some(x as f64)),
        (ColumnData::Bool(v), SqlValue::Integer(x)) => v.push(Some(x != 0)),
        (ColumnData::Str(v), SqlValue::Text(s)) => v.push(Some(s)),
        (ColumnData::DateTime(v), SqlValue::Text(s)) => {
            let dt = DateTime::parse_from_rfc3339(&s)
                .map_err(|e| corrupt(path, format!("bad datetime {:?}: {}", s, e)))?;
            v.push(Some(dt.with_timezone(&Utc)));
        }
        (data, value) => {
            return Err(corrupt(
                path,
                format!("{:?} cell in {} column", value.data_type(), data.dtype()),
            ))
        }
    }
    Ok(())
}

/// Read a snapshot back into the table it was written from
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.is_file() {
        return Err(VastError::missing(path));
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let meta = read_meta(&conn, path)?;

    let schema: Vec<(String, DType)> = {
        let mut stmt = conn.prepare("SELECT name, dtype FROM snapshot_columns ORDER BY position")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut schema = Vec::new();
        for row in rows {
            let (name, dtype) = row?;
            let dtype = DType::from_name(&dtype)
                .ok_or_else(|| corrupt(path, format!("unknown dtype {}", dtype)))?;
            schema.push((name, dtype));
        }
        schema
    };

    let row_count: usize = meta_field(&meta, "row_count", path)?
        .parse()
        .map_err(|_| corrupt(path, "row_count is not a number"))?;

    let mut data: Vec<ColumnData> = schema
        .iter()
        .map(|(_, dtype)| ColumnData::nulls(*dtype, 0))
        .collect();

    let select = if schema.is_empty() {
        "SELECT row_index FROM snapshot_rows ORDER BY row_index".to_string()
    } else {
        let names: Vec<String> = (0..schema.len()).map(|i| format!("c{}", i)).collect();
        format!("SELECT {} FROM snapshot_rows ORDER BY row_index", names.join(", "))
    };

    let mut stored_rows = 0usize;
    let mut stmt = conn.prepare(&select)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, column) in data.iter_mut().enumerate() {
            push_cell(column, row.get::<_, SqlValue>(i)?, path)?;
        }
        stored_rows += 1;
    }

    if stored_rows != row_count {
        return Err(corrupt(
            path,
            format!("expected {} rows, found {}", row_count, stored_rows),
        ));
    }

    let name = meta_field(&meta, "name", path)?.to_string();
    let columns = schema
        .into_iter()
        .zip(data)
        .map(|((column, _), data)| Column::new(column, data))
        .collect();
    let table = Table::from_columns(name.clone(), columns)?;

    let expected = meta_field(&meta, "fingerprint", path)?;
    let actual = fingerprint(&table);
    if actual != expected {
        return Err(corrupt(path, "fingerprint mismatch"));
    }

    let run_id = Uuid::parse_str(meta_field(&meta, "run_id", path)?)
        .map_err(|e| corrupt(path, format!("bad run id: {}", e)))?;
    let created_at = DateTime::parse_from_rfc3339(meta_field(&meta, "created_at", path)?)
        .map_err(|e| corrupt(path, format!("bad created_at: {}", e)))?
        .with_timezone(&Utc);

    debug!(table = %name, rows = row_count, path = %path.display(), "read snapshot");
    Ok(Snapshot {
        table,
        meta: SnapshotMeta {
            name,
            run_id,
            created_at,
            row_count,
            fingerprint: actual,
        },
    })
}

/// Every path in `paths` that has no snapshot file yet
pub fn missing_snapshots(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| !p.is_file()).cloned().collect()
}
