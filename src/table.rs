// 📋 Table Model - named, typed, nullable columns
//
// Every dataset in the pipeline (status logs, attribute tables, journals and
// derived views) is a Table. Columns keep their dtype end to end so a table
// written to a snapshot comes back identical.

use crate::error::{Result, VastError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// DTYPES & CELL VALUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Str,
    DateTime,
}

impl DType {
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Str => "str",
            DType::DateTime => "datetime",
        }
    }

    pub fn from_name(name: &str) -> Option<DType> {
        match name {
            "int64" => Some(DType::Int64),
            "float64" => Some(DType::Float64),
            "bool" => Some(DType::Bool),
            "str" => Some(DType::Str),
            "datetime" => Some(DType::DateTime),
            _ => None,
        }
    }

    /// Common type two columns are promoted to when concatenated
    pub fn unify(self, other: DType) -> DType {
        match (self, other) {
            (a, b) if a == b => a,
            (DType::Int64, DType::Float64) | (DType::Float64, DType::Int64) => DType::Float64,
            _ => DType::Str,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single owned cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ============================================================================
// COLUMN DATA
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
    DateTime(Vec<Option<DateTime<Utc>>>),
}

/// Apply the same expression to the inner vector of every variant
macro_rules! each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int64($v) => $body,
            ColumnData::Float64($v) => $body,
            ColumnData::Bool($v) => $body,
            ColumnData::Str($v) => $body,
            ColumnData::DateTime($v) => $body,
        }
    };
}

/// Same as `each_variant` but rebuilds a column of the same variant
macro_rules! map_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int64($v) => ColumnData::Int64($body),
            ColumnData::Float64($v) => ColumnData::Float64($body),
            ColumnData::Bool($v) => ColumnData::Bool($body),
            ColumnData::Str($v) => ColumnData::Str($body),
            ColumnData::DateTime($v) => ColumnData::DateTime($body),
        }
    };
}

impl ColumnData {
    pub fn nulls(dtype: DType, len: usize) -> ColumnData {
        match dtype {
            DType::Int64 => ColumnData::Int64(vec![None; len]),
            DType::Float64 => ColumnData::Float64(vec![None; len]),
            DType::Bool => ColumnData::Bool(vec![None; len]),
            DType::Str => ColumnData::Str(vec![None; len]),
            DType::DateTime => ColumnData::DateTime(vec![None; len]),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int64(_) => DType::Int64,
            ColumnData::Float64(_) => DType::Float64,
            ColumnData::Bool(_) => DType::Bool,
            ColumnData::Str(_) => DType::Str,
            ColumnData::DateTime(_) => DType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        each_variant!(self, v => v[row].is_none())
    }

    pub fn null_count(&self) -> usize {
        each_variant!(self, v => v.iter().filter(|c| c.is_none()).count())
    }

    /// True for empty columns too
    pub fn is_all_null(&self) -> bool {
        self.null_count() == self.len()
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Int64(v) => v[row].map_or(Value::Null, Value::Int),
            ColumnData::Float64(v) => v[row].map_or(Value::Null, Value::Float),
            ColumnData::Bool(v) => v[row].map_or(Value::Null, Value::Bool),
            ColumnData::Str(v) => v[row].clone().map_or(Value::Null, Value::Str),
            ColumnData::DateTime(v) => v[row].map_or(Value::Null, Value::DateTime),
        }
    }

    /// Text form of a cell, used for string promotion and join keys
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Int64(v) => v[row].map(|x| x.to_string()),
            ColumnData::Float64(v) => v[row].map(|x| x.to_string()),
            ColumnData::Bool(v) => v[row].map(|x| x.to_string()),
            ColumnData::Str(v) => v[row].clone(),
            ColumnData::DateTime(v) => v[row].map(|x| x.to_rfc3339()),
        }
    }

    pub fn take(&self, rows: &[usize]) -> ColumnData {
        map_variant!(self, v => rows.iter().map(|&i| v[i].clone()).collect())
    }

    pub fn filter(&self, mask: &[bool]) -> ColumnData {
        map_variant!(self, v => v
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.clone())
            .collect())
    }

    /// Convert to a wider dtype (see `DType::unify`)
    pub fn cast(&self, target: DType) -> ColumnData {
        if self.dtype() == target {
            return self.clone();
        }
        match (self, target) {
            (ColumnData::Int64(v), DType::Float64) => {
                ColumnData::Float64(v.iter().map(|c| c.map(|x| x as f64)).collect())
            }
            (_, DType::Str) => ColumnData::Str((0..self.len()).map(|i| self.render(i)).collect()),
            // Only all-null columns are cast across unrelated dtypes
            _ => ColumnData::nulls(target, self.len()),
        }
    }

    /// Append rows of a column with the same dtype
    fn extend_from(&mut self, other: &ColumnData) {
        match (self, other) {
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a.extend_from_slice(b),
            (ColumnData::Float64(a), ColumnData::Float64(b)) => a.extend_from_slice(b),
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a.extend_from_slice(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            (ColumnData::DateTime(a), ColumnData::DateTime(b)) => a.extend_from_slice(b),
            (a, b) => {
                let unified = a.dtype().unify(b.dtype());
                let mut widened = a.cast(unified);
                widened.extend_from(&b.cast(unified));
                *a = widened;
            }
        }
    }
}

// ============================================================================
// COLUMN & TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered collection of equally long columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn empty(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for column in &columns {
                if column.len() != expected {
                    return Err(VastError::Shape {
                        column: column.name.clone(),
                        expected,
                        actual: column.len(),
                    });
                }
            }
        }
        Ok(Table {
            name: name.into(),
            columns,
        })
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| VastError::missing_column(&self.name, name))
    }

    /// Replace a column in place, or append it if the name is new
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.height() {
            return Err(VastError::Shape {
                column: column.name,
                expected: self.height(),
                actual,
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.data.get(row)).collect()
    }

    // ------------------------------------------------------------------------
    // Typed column access
    // ------------------------------------------------------------------------

    fn type_error(&self, column: &Column, expected: &str) -> VastError {
        VastError::ColumnType {
            table: self.name.clone(),
            column: column.name.clone(),
            expected: expected.to_string(),
            actual: column.dtype().name().to_string(),
        }
    }

    /// Borrow the column as `T`. A column with no values at all reads as
    /// all-null whatever its stored dtype.
    fn typed<'a, T: Clone>(
        &'a self,
        name: &str,
        expected: &str,
        pick: impl Fn(&'a ColumnData) -> Option<&'a [Option<T>]>,
    ) -> Result<Cow<'a, [Option<T>]>> {
        let column = self.require(name)?;
        match pick(&column.data) {
            Some(values) => Ok(Cow::Borrowed(values)),
            None if column.data.is_all_null() => Ok(Cow::Owned(vec![None; column.len()])),
            None => Err(self.type_error(column, expected)),
        }
    }

    pub fn ints(&self, name: &str) -> Result<Cow<'_, [Option<i64>]>> {
        self.typed(name, "int64", |data| match data {
            ColumnData::Int64(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn bools(&self, name: &str) -> Result<Cow<'_, [Option<bool>]>> {
        self.typed(name, "bool", |data| match data {
            ColumnData::Bool(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn strs(&self, name: &str) -> Result<Cow<'_, [Option<String>]>> {
        self.typed(name, "str", |data| match data {
            ColumnData::Str(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn datetimes(&self, name: &str) -> Result<Cow<'_, [Option<DateTime<Utc>>]>> {
        self.typed(name, "datetime", |data| match data {
            ColumnData::DateTime(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Int64 or Float64 column widened to f64
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.require(name)?;
        match &column.data {
            ColumnData::Int64(v) => Ok(v.iter().map(|c| c.map(|x| x as f64)).collect()),
            ColumnData::Float64(v) => Ok(v.clone()),
            data if data.is_all_null() => Ok(vec![None; data.len()]),
            _ => Err(self.type_error(column, "numeric")),
        }
    }

    /// Any column rendered as text (labels, categories)
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.require(name)?;
        Ok((0..column.len()).map(|i| column.data.render(i)).collect())
    }

    // ------------------------------------------------------------------------
    // Row operations
    // ------------------------------------------------------------------------

    pub fn filter(&self, mask: &[bool]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.filter(mask)))
                .collect(),
        }
    }

    pub fn take(&self, rows: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
        }
    }

    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.require(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            name: self.name.clone(),
            columns,
        })
    }

    /// Rows that contain at least one null cell
    pub fn null_rows(&self) -> Vec<bool> {
        (0..self.height())
            .map(|row| self.columns.iter().any(|c| c.data.is_null(row)))
            .collect()
    }

    pub fn drop_nulls(&self) -> Table {
        let keep: Vec<bool> = self.null_rows().iter().map(|null| !null).collect();
        self.filter(&keep)
    }

    /// Vertical union. Columns are matched by name in first-seen order;
    /// a table lacking a column contributes nulls for it.
    pub fn concat(name: impl Into<String>, tables: &[Table]) -> Table {
        let mut order: Vec<String> = Vec::new();
        let mut first_seen: HashMap<String, DType> = HashMap::new();
        let mut observed: HashMap<String, DType> = HashMap::new();
        for table in tables {
            for column in &table.columns {
                if !first_seen.contains_key(&column.name) {
                    order.push(column.name.clone());
                    first_seen.insert(column.name.clone(), column.dtype());
                }
                // all-null columns carry no type information
                if column.data.is_all_null() {
                    continue;
                }
                observed
                    .entry(column.name.clone())
                    .and_modify(|dtype| *dtype = dtype.unify(column.dtype()))
                    .or_insert(column.dtype());
            }
        }
        let dtypes: HashMap<String, DType> = first_seen
            .into_iter()
            .map(|(name, dtype)| {
                let dtype = observed.get(&name).copied().unwrap_or(dtype);
                (name, dtype)
            })
            .collect();

        let mut columns: Vec<Column> = order
            .iter()
            .map(|name| Column::new(name.clone(), ColumnData::nulls(dtypes[name], 0)))
            .collect();

        for table in tables {
            let height = table.height();
            for column in columns.iter_mut() {
                let dtype = dtypes[&column.name];
                match table.column(&column.name) {
                    Some(source) => column.data.extend_from(&source.data.cast(dtype)),
                    None => column.data.extend_from(&ColumnData::nulls(dtype, height)),
                }
            }
        }

        Table {
            name: name.into(),
            columns,
        }
    }

    /// Inner join on a single key column present in both tables.
    ///
    /// Output order follows the left table; each left row is repeated for
    /// every matching right row in right-table order. Non-key columns
    /// present on both sides get `_x` / `_y` suffixes. Null keys never match.
    pub fn inner_join(&self, right: &Table, on: &str) -> Result<Table> {
        let left_keys = self.require(on)?;
        let right_keys = right.require(on)?;

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for row in 0..right.height() {
            if let Some(key) = right_keys.data.render(row) {
                index.entry(key).or_default().push(row);
            }
        }

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for row in 0..self.height() {
            if let Some(matches) = left_keys.data.render(row).and_then(|k| index.get(&k)) {
                for &r in matches {
                    left_rows.push(row);
                    right_rows.push(r);
                }
            }
        }

        let shared = |name: &str| name != on && self.column(name).is_some() && right.column(name).is_some();

        let mut columns = Vec::with_capacity(self.width() + right.width());
        for column in &self.columns {
            let name = if shared(&column.name) {
                format!("{}_x", column.name)
            } else {
                column.name.clone()
            };
            columns.push(Column::new(name, column.data.take(&left_rows)));
        }
        for column in &right.columns {
            if column.name == on {
                continue;
            }
            let name = if shared(&column.name) {
                format!("{}_y", column.name)
            } else {
                column.name.clone()
            };
            columns.push(Column::new(name, column.data.take(&right_rows)));
        }

        Table::from_columns(format!("{}+{}", self.name, right.name), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::from_columns(
            "people",
            vec![
                Column::new("id", ColumnData::Int64(vec![Some(1), Some(2), Some(3)])),
                Column::new(
                    "name",
                    ColumnData::Str(vec![Some("ana".into()), None, Some("cy".into())]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Table::from_columns(
            "bad",
            vec![
                Column::new("a", ColumnData::Int64(vec![Some(1)])),
                Column::new("b", ColumnData::Int64(vec![Some(1), Some(2)])),
            ],
        );
        assert!(matches!(result, Err(VastError::Shape { .. })));
    }

    #[test]
    fn test_drop_nulls() {
        let cleaned = people().drop_nulls();
        assert_eq!(cleaned.height(), 2);
        assert_eq!(cleaned.ints("id").unwrap().to_vec(), vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_concat_unions_columns_and_promotes() {
        let a = Table::from_columns(
            "a",
            vec![Column::new("v", ColumnData::Int64(vec![Some(1)]))],
        )
        .unwrap();
        let b = Table::from_columns(
            "b",
            vec![
                Column::new("v", ColumnData::Float64(vec![Some(2.5)])),
                Column::new("extra", ColumnData::Bool(vec![Some(true)])),
            ],
        )
        .unwrap();

        let joined = Table::concat("ab", &[a, b]);
        assert_eq!(joined.column_names(), vec!["v", "extra"]);
        assert_eq!(joined.numbers("v").unwrap(), vec![Some(1.0), Some(2.5)]);
        assert_eq!(joined.bools("extra").unwrap().to_vec(), vec![None, Some(true)]);
    }

    #[test]
    fn test_concat_mismatch_promotes_to_str() {
        let a = Table::from_columns("a", vec![Column::new("v", ColumnData::Int64(vec![Some(7)]))]).unwrap();
        let b = Table::from_columns("b", vec![Column::new("v", ColumnData::Bool(vec![Some(false)]))]).unwrap();

        let joined = Table::concat("ab", &[a, b]);
        assert_eq!(
            joined.strs("v").unwrap().to_vec(),
            vec![Some("7".to_string()), Some("false".to_string())]
        );
    }

    #[test]
    fn test_inner_join_keeps_left_order_and_suffixes() {
        let left = people();
        let right = Table::from_columns(
            "pay",
            vec![
                Column::new("id", ColumnData::Int64(vec![Some(3), Some(1), Some(3), Some(9)])),
                Column::new("name", ColumnData::Str(vec![Some("x".into()); 4])),
                Column::new(
                    "amount",
                    ColumnData::Float64(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
                ),
            ],
        )
        .unwrap();

        let joined = left.inner_join(&right, "id").unwrap();
        assert_eq!(joined.column_names(), vec!["id", "name_x", "name_y", "amount"]);
        assert_eq!(joined.ints("id").unwrap().to_vec(), vec![Some(1), Some(3), Some(3)]);
        assert_eq!(
            joined.numbers("amount").unwrap(),
            vec![Some(2.0), Some(1.0), Some(3.0)]
        );
    }

    #[test]
    fn test_inner_join_without_matches_is_empty() {
        let right = Table::from_columns(
            "none",
            vec![Column::new("id", ColumnData::Int64(vec![Some(42)]))],
        )
        .unwrap();
        let joined = people().inner_join(&right, "id").unwrap();
        assert_eq!(joined.height(), 0);
    }

    #[test]
    fn test_typed_access_reports_wrong_type() {
        let err = people().bools("id").unwrap_err();
        assert!(matches!(err, VastError::ColumnType { .. }));
        assert!(matches!(
            people().ints("missing"),
            Err(VastError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_set_column_replaces_and_checks_length() {
        let mut table = people();
        table
            .set_column(Column::new("name", ColumnData::Int64(vec![Some(7); 3])))
            .unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.ints("name").unwrap().to_vec(), vec![Some(7); 3]);

        match table.set_column(Column::new("short", ColumnData::Bool(vec![Some(true)]))) {
            Err(VastError::Shape { column, expected, actual }) => {
                assert_eq!(column, "short");
                assert_eq!((expected, actual), (3, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_all_null_column_reads_as_any_type() {
        let table = Table::from_columns(
            "Pubs.csv",
            vec![
                Column::new("location", ColumnData::Int64(vec![None, None])),
                Column::new("empty", ColumnData::Str(vec![None, None])),
            ],
        )
        .unwrap();

        assert_eq!(table.strs("location").unwrap().to_vec(), vec![None, None]);
        assert_eq!(table.bools("empty").unwrap().to_vec(), vec![None, None]);
        assert_eq!(table.numbers("empty").unwrap(), vec![None, None]);
        assert_eq!(table.datetimes("empty").unwrap().len(), 2);
        // a column holding values is still strictly typed
        assert!(matches!(people().strs("id"), Err(VastError::ColumnType { .. })));
    }

    #[test]
    fn test_concat_ignores_type_of_all_null_columns() {
        let blank = Table::from_columns(
            "shard1",
            vec![Column::new("jobId", ColumnData::Str(vec![None]))],
        )
        .unwrap();
        let filled = Table::from_columns(
            "shard2",
            vec![Column::new("jobId", ColumnData::Int64(vec![Some(7)]))],
        )
        .unwrap();

        let joined = Table::concat("logs", &[blank, filled]);
        assert_eq!(joined.require("jobId").unwrap().dtype(), DType::Int64);
        assert_eq!(joined.ints("jobId").unwrap().to_vec(), vec![None, Some(7)]);
    }
}
