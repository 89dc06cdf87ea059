// 👥 Participant views: kids, age groups, income, education

use crate::error::Result;
use crate::table::{Column, ColumnData, Table};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};

/// Age bins are half-open: [20,30) [30,40) [40,50)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "20-29")]
    Twenties,
    #[serde(rename = "30-39")]
    Thirties,
    #[serde(rename = "40-49")]
    Forties,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Twenties, AgeGroup::Thirties, AgeGroup::Forties];

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Twenties => "20-29",
            AgeGroup::Thirties => "30-39",
            AgeGroup::Forties => "40-49",
        }
    }

    pub fn from_age(age: f64) -> Option<AgeGroup> {
        if age >= 20.0 && age < 30.0 {
            Some(AgeGroup::Twenties)
        } else if age >= 30.0 && age < 40.0 {
            Some(AgeGroup::Thirties)
        } else if age >= 40.0 && age < 50.0 {
            Some(AgeGroup::Forties)
        } else {
            None
        }
    }
}

// ============================================================================
// HOUSEHOLD / KIDS
// ============================================================================

/// (householdSize, haveKids) → count, ascending by key
pub fn household_kid_counts(participants: &Table) -> Result<Table> {
    let sizes = participants.ints("householdSize")?;
    let kids = participants.bools("haveKids")?;

    let mut counts: BTreeMap<(i64, bool), i64> = BTreeMap::new();
    for (size, has_kids) in sizes.iter().zip(kids.iter()) {
        if let (Some(size), Some(has_kids)) = (size, has_kids) {
            *counts.entry((*size, *has_kids)).or_default() += 1;
        }
    }

    Table::from_columns(
        "household_kid_counts",
        vec![
            Column::new(
                "householdSize",
                ColumnData::Int64(counts.keys().map(|(size, _)| Some(*size)).collect()),
            ),
            Column::new(
                "haveKids",
                ColumnData::Bool(counts.keys().map(|(_, kids)| Some(*kids)).collect()),
            ),
            Column::new(
                "count",
                ColumnData::Int64(counts.values().map(|c| Some(*c)).collect()),
            ),
        ],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KidSplit {
    pub without_kids: u64,
    pub with_kids: u64,
}

pub fn kid_split(participants: &Table) -> Result<KidSplit> {
    let mut split = KidSplit::default();
    for has_kids in participants.bools("haveKids")?.iter().flatten() {
        if *has_kids {
            split.with_kids += 1;
        } else {
            split.without_kids += 1;
        }
    }
    Ok(split)
}

// ============================================================================
// AGE
// ============================================================================

/// Non-null participant ages, table order
pub fn ages(participants: &Table) -> Result<Vec<f64>> {
    Ok(participants.numbers("age")?.into_iter().flatten().collect())
}

pub fn age_groups(participants: &Table) -> Result<Vec<Option<AgeGroup>>> {
    Ok(participants
        .numbers("age")?
        .into_iter()
        .map(|age| age.and_then(AgeGroup::from_age))
        .collect())
}

/// Participants joined with their wage entries from the financial journal
pub fn age_vs_income(participants: &Table, financial: &Table) -> Result<Table> {
    let mask: Vec<bool> = financial
        .labels("category")?
        .iter()
        .map(|category| category.as_deref() == Some("Wage"))
        .collect();
    let wages = financial.filter(&mask);

    let mut joined = participants.inner_join(&wages, "participantId")?;
    joined.name = "age_vs_income".to_string();
    Ok(joined)
}

// ============================================================================
// EDUCATION PIVOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub age_group: AgeGroup,
    pub counts: Vec<u64>,
}

/// Participants per (age group, education level), zero-filled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationPivot {
    pub levels: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl EducationPivot {
    pub fn count(&self, group: AgeGroup, level: &str) -> Option<u64> {
        let column = self.levels.iter().position(|l| l == level)?;
        self.rows
            .iter()
            .find(|row| row.age_group == group)
            .map(|row| row.counts[column])
    }

    /// One JSON object per age group: {"ageGroup": "20-29", "<level>": n, ...}
    pub fn records(&self) -> Vec<Json> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert("ageGroup".to_string(), Json::from(row.age_group.label()));
                for (level, count) in self.levels.iter().zip(&row.counts) {
                    record.insert(level.clone(), Json::from(*count));
                }
                Json::Object(record)
            })
            .collect()
    }
}

pub fn education_pivot(participants: &Table) -> Result<EducationPivot> {
    let groups = age_groups(participants)?;
    let levels = participants.labels("educationLevel")?;

    let mut cells: BTreeMap<(AgeGroup, String), u64> = BTreeMap::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (group, level) in groups.into_iter().zip(levels) {
        if let (Some(group), Some(level)) = (group, level) {
            seen.insert(level.clone());
            *cells.entry((group, level)).or_default() += 1;
        }
    }

    let levels: Vec<String> = seen.into_iter().collect();
    let rows = AgeGroup::ALL
        .iter()
        .map(|group| PivotRow {
            age_group: *group,
            counts: levels
                .iter()
                .map(|level| cells.get(&(*group, level.clone())).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    Ok(EducationPivot { levels, rows })
}
