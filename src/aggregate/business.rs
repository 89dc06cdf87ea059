// 🏙️ Business views: job education requirements and building locations

use crate::error::{Result, VastError};
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// JOBS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

/// Job postings per required education level, most common first
pub fn education_requirement_counts(jobs: &Table) -> Result<Vec<CategoryCount>> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for requirement in jobs.labels("educationRequirement")?.into_iter().flatten() {
        *counts.entry(requirement).or_default() += 1;
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    Ok(counts)
}

// ============================================================================
// BUILDINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    Apartment,
    Pub,
    Restaurant,
    School,
}

impl BuildingType {
    /// Concatenation order of the location view
    pub const ALL: [BuildingType; 4] = [
        BuildingType::Apartment,
        BuildingType::Pub,
        BuildingType::Restaurant,
        BuildingType::School,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BuildingType::Apartment => "apartment",
            BuildingType::Pub => "pub",
            BuildingType::Restaurant => "restaurant",
            BuildingType::School => "school",
        }
    }

    /// Attribute table the locations come from
    pub fn source_table(&self) -> &'static str {
        match self {
            BuildingType::Apartment => "Apartments.csv",
            BuildingType::Pub => "Pubs.csv",
            BuildingType::Restaurant => "Restaurants.csv",
            BuildingType::School => "Schools.csv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildingLocation {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "buildingType")]
    pub building_type: BuildingType,
}

/// `POINT (x y)` → (x, y). Exactly two numeric tokens are required.
pub fn parse_point(text: &str) -> std::result::Result<(f64, f64), String> {
    let inner = text
        .trim()
        .strip_prefix("POINT")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| "expected POINT (x y)".to_string())?;

    let tokens: Vec<&str> = inner.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(format!("expected 2 coordinates, found {}", tokens.len()));
    }

    let coordinate = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate {:?}: {}", token, e))
    };
    Ok((coordinate(tokens[0])?, coordinate(tokens[1])?))
}

/// Locations of one building table; rows without a location are skipped
pub fn table_locations(table: &Table, building_type: BuildingType) -> Result<Vec<BuildingLocation>> {
    let mut locations = Vec::with_capacity(table.height());
    for (row, location) in table.strs("location")?.iter().enumerate() {
        let Some(text) = location else { continue };
        let (x, y) = parse_point(text).map_err(|reason| VastError::Parse {
            table: table.name.clone(),
            column: "location".to_string(),
            row,
            value: text.clone(),
            reason,
        })?;
        locations.push(BuildingLocation { x, y, building_type });
    }
    Ok(locations)
}

/// Apartments, pubs, restaurants and schools, concatenated in that order
pub fn building_locations(attributes: &BTreeMap<String, Table>) -> Result<Vec<BuildingLocation>> {
    let mut all = Vec::new();
    for building_type in BuildingType::ALL {
        let table = attributes
            .get(building_type.source_table())
            .ok_or_else(|| VastError::missing(building_type.source_table()))?;
        all.extend(table_locations(table, building_type)?);
    }
    Ok(all)
}
