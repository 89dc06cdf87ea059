// 📊 Aggregation Engine - derived views consumed by the dashboard charts
//
// Every view is a pure function of the loaded tables; they are computed once
// when the dashboard starts.

pub mod business;
pub mod participants;
pub mod social;

use crate::config::GraphSettings;
use crate::error::Result;
use crate::store::{DataStore, FINANCIAL_JOURNAL, JOBS, PARTICIPANTS, SOCIAL_NETWORK};
use crate::table::Table;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

pub use business::{BuildingLocation, BuildingType, CategoryCount};
pub use participants::{AgeGroup, EducationPivot, KidSplit};
pub use social::{Edge, SocialGraph};

#[derive(Debug, Clone)]
pub struct Aggregates {
    pub household_kid_counts: Table,
    pub kid_split: KidSplit,
    pub ages: Vec<f64>,
    pub age_vs_income: Table,
    pub education_pivot: EducationPivot,
    pub social_graph: SocialGraph,
    pub interactions_by_day: BTreeMap<NaiveDate, u64>,
    pub education_requirements: Vec<CategoryCount>,
    pub building_locations: Vec<BuildingLocation>,
}

impl Aggregates {
    pub fn compute(store: &DataStore, graph: GraphSettings) -> Result<Self> {
        let participants = store.attribute(PARTICIPANTS)?;
        let social = store.journal(SOCIAL_NETWORK)?;

        let aggregates = Aggregates {
            household_kid_counts: store.household_kid_counts.clone(),
            kid_split: participants::kid_split(participants)?,
            ages: participants::ages(participants)?,
            age_vs_income: participants::age_vs_income(
                participants,
                store.journal(FINANCIAL_JOURNAL)?,
            )?,
            education_pivot: participants::education_pivot(participants)?,
            social_graph: social::social_graph(social, graph)?,
            interactions_by_day: social::interactions_by_day(social)?,
            education_requirements: business::education_requirement_counts(store.attribute(JOBS)?)?,
            building_locations: business::building_locations(&store.attributes)?,
        };

        info!(
            wage_rows = aggregates.age_vs_income.height(),
            graph_nodes = aggregates.social_graph.nodes.len(),
            graph_edges = aggregates.social_graph.edges.len(),
            days = aggregates.interactions_by_day.len(),
            buildings = aggregates.building_locations.len(),
            "computed aggregate views"
        );
        Ok(aggregates)
    }
}
