// 🖥️ Dashboard - immutable view model built once at startup
//
// Startup order: load snapshots → compute aggregates → build charts → render
// every page to HTML. Requests only pick one of the prebuilt documents.

pub mod charts;
pub mod pages;
#[cfg(feature = "server")]
pub mod router;

use crate::aggregate::Aggregates;
use crate::config::{DatasetLayout, GraphSettings};
use crate::error::Result;
use crate::snapshot::SnapshotMeta;
use crate::store::DataStore;
use crate::table::Table;
use pages::{render_dashboard, render_home, Page, Section};
use serde_json::{json, Map, Value as Json};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Dashboard {
    home: String,
    participant: String,
    social_activity: String,
    business: String,
    data_store: Json,
    manifest: Vec<SnapshotMeta>,
}

/// Rows as JSON objects keyed by column name
pub fn table_records(table: &Table) -> Vec<Json> {
    (0..table.height())
        .map(|row| {
            let record: Map<String, Json> = table
                .column_names()
                .into_iter()
                .zip(table.row(row))
                .map(|(name, value)| (name.to_string(), json!(value)))
                .collect();
            Json::Object(record)
        })
        .collect()
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn participant_sections(aggregates: &Aggregates) -> Result<Vec<Section>> {
    let split = aggregates.kid_split;
    let total = split.with_kids + split.without_kids;

    let busiest_group = aggregates
        .education_pivot
        .rows
        .iter()
        .max_by_key(|row| (row.counts.iter().sum::<u64>(), std::cmp::Reverse(row.age_group)))
        .map(|row| row.age_group.label())
        .unwrap_or("none");

    Ok(vec![
        Section {
            chart: charts::kid_bar(&split),
            caption: format!(
                "{} of {} participants ({:.0}%) have no kids, which tells family-focused services how large their audience really is.",
                split.without_kids,
                total,
                percent(split.without_kids, total)
            ),
        },
        Section {
            chart: charts::age_histogram(&aggregates.ages),
            caption: "Ages split into eight bins. The prime working years carry most of the population, so their choices shape most of the trends on this page.".to_string(),
        },
        Section {
            chart: charts::age_income_scatter(&aggregates.age_vs_income)?,
            caption: format!(
                "{} wage payments plotted against the age of the earner. The spread in the middle years reflects very different career paths.",
                aggregates.age_vs_income.height()
            ),
        },
        Section {
            chart: charts::household_bar(&aggregates.household_kid_counts)?,
            caption: "Larger households are the ones with kids; one- and two-person households are almost all kid-free.".to_string(),
        },
        Section {
            chart: charts::education_bar(&aggregates.education_pivot),
            caption: format!(
                "Education level per age group. The {} group is the largest of the three.",
                busiest_group
            ),
        },
    ])
}

fn social_sections(aggregates: &Aggregates) -> Vec<Section> {
    let graph = &aggregates.social_graph;
    let peak = aggregates
        .interactions_by_day
        .iter()
        .max_by_key(|(day, count)| (**count, std::cmp::Reverse(**day)));

    vec![
        Section {
            chart: charts::social_network(graph),
            caption: format!(
                "Who talks to whom: {} participants and {} heavy connections around the {} most active senders. Clusters point at active groups, isolated dots at people on the edge.",
                graph.nodes.len(),
                graph.edges.len(),
                graph.top_participants.len()
            ),
        },
        Section {
            chart: charts::interaction_timeline(&aggregates.interactions_by_day),
            caption: match peak {
                Some((day, count)) => format!(
                    "Interactions per day. The busiest day was {} with {} interactions; peaks like it usually line up with events.",
                    day, count
                ),
                None => "No interactions recorded.".to_string(),
            },
        },
    ]
}

fn business_sections(aggregates: &Aggregates) -> Vec<Section> {
    let top = aggregates
        .education_requirements
        .first()
        .map(|c| c.label.as_str())
        .unwrap_or("none");

    vec![
        Section {
            chart: charts::education_pie(&aggregates.education_requirements),
            caption: format!(
                "Education required by each job posting. {} is the most common requirement, useful context for workforce planning.",
                top
            ),
        },
        Section {
            chart: charts::building_map(&aggregates.building_locations),
            caption: format!(
                "{} apartments, pubs, restaurants and schools placed on the city map. Each type clusters in its own zones, with overlap in the busier areas.",
                aggregates.building_locations.len()
            ),
        },
    ]
}

fn data_store(aggregates: &Aggregates) -> Json {
    json!({
        "householdKidCounts": table_records(&aggregates.household_kid_counts),
        "kidCounts": {
            "false": aggregates.kid_split.without_kids,
            "true": aggregates.kid_split.with_kids,
        },
        "ageVsIncome": table_records(&aggregates.age_vs_income),
        "educationPivot": aggregates.education_pivot.records(),
    })
}

impl Dashboard {
    /// Render every page from precomputed views
    pub fn build(manifest: Vec<SnapshotMeta>, aggregates: &Aggregates) -> Result<Self> {
        let dashboard = Dashboard {
            home: render_home(&manifest),
            participant: render_dashboard(Page::Participant, &participant_sections(aggregates)?)?,
            social_activity: render_dashboard(Page::SocialActivity, &social_sections(aggregates))?,
            business: render_dashboard(Page::Business, &business_sections(aggregates))?,
            data_store: data_store(aggregates),
            manifest,
        };
        info!(
            pages = Page::ALL.len(),
            bytes = Page::ALL.iter().map(|p| dashboard.page(*p).len()).sum::<usize>(),
            "rendered dashboard pages"
        );
        Ok(dashboard)
    }

    /// Full presentation-stage startup from the snapshot cache
    pub fn load(layout: &DatasetLayout, graph: GraphSettings) -> Result<Self> {
        let store = DataStore::load(layout)?;
        let aggregates = Aggregates::compute(&store, graph)?;
        Dashboard::build(store.manifest, &aggregates)
    }

    pub fn page(&self, page: Page) -> &str {
        match page {
            Page::Home => &self.home,
            Page::Participant => &self.participant,
            Page::SocialActivity => &self.social_activity,
            Page::Business => &self.business,
        }
    }

    /// Document served for a request path
    pub fn render(&self, path: &str) -> &str {
        self.page(Page::from_path(path))
    }

    pub fn data_store(&self) -> &Json {
        &self.data_store
    }

    pub fn manifest(&self) -> &[SnapshotMeta] {
        &self.manifest
    }
}
