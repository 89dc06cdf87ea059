// 📈 Chart builders - Plotly figures and the Cytoscape network
//
// Figures are plain JSON ({"data": [...], "layout": {...}}) rendered in the
// browser by plotly.js; the social graph is a Cytoscape element list.

use crate::aggregate::{
    BuildingLocation, BuildingType, CategoryCount, EducationPivot, KidSplit, SocialGraph,
};
use crate::error::Result;
use crate::table::Table;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;

/// Plotly's qualitative Set1 palette
pub const SET1: [&str; 9] = [
    "rgb(228,26,28)",
    "rgb(55,126,184)",
    "rgb(77,175,74)",
    "rgb(152,78,163)",
    "rgb(255,127,0)",
    "rgb(255,255,51)",
    "rgb(166,86,40)",
    "rgb(247,129,191)",
    "rgb(153,153,153)",
];

/// A chart ready to be embedded in a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Chart {
    Plotly {
        id: String,
        figure: Json,
    },
    Network {
        id: String,
        elements: Vec<Json>,
        stylesheet: Json,
    },
}

impl Chart {
    pub fn id(&self) -> &str {
        match self {
            Chart::Plotly { id, .. } | Chart::Network { id, .. } => id,
        }
    }

    fn plotly(id: &str, data: Json, layout: Json) -> Chart {
        Chart::Plotly {
            id: id.to_string(),
            figure: json!({ "data": data, "layout": layout }),
        }
    }
}

fn outlined(color: &str) -> Json {
    json!({ "color": color, "line": { "color": "black", "width": 2 } })
}

fn axis_title(text: &str) -> Json {
    json!({ "title": { "text": text } })
}

// ============================================================================
// PARTICIPANT PAGE
// ============================================================================

pub fn kid_bar(split: &KidSplit) -> Chart {
    Chart::plotly(
        "kidCounts",
        json!([{
            "type": "bar",
            "x": ["Without Kids", "With Kids"],
            "y": [split.without_kids, split.with_kids],
            "marker": outlined(SET1[1]),
        }]),
        json!({
            "title": { "text": "Participants with/without Kids" },
            "xaxis": axis_title("Presence of Kids"),
            "yaxis": axis_title("Number of Participants"),
        }),
    )
}

pub fn age_histogram(ages: &[f64]) -> Chart {
    Chart::plotly(
        "ageHistogram",
        json!([{
            "type": "histogram",
            "x": ages,
            "nbinsx": 8,
            "marker": outlined(SET1[1]),
        }]),
        json!({
            "title": { "text": "Age Distribution" },
            "xaxis": axis_title("Age"),
            "yaxis": axis_title("Frequency"),
        }),
    )
}

/// Set1 spread evenly over [0, 1] as a continuous colour scale
fn set1_scale() -> Json {
    let last = (SET1.len() - 1) as f64;
    Json::Array(
        SET1.iter()
            .enumerate()
            .map(|(i, color)| json!([i as f64 / last, color]))
            .collect(),
    )
}

pub fn age_income_scatter(age_vs_income: &Table) -> Result<Chart> {
    let ages = age_vs_income.numbers("age")?;
    let amounts = age_vs_income.numbers("amount")?;
    let (x, y): (Vec<f64>, Vec<f64>) = ages
        .into_iter()
        .zip(amounts)
        .filter_map(|pair| match pair {
            (Some(age), Some(amount)) => Some((age, amount)),
            _ => None,
        })
        .unzip();

    Ok(Chart::plotly(
        "scatterAgeIncome",
        json!([{
            "type": "scatter",
            "mode": "markers",
            "x": x,
            "y": y,
            "marker": {
                "color": x,
                "colorscale": set1_scale(),
                "showscale": true,
                "colorbar": { "title": { "text": "Age" } },
            },
        }]),
        json!({
            "title": { "text": "Age vs. Income" },
            "xaxis": axis_title("Age"),
            "yaxis": axis_title("Income"),
        }),
    ))
}

pub fn household_bar(counts: &Table) -> Result<Chart> {
    let sizes = counts.ints("householdSize")?;
    let kids = counts.bools("haveKids")?;
    let totals = counts.ints("count")?;

    let mut traces = Vec::new();
    for (i, has_kids) in [false, true].into_iter().enumerate() {
        let (x, y): (Vec<i64>, Vec<i64>) = sizes
            .iter()
            .zip(kids.iter())
            .zip(totals.iter())
            .filter(|((_, k), _)| **k == Some(has_kids))
            .filter_map(|((s, _), c)| Some(((*s)?, (*c)?)))
            .unzip();
        let name = if has_kids { "True" } else { "False" };
        traces.push(json!({
            "type": "bar",
            "name": name,
            "x": x,
            "y": y,
            "marker": outlined(SET1[i]),
        }));
    }

    Ok(Chart::plotly(
        "householdVsKidSize",
        Json::Array(traces),
        json!({
            "title": { "text": "Household Size vs. Presence of Kids" },
            "barmode": "group",
            "legend": { "title": { "text": "haveKids" } },
            "xaxis": axis_title("Household Size"),
            "yaxis": axis_title("Number of Participants"),
        }),
    ))
}

pub fn education_bar(pivot: &EducationPivot) -> Chart {
    let groups: Vec<&str> = pivot.rows.iter().map(|r| r.age_group.label()).collect();
    let traces: Vec<Json> = pivot
        .levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let y: Vec<u64> = pivot.rows.iter().map(|r| r.counts[i]).collect();
            json!({
                "type": "bar",
                "name": level,
                "x": groups,
                "y": y,
                "marker": outlined(SET1[i % SET1.len()]),
            })
        })
        .collect();

    Chart::plotly(
        "barEducationAge",
        Json::Array(traces),
        json!({
            "title": { "text": "Education Levels within Age Groups" },
            "barmode": "group",
            "xaxis": {
                "title": { "text": "Age Group" },
                "categoryorder": "array",
                "categoryarray": groups,
            },
            "yaxis": axis_title("Number of Participants"),
        }),
    )
}

// ============================================================================
// SOCIAL ACTIVITY PAGE
// ============================================================================

pub fn network_stylesheet() -> Json {
    json!([
        {
            "selector": "node",
            "style": {
                "label": "data(label)",
                "width": 30,
                "height": 30,
                "background-color": "#0074D9",
                "color": "black",
                "text-valign": "center",
                "text-halign": "center",
                "font-size": "10px",
            }
        },
        {
            "selector": "edge",
            "style": {
                "width": 3,
                "line-color": "#87CEEB",
                "target-arrow-color": "#87CEEB",
                "target-arrow-shape": "triangle",
                "curve-style": "bezier",
            }
        }
    ])
}

/// Nodes first, then edges
pub fn network_elements(graph: &SocialGraph) -> Vec<Json> {
    let nodes = graph.nodes.iter().map(|id| {
        json!({ "data": { "id": id.to_string(), "label": format!("Participant {}", id) } })
    });
    let edges = graph.edges.iter().map(|edge| {
        json!({
            "data": {
                "source": edge.from.to_string(),
                "target": edge.to.to_string(),
                "weight": edge.weight,
            }
        })
    });
    nodes.chain(edges).collect()
}

pub fn social_network(graph: &SocialGraph) -> Chart {
    Chart::Network {
        id: "cytoscapeSocialNetwork".to_string(),
        elements: network_elements(graph),
        stylesheet: network_stylesheet(),
    }
}

pub fn interaction_timeline(days: &BTreeMap<NaiveDate, u64>) -> Chart {
    let x: Vec<String> = days.keys().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let y: Vec<u64> = days.values().copied().collect();

    Chart::plotly(
        "interactionTimeline",
        json!([{
            "type": "scatter",
            "mode": "lines",
            "x": x,
            "y": y,
            "line": { "color": "royalblue", "shape": "linear" },
        }]),
        json!({
            "title": { "text": "Timeline of Interactions" },
            "xaxis": axis_title("Date"),
            "yaxis": axis_title("Number of Interactions"),
        }),
    )
}

// ============================================================================
// BUSINESS PAGE
// ============================================================================

pub fn education_pie(counts: &[CategoryCount]) -> Chart {
    let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
    let values: Vec<u64> = counts.iter().map(|c| c.count).collect();

    Chart::plotly(
        "employmentByIndustry",
        json!([{ "type": "pie", "labels": labels, "values": values }]),
        json!({ "title": { "text": "Employment by Education" } }),
    )
}

/// Set1 colour per building type, in order of first appearance
pub fn building_colors(locations: &[BuildingLocation]) -> Vec<(BuildingType, &'static str)> {
    let mut colors: Vec<(BuildingType, &'static str)> = Vec::new();
    for location in locations {
        if !colors.iter().any(|(t, _)| *t == location.building_type) {
            colors.push((location.building_type, SET1[colors.len() % SET1.len()]));
        }
    }
    colors
}

fn range(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    values.fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

pub fn building_map(locations: &[BuildingLocation]) -> Chart {
    let colors = building_colors(locations);
    let color_of = |t: BuildingType| {
        colors
            .iter()
            .find(|(c, _)| *c == t)
            .map_or(SET1[0], |(_, color)| *color)
    };

    let x: Vec<f64> = locations.iter().map(|l| l.x).collect();
    let y: Vec<f64> = locations.iter().map(|l| l.y).collect();
    let marker_colors: Vec<&str> = locations.iter().map(|l| color_of(l.building_type)).collect();
    let text: Vec<&str> = locations.iter().map(|l| l.building_type.label()).collect();

    Chart::plotly(
        "buildingMap",
        json!([{
            "type": "scatter",
            "mode": "markers",
            "x": x,
            "y": y,
            "text": text,
            "marker": {
                "size": 8,
                "color": marker_colors,
                "line": { "width": 1, "color": "black" },
            },
        }]),
        json!({
            "title": { "text": "Business Types in the City" },
            "margin": { "l": 0, "r": 0, "t": 40, "b": 0 },
            "xaxis": { "range": range(x.iter().copied()), "showgrid": false },
            "yaxis": {
                "range": range(y.iter().copied()),
                "showgrid": false,
                "scaleanchor": "x",
                "scaleratio": 1,
            },
        }),
    )
}
