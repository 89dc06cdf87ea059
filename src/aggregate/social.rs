// 🌐 Social network views: weighted edges, top participants, daily activity

use crate::config::GraphSettings;
use crate::error::Result;
use crate::table::Table;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: i64,
    pub to: i64,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SocialGraph {
    /// Participant ids, ascending
    pub nodes: Vec<i64>,
    /// Surviving edges, ascending by (from, to)
    pub edges: Vec<Edge>,
    /// The selected top participants, heaviest first
    pub top_participants: Vec<i64>,
}

/// Count communication events per directed (from, to) pair
pub fn edge_weights(social: &Table) -> Result<Vec<Edge>> {
    let from = social.ints("participantIdFrom")?;
    let to = social.ints("participantIdTo")?;

    let mut weights: BTreeMap<(i64, i64), u64> = BTreeMap::new();
    for pair in from.iter().zip(to.iter()) {
        if let (Some(from), Some(to)) = pair {
            *weights.entry((*from, *to)).or_default() += 1;
        }
    }

    Ok(weights
        .into_iter()
        .map(|((from, to), weight)| Edge { from, to, weight })
        .collect())
}

/// Participants with the largest total outgoing weight.
///
/// Ordered by weight descending, ties by ascending participant id.
pub fn top_participants(edges: &[Edge], n: usize) -> Vec<i64> {
    let mut totals: BTreeMap<i64, u64> = BTreeMap::new();
    for edge in edges {
        *totals.entry(edge.from).or_default() += edge.weight;
    }

    let mut ranked: Vec<(i64, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(id, _)| id).collect()
}

/// Keep edges touching a top participant whose weight exceeds the threshold
pub fn build_graph(edges: Vec<Edge>, settings: GraphSettings) -> SocialGraph {
    let top = top_participants(&edges, settings.top_participants);
    let top_set: HashSet<i64> = top.iter().copied().collect();

    let edges: Vec<Edge> = edges
        .into_iter()
        .filter(|e| top_set.contains(&e.from) || top_set.contains(&e.to))
        .filter(|e| e.weight > settings.min_edge_weight)
        .collect();

    let nodes: BTreeSet<i64> = edges.iter().flat_map(|e| [e.from, e.to]).collect();

    SocialGraph {
        nodes: nodes.into_iter().collect(),
        edges,
        top_participants: top,
    }
}

pub fn social_graph(social: &Table, settings: GraphSettings) -> Result<SocialGraph> {
    Ok(build_graph(edge_weights(social)?, settings))
}

/// Events per UTC calendar date
pub fn interactions_by_day(social: &Table) -> Result<BTreeMap<NaiveDate, u64>> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for timestamp in social.datetimes("timestamp")?.iter().flatten() {
        *days.entry(timestamp.date_naive()).or_default() += 1;
    }
    Ok(days)
}
