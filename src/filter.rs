//! Filter engine: entity anchored k-hop traversal and bucketed date ranges.
//!
//! Date containment is a discrete test on hour labels. An edge is inside a
//! range when its label is one of the labels enumerated from the range start,
//! hour by hour, up to the range end.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::errors::{GraphError, GraphResult};
use crate::normalize::CanonicalEdge;
use crate::timeline::{self, DateRange};

pub const MIN_DEGREE: u8 = 1;
pub const MAX_DEGREE: u8 = 3;
pub const ALL_ENTITIES: &str = "All";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum EntitySelector {
    #[default]
    All,
    Entity(String),
}

impl EntitySelector {
    pub fn entity(&self) -> Option<&str> {
        match self {
            EntitySelector::All => None,
            EntitySelector::Entity(id) => Some(id),
        }
    }
}

impl From<String> for EntitySelector {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL_ENTITIES {
            EntitySelector::All
        } else {
            EntitySelector::Entity(value)
        }
    }
}

impl From<&str> for EntitySelector {
    fn from(value: &str) -> Self {
        EntitySelector::from(value.to_string())
    }
}

impl From<EntitySelector> for String {
    fn from(value: EntitySelector) -> Self {
        value.to_string()
    }
}

impl fmt::Display for EntitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitySelector::All => write!(f, "{}", ALL_ENTITIES),
            EntitySelector::Entity(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub entity: EntitySelector,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default = "default_degree")]
    pub degree: u8,
}

fn default_degree() -> u8 {
    MIN_DEGREE
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            entity: EntitySelector::All,
            date_range: None,
            degree: MIN_DEGREE,
        }
    }
}

impl Filters {
    pub fn validate(&self) -> GraphResult<()> {
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&self.degree) {
            return Err(GraphError::Validation(format!(
                "degree must be between {} and {}, got {}",
                MIN_DEGREE, MAX_DEGREE, self.degree
            )));
        }
        Ok(())
    }

    /// True when the filters select the full edge set.
    pub fn is_identity(&self) -> bool {
        self.entity == EntitySelector::All && self.date_range.is_none()
    }
}

/// Edges whose hour bucket is one of the buckets spanned by `range`. Without
/// a range every edge is kept.
pub fn filter_by_date_range(edges: &[CanonicalEdge], range: Option<&DateRange>) -> Vec<CanonicalEdge> {
    let Some(range) = range else {
        return edges.to_vec();
    };

    let buckets = range.buckets();
    edges
        .iter()
        .filter(|edge| {
            timeline::bucket_of(&edge.epoch).is_some_and(|bucket| buckets.contains(&bucket))
        })
        .cloned()
        .collect()
}

/// Edges within `hops` hops of `seeds`.
///
/// Each pass keeps the (date filtered) edges touching the current id set and
/// then grows the id set with their endpoints. The edges kept by the last
/// pass are returned, so one hop yields exactly the edges incident to a seed.
pub fn k_hop_neighborhood<S: AsRef<str>>(
    edges: &[CanonicalEdge],
    seeds: &[S],
    date_range: Option<&DateRange>,
    hops: u8,
) -> Vec<CanonicalEdge> {
    let pool = filter_by_date_range(edges, date_range);
    let mut ids: IndexSet<String> = seeds.iter().map(|s| s.as_ref().to_string()).collect();
    let mut result = Vec::new();

    for hop in 1..=hops {
        result = pool
            .iter()
            .filter(|e| ids.contains(&e.source) || ids.contains(&e.target))
            .cloned()
            .collect::<Vec<_>>();
        for edge in &result {
            ids.insert(edge.source.clone());
            ids.insert(edge.target.clone());
        }
        debug!("Hop {}: {} edges, {} ids reached", hop, result.len(), ids.len());
    }

    result
}

/// Apply the form filters to the canonical edge set.
pub fn filter_by_entity_and_date(edges: &[CanonicalEdge], filters: &Filters) -> GraphResult<Vec<CanonicalEdge>> {
    filters.validate()?;

    let filtered = match &filters.entity {
        EntitySelector::Entity(id) => {
            k_hop_neighborhood(edges, &[id], filters.date_range.as_ref(), filters.degree)
        }
        EntitySelector::All => filter_by_date_range(edges, filters.date_range.as_ref()),
    };

    debug!(
        "Filters entity={} degree={} kept {} of {} edges",
        filters.entity,
        filters.degree,
        filtered.len(),
        edges.len()
    );
    Ok(filtered)
}

/// Edges incident to `id` inside the active date range, used to expand a
/// clicked node.
pub fn incident_edges(edges: &[CanonicalEdge], id: &str, date_range: Option<&DateRange>) -> Vec<CanonicalEdge> {
    k_hop_neighborhood(edges, &[id], date_range, 1)
}
