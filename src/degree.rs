use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::normalize::CanonicalEdge;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DegreeEntry {
    pub key: String,
    pub value: usize,
}

/// Incident-edge counts per entity id, regardless of direction.
///
/// Keys keep the order in which ids are first seen: targets first, then
/// sources, matching the grouping order used to build the table.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DegreeTable {
    degrees: IndexMap<String, usize>,
}

impl DegreeTable {
    pub fn get(&self, id: &str) -> Option<usize> {
        self.degrees.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    pub fn total(&self) -> usize {
        self.degrees.values().sum()
    }

    pub fn entries(&self) -> Vec<DegreeEntry> {
        self.degrees
            .iter()
            .map(|(key, value)| DegreeEntry {
                key: key.clone(),
                value: *value,
            })
            .collect()
    }
}

/// Group by target, group by source, then sum both groupings per key.
pub fn compute_degrees(edges: &[CanonicalEdge]) -> DegreeTable {
    let mut by_target: IndexMap<&str, usize> = IndexMap::new();
    let mut by_source: IndexMap<&str, usize> = IndexMap::new();
    for edge in edges {
        *by_target.entry(edge.target.as_str()).or_default() += 1;
        *by_source.entry(edge.source.as_str()).or_default() += 1;
    }

    let mut degrees: IndexMap<String, usize> = IndexMap::with_capacity(by_target.len());
    for (key, count) in by_target.into_iter().chain(by_source) {
        *degrees.entry(key.to_string()).or_default() += count;
    }

    DegreeTable { degrees }
}
