//! Record normalization: raw records plus a column mapping become canonical
//! edge and node records.
//!
//! Records missing a source or target value are dropped. Numeric style
//! columns are coerced per record (missing or unparseable values become `0`)
//! and checked once per column: a single non-numeric value anywhere marks the
//! whole column unusable for scaling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data_loader::{RawDataset, RawRecord};
use crate::errors::GraphResult;
use crate::mapping::{Column, ColumnMapping, ResolvedMapping};
use crate::style::number_value;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEdge {
    /// Position of the record in the uploaded edge table.
    pub index: usize,
    pub source: String,
    pub target: String,
    pub edge_width: f64,
    pub edge_color: f64,
    pub tooltip_title: String,
    pub tooltip_description: String,
    /// Raw date value, bucketed later by [`crate::timeline`].
    pub epoch: Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalNode {
    pub index: usize,
    pub id: String,
    pub node_radius: f64,
    pub node_color: String,
    pub tooltip_title: String,
    pub tooltip_description: String,
}

/// Whether every value of a mapped numeric column coerced cleanly.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NumericColumns {
    pub edge_width: bool,
    pub edge_color: bool,
    pub node_radius: bool,
}

impl Default for NumericColumns {
    fn default() -> Self {
        Self {
            edge_width: true,
            edge_color: true,
            node_radius: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeStats {
    pub edges_read: usize,
    pub edges_dropped: usize,
    pub nodes_read: usize,
    pub nodes_dropped: usize,
    pub non_numeric_columns: Vec<String>,
}

/// The immutable canonical dataset of one import.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CanonicalData {
    pub edges: Vec<CanonicalEdge>,
    pub nodes: Vec<CanonicalNode>,
    pub mapping: ResolvedMapping,
    pub numeric: NumericColumns,
    pub stats: NormalizeStats,
}

impl CanonicalData {
    pub fn has_node_table(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// Normalize a raw dataset. Fails only when source or target is not mapped.
pub fn normalize(raw: &RawDataset, mapping: &ColumnMapping) -> GraphResult<CanonicalData> {
    let resolved = mapping.resolve(&raw.nodes, &raw.edges)?;
    let mut stats = NormalizeStats {
        edges_read: raw.edges.len(),
        nodes_read: raw.nodes.len(),
        ..Default::default()
    };

    let edges: Vec<CanonicalEdge> = raw
        .edges
        .iter()
        .enumerate()
        .filter_map(|(index, record)| normalize_edge(index, record, &resolved))
        .collect();
    stats.edges_dropped = raw.edges.len() - edges.len();
    if stats.edges_dropped > 0 {
        debug!(
            "Dropped {} edge records without a source or target value",
            stats.edges_dropped
        );
    }

    let nodes: Vec<CanonicalNode> = match &resolved.node_id {
        Column::Present(id_column) => raw
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, record)| normalize_node(index, record, id_column, &resolved))
            .collect(),
        Column::Absent => {
            if !raw.nodes.is_empty() {
                warn!(
                    "Node table with {} records ignored: node id column is not mapped or not present",
                    raw.nodes.len()
                );
            }
            Vec::new()
        }
    };
    stats.nodes_dropped = raw.nodes.len() - nodes.len();

    let numeric = NumericColumns {
        edge_width: column_is_numeric(&resolved.edge_width, &raw.edges),
        edge_color: column_is_numeric(&resolved.edge_color, &raw.edges),
        node_radius: column_is_numeric(&resolved.node_radius, &raw.nodes),
    };
    for (label, column, ok) in [
        ("edge width", &resolved.edge_width, numeric.edge_width),
        ("edge color", &resolved.edge_color, numeric.edge_color),
        ("node radius", &resolved.node_radius, numeric.node_radius),
    ] {
        if let (Column::Present(name), false) = (column, ok) {
            warn!(
                "Column '{}' mapped to {} contains non-numeric values; using the default style",
                name, label
            );
            stats.non_numeric_columns.push(name.clone());
        }
    }

    info!(
        "Normalized {} of {} edges and {} of {} nodes",
        edges.len(),
        stats.edges_read,
        nodes.len(),
        stats.nodes_read
    );

    Ok(CanonicalData {
        edges,
        nodes,
        mapping: resolved,
        numeric,
        stats,
    })
}

fn normalize_edge(index: usize, record: &RawRecord, mapping: &ResolvedMapping) -> Option<CanonicalEdge> {
    let source = record.get(&mapping.source).and_then(identifier)?;
    let target = record.get(&mapping.target).and_then(identifier)?;

    Some(CanonicalEdge {
        index,
        source,
        target,
        edge_width: numeric_field(record, &mapping.edge_width),
        edge_color: numeric_field(record, &mapping.edge_color),
        tooltip_title: string_field(record, &mapping.edge_tooltip_title),
        tooltip_description: string_field(record, &mapping.edge_tooltip_description),
        epoch: mapping
            .date
            .name()
            .and_then(|name| record.get(name))
            .cloned()
            .unwrap_or(Value::Null),
    })
}

fn normalize_node(
    index: usize,
    record: &RawRecord,
    id_column: &str,
    mapping: &ResolvedMapping,
) -> Option<CanonicalNode> {
    let id = record.get(id_column).and_then(identifier)?;

    Some(CanonicalNode {
        index,
        id,
        node_radius: numeric_field(record, &mapping.node_radius),
        node_color: string_field(record, &mapping.node_color),
        tooltip_title: string_field(record, &mapping.node_tooltip_title),
        tooltip_description: string_field(record, &mapping.node_tooltip_description),
    })
}

/// Identifier of a truthy value, stored as a string. Empty strings, zero,
/// `false` and `null` are not identifiers. Integral floats lose their
/// fraction, so `1.0` and `"1"` name the same entity.
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().map_or(true, |f| f != 0.0) => match n.as_f64() {
            Some(f) if n.is_f64() => Some(number_value(f).to_string()),
            _ => Some(n.to_string()),
        },
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

/// Numeric coercion of a single value. `None` means the value is not numeric.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn numeric_field(record: &RawRecord, column: &Column) -> f64 {
    column
        .name()
        .and_then(|name| record.get(name))
        .and_then(coerce_number)
        .unwrap_or(0.0)
}

fn string_field(record: &RawRecord, column: &Column) -> String {
    match column.name().and_then(|name| record.get(name)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// A present column is numeric when no record carries a non-coercible value.
fn column_is_numeric(column: &Column, records: &[RawRecord]) -> bool {
    match column {
        Column::Present(name) => records
            .iter()
            .filter_map(|record| record.get(name))
            .all(|value| coerce_number(value).is_some()),
        Column::Absent => true,
    }
}
