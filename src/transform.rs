//! Canonical records to rendered graph model.

use indexmap::IndexSet;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, warn};

use crate::degree::DegreeTable;
use crate::errors::{GraphError, GraphResult};
use crate::graph::{
    EdgeContent, EdgeData, EdgeStyle, GraphEdge, GraphModel, GraphNode, NodeData, NodeStyle,
    NodeTooltip, TooltipField,
};
use crate::mapping::{Column, ResolvedMapping};
use crate::normalize::{CanonicalEdge, CanonicalNode};
use crate::style::{number_value, StyleAccessors, DEFAULT_NODE_RADIUS};
use crate::timeline;

pub const PARENT: &str = "parent";
pub const CHILD: &str = "child";

/// `child` for leaf entities (exactly one incident edge), `parent` otherwise.
pub fn node_type(degree: usize) -> &'static str {
    if degree == 1 {
        CHILD
    } else {
        PARENT
    }
}

/// Composite edge id; the row index keeps parallel edges apart.
pub fn edge_id(edge: &CanonicalEdge) -> String {
    format!("{}-{}-{}", edge.source, edge.target, edge.index)
}

/// Build the rendered model for `edges`.
///
/// With a node table, its records are kept only when they are an endpoint of
/// one of `edges`; without one, a node is synthesized per distinct endpoint.
/// `degrees` and `accessors` are expected to come from the full dataset so
/// styling does not shift when `edges` is a filtered subset.
pub fn transform(
    edges: &[CanonicalEdge],
    nodes: &[CanonicalNode],
    degrees: &DegreeTable,
    accessors: &StyleAccessors,
    mapping: &ResolvedMapping,
) -> GraphResult<GraphModel> {
    let endpoints: IndexSet<&str> = edges
        .iter()
        .map(|e| e.source.as_str())
        .chain(edges.iter().map(|e| e.target.as_str()))
        .collect();

    let rendered_nodes = if nodes.is_empty() {
        endpoints
            .iter()
            .map(|id| synthesized_node(id, degrees, accessors))
            .collect::<GraphResult<Vec<_>>>()?
    } else {
        let mut seen = HashSet::new();
        let rendered = nodes
            .iter()
            .filter(|n| endpoints.contains(n.id.as_str()))
            .filter(|n| seen.insert(n.id.as_str()))
            .map(|n| table_node(n, degrees, accessors, mapping))
            .collect::<GraphResult<Vec<_>>>()?;

        let missing = endpoints.iter().filter(|id| !seen.contains(*id)).count();
        if missing > 0 {
            warn!(
                "{} edge endpoints have no record in the node table and are not rendered as nodes",
                missing
            );
        }
        rendered
    };

    let rendered_edges: Vec<GraphEdge> = edges
        .iter()
        .map(|e| render_edge(e, accessors, mapping))
        .collect();

    debug!(
        "Transformed {} edges into {} nodes and {} edges",
        edges.len(),
        rendered_nodes.len(),
        rendered_edges.len()
    );

    Ok(GraphModel {
        nodes: rendered_nodes,
        edges: rendered_edges,
    })
}

fn lookup_degree(id: &str, degrees: &DegreeTable) -> GraphResult<usize> {
    degrees.get(id).ok_or_else(|| {
        error!("Node {} has no degree entry", id);
        GraphError::ConsistencyFault(format!(
            "node {:?} is not an endpoint of any edge in the degree table",
            id
        ))
    })
}

fn synthesized_node(
    id: &str,
    degrees: &DegreeTable,
    accessors: &StyleAccessors,
) -> GraphResult<GraphNode> {
    let degree = lookup_degree(id, degrees)?;
    let kind = node_type(degree);

    Ok(GraphNode {
        id: id.to_string(),
        label: id.to_string(),
        data: NodeData {
            node_type: kind.to_string(),
            degree,
            tooltip: None,
        },
        style: NodeStyle {
            size: DEFAULT_NODE_RADIUS,
            color: accessors.node_color.map_category(kind),
        },
    })
}

fn table_node(
    node: &CanonicalNode,
    degrees: &DegreeTable,
    accessors: &StyleAccessors,
    mapping: &ResolvedMapping,
) -> GraphResult<GraphNode> {
    let degree = lookup_degree(&node.id, degrees)?;
    let kind = match mapping.node_color {
        Column::Present(_) => node.node_color.clone(),
        Column::Absent => node_type(degree).to_string(),
    };

    let title = match mapping.node_tooltip_title {
        Column::Present(_) => node.tooltip_title.clone(),
        Column::Absent => node.id.clone(),
    };

    Ok(GraphNode {
        id: node.id.clone(),
        label: node.id.clone(),
        data: NodeData {
            degree,
            tooltip: Some(NodeTooltip {
                title,
                description: field(
                    &mapping.node_tooltip_description,
                    Value::String(node.tooltip_description.clone()),
                ),
            }),
            node_type: kind.clone(),
        },
        style: NodeStyle {
            size: accessors.node_radius.apply(node.node_radius),
            color: accessors.node_color.map_category(&kind),
        },
    })
}

fn render_edge(
    edge: &CanonicalEdge,
    accessors: &StyleAccessors,
    mapping: &ResolvedMapping,
) -> GraphEdge {
    let title = match mapping.edge_tooltip_title {
        Column::Present(_) => edge.tooltip_title.clone(),
        Column::Absent => edge.index.to_string(),
    };

    GraphEdge {
        id: edge_id(edge),
        source: edge.source.clone(),
        target: edge.target.clone(),
        data: EdgeData {
            index: edge.index,
            date: timeline::bucket_of(&edge.epoch),
            content: EdgeContent {
                title,
                description: field(
                    &mapping.edge_tooltip_description,
                    Value::String(edge.tooltip_description.clone()),
                ),
                edge_color: field(&mapping.edge_color, number_value(edge.edge_color)),
                edge_width: field(&mapping.edge_width, number_value(edge.edge_width)),
            },
        },
        style: EdgeStyle {
            width: accessors.edge_width.apply(edge.edge_width),
            color: accessors.edge_color.map_number(edge.edge_color),
        },
    }
}

fn field(column: &Column, value: Value) -> TooltipField {
    TooltipField {
        label: column.name().map(str::to_string),
        value,
    }
}
