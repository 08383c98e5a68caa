use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::errors::{GraphError, GraphResult};

/// Rendered graph handed to the drawing layer. Every recomputation produces
/// a new value; nothing mutates element styles in place.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphModel {
    pub fn get_node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node(&self, id: &str) -> GraphResult<&GraphNode> {
        self.get_node_by_id(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn get_edge_by_id(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn edge_ids(&self) -> HashSet<&str> {
        self.edges.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn stats(&self) -> String {
        format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len())
    }

    /// Union with `fragment`: elements whose id is already present are kept
    /// as they are, new ones are appended in fragment order.
    pub fn merge(&self, fragment: &GraphModel) -> GraphModel {
        let node_ids = self.node_ids();
        let edge_ids = self.edge_ids();

        let new_nodes: Vec<GraphNode> = fragment
            .nodes
            .iter()
            .filter(|n| !node_ids.contains(n.id.as_str()))
            .cloned()
            .collect();
        let new_edges: Vec<GraphEdge> = fragment
            .edges
            .iter()
            .filter(|e| !edge_ids.contains(e.id.as_str()))
            .cloned()
            .collect();

        debug!(
            "Merging fragment: {} new nodes, {} new edges",
            new_nodes.len(),
            new_edges.len()
        );

        let mut merged = self.clone();
        merged.nodes.extend(new_nodes);
        merged.edges.extend(new_edges);
        merged
    }

    pub fn verify_graph_integrity(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                errors.push(format!("Node id:[{}] is not unique", node.id));
            }
        }

        let mut edge_ids = HashSet::new();
        let mut all_edges_have_nodes = true;
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                errors.push(format!("Edge id:[{}] is not unique", edge.id));
            }
            if !node_ids.contains(edge.source.as_str()) {
                all_edges_have_nodes = false;
                errors.push(format!(
                    "Edge id:[{}] source {:?} not found in nodes",
                    edge.id, edge.source
                ));
            }
            if !node_ids.contains(edge.target.as_str()) {
                all_edges_have_nodes = false;
                errors.push(format!(
                    "Edge id:[{}] target {:?} not found in nodes",
                    edge.id, edge.target
                ));
            }
        }

        if all_edges_have_nodes {
            debug!("All edges have valid source and target nodes");
        } else {
            warn!("Some edges have missing source and/or target nodes");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn ensure_integrity(&self) -> GraphResult<()> {
        self.verify_graph_integrity()
            .map_err(|errors| GraphError::InvalidStructure(errors.join("; ")))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub data: NodeData,
    pub style: NodeStyle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeData {
    /// `parent`/`child` by degree, or the raw category when nodes are
    /// colored by a mapped column.
    #[serde(rename = "type")]
    pub node_type: String,
    pub degree: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<NodeTooltip>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeTooltip {
    pub title: String,
    pub description: TooltipField,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeStyle {
    pub size: f64,
    pub color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphEdge {
    /// `<source>-<target>-<index>`, unique even for parallel edges.
    pub id: String,
    pub source: String,
    pub target: String,
    pub data: EdgeData,
    pub style: EdgeStyle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeData {
    pub index: usize,
    /// Hour bucket of the edge date, `None` when the edge has no usable date.
    pub date: Option<String>,
    pub content: EdgeContent,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeContent {
    pub title: String,
    pub description: TooltipField,
    pub edge_color: TooltipField,
    pub edge_width: TooltipField,
}

/// A tooltip value with the name of the column it came from. `label` is
/// `None` when no column is mapped, and the field is then not displayed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TooltipField {
    pub label: Option<String>,
    pub value: serde_json::Value,
}

impl TooltipField {
    pub fn is_displayed(&self) -> bool {
        self.label.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeStyle {
    pub width: f64,
    pub color: String,
}
