use serde_json::{json, Value};

use crate::common::{render_edge_tooltip, render_node_tooltip};
use crate::errors::ImportExportResult;
use crate::graph::GraphModel;
use crate::style::LegendDescription;

/// `{nodes, edges, legend}`. Every edge, and every node that came from a node
/// table, carries its tooltip as HTML under `tooltip`.
pub fn render(graph: &GraphModel, legend: Option<&LegendDescription>) -> ImportExportResult<String> {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let mut value = serde_json::to_value(node)?;
            if let Some(html) = render_node_tooltip(node)? {
                value["tooltip"] = Value::String(html);
            }
            Ok(value)
        })
        .collect::<ImportExportResult<Vec<Value>>>()?;

    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let mut value = serde_json::to_value(edge)?;
            value["tooltip"] = Value::String(render_edge_tooltip(edge)?);
            Ok(value)
        })
        .collect::<ImportExportResult<Vec<Value>>>()?;

    let res = json!({
        "nodes": nodes,
        "edges": edges,
        "legend": legend,
    });
    Ok(serde_json::to_string_pretty(&res)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::RawDataset;
    use crate::mapping::ColumnMapping;
    use crate::state::GraphExplorer;

    #[test]
    fn test_empty_graph_renders_empty_arrays() {
        let out = render(&GraphModel::default(), None).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["nodes"], json!([]));
        assert_eq!(value["edges"], json!([]));
        assert_eq!(value["legend"], Value::Null);
    }

    #[test]
    fn test_legend_is_included() {
        let legend = LegendDescription {
            edge_color_label: Some("bytes".to_string()),
            ..Default::default()
        };
        let out = render(&GraphModel::default(), Some(&legend)).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["legend"]["edgeColorLabel"], json!("bytes"));
    }

    #[test]
    fn test_elements_carry_tooltips() {
        let dataset = RawDataset::from_edges(
            serde_json::from_value(json!([{"u": "a", "v": "b", "kind": "login", "w": 4}])).unwrap(),
        )
        .with_nodes(serde_json::from_value(json!([{"id": "a"}, {"id": "b"}])).unwrap());
        let mapping = ColumnMapping {
            edge_tooltip_title: Some("kind".to_string()),
            edge_width: Some("w".to_string()),
            node_id: Some("id".to_string()),
            ..ColumnMapping::new("u", "v")
        };
        let mut explorer = GraphExplorer::new();
        explorer.import(dataset, mapping, false).unwrap();

        let out = render(explorer.graph(), explorer.legend()).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        let edge_tooltip = value["edges"][0]["tooltip"].as_str().unwrap();
        assert!(edge_tooltip.starts_with("<h3>login</h3>"));
        assert!(edge_tooltip.contains("<p>w: 4</p>"));
        let node_tooltip = value["nodes"][0]["tooltip"].as_str().unwrap();
        assert!(node_tooltip.starts_with("<h3>a</h3>"));
        assert!(!node_tooltip.contains("<p>"));
    }

    #[test]
    fn test_synthesized_nodes_have_no_tooltip() {
        let dataset =
            RawDataset::from_edges(serde_json::from_value(json!([{"u": "a", "v": "b"}])).unwrap());
        let mut explorer = GraphExplorer::new();
        explorer.import(dataset, ColumnMapping::new("u", "v"), false).unwrap();

        let out = render(explorer.graph(), explorer.legend()).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert!(value["nodes"][0].get("tooltip").is_none());
        let edge_tooltip = value["edges"][0]["tooltip"].as_str().unwrap();
        assert!(edge_tooltip.starts_with("<h3>0</h3>"));
        assert!(!edge_tooltip.contains("<p>"));
    }
}
