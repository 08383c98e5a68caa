use serde::Serialize;
use serde_json::json;

use crate::errors::ImportExportResult;
use crate::graph::GraphModel;

/// Graphviz `width` is in inches; node sizes are radii in pixels at 72 dpi.
const POINTS_PER_INCH: f64 = 72.0;

#[derive(Serialize)]
struct DotNode<'a> {
    id: &'a str,
    label: &'a str,
    #[serde(rename = "type")]
    node_type: &'a str,
    color: &'a str,
    size: String,
}

#[derive(Serialize)]
struct DotEdge<'a> {
    id: &'a str,
    source: &'a str,
    target: &'a str,
    color: &'a str,
    width: String,
    date: Option<&'a str>,
}

pub fn render(graph: &GraphModel) -> ImportExportResult<String> {
    let mut handlebars = crate::common::get_handlebars();
    handlebars.register_escape_fn(escape_dot);

    let nodes: Vec<DotNode> = graph
        .nodes
        .iter()
        .map(|n| DotNode {
            id: &n.id,
            label: &n.label,
            node_type: &n.data.node_type,
            color: &n.style.color,
            size: format!("{:.2}", 2.0 * n.style.size / POINTS_PER_INCH),
        })
        .collect();
    let edges: Vec<DotEdge> = graph
        .edges
        .iter()
        .map(|e| DotEdge {
            id: &e.id,
            source: &e.source,
            target: &e.target,
            color: &e.style.color,
            width: format!("{:.2}", e.style.width),
            date: e.data.date.as_deref(),
        })
        .collect();

    let res = handlebars.render_template(
        &get_template(),
        &json!({
            "nodes": nodes,
            "edges": edges,
        }),
    )?;
    Ok(res)
}

pub fn get_template() -> String {
    include_str!("to_dot.hbs").to_string()
}

fn escape_dot(data: &str) -> String {
    data.replace('\\', "\\\\").replace('"', "\\\"")
}
