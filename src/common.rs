use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::ImportExportResult;
use crate::graph::{GraphEdge, GraphNode};

pub fn write_string_to_file(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(exists: |v: Value| !v.is_null());
    handlebars.register_helper("exists", Box::new(exists));

    handlebars_helper!(isnull: |v: Value| v.is_null());
    handlebars.register_helper("isnull", Box::new(isnull));

    handlebars_helper!(stringeq: |s1: String, s2: String| s1.eq(&s2));
    handlebars.register_helper("stringeq", Box::new(stringeq));

    handlebars
}

/// Tooltip HTML for a rendered edge. Fields without a mapped column are left
/// out.
pub fn render_edge_tooltip(edge: &GraphEdge) -> ImportExportResult<String> {
    let handlebars = get_handlebars();
    Ok(handlebars.render_template(
        include_str!("templates/edge_tooltip.hbs"),
        &edge.data.content,
    )?)
}

/// Tooltip HTML for a node that came from a node table; `None` for
/// synthesized nodes.
pub fn render_node_tooltip(node: &GraphNode) -> ImportExportResult<Option<String>> {
    let Some(tooltip) = &node.data.tooltip else {
        return Ok(None);
    };
    let handlebars = get_handlebars();
    Ok(Some(handlebars.render_template(
        include_str!("templates/node_tooltip.hbs"),
        tooltip,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeContent, EdgeData, EdgeStyle, NodeData, NodeStyle, NodeTooltip, TooltipField};
    use serde_json::json;

    fn field(label: Option<&str>, value: Value) -> TooltipField {
        TooltipField {
            label: label.map(str::to_string),
            value,
        }
    }

    fn edge(content: EdgeContent) -> GraphEdge {
        GraphEdge {
            id: "a-b-0".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            data: EdgeData {
                index: 0,
                date: None,
                content,
            },
            style: EdgeStyle {
                width: 1.0,
                color: "dimgray".to_string(),
            },
        }
    }

    #[test]
    fn handlebars_can_iterate() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                r#"{{#each names as |name|}}
Hello {{name}}
{{/each}}"#,
                &json!({"names": ["foo", "bar", "baz"]}),
            )
            .expect("This to render");
        assert_eq!(res, "Hello foo\nHello bar\nHello baz\n");
    }

    #[test]
    fn handlebars_helper_stringeq_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                r#"{{#if (stringeq "parent" node.type) }}
  {{node.id}};
{{/if}}"#,
                &json!({
                    "node": {
                        "id": "n1",
                        "type": "parent",
                    }
                }),
            )
            .expect("This to render");
        assert_eq!(res, "  n1;\n");
    }

    #[test]
    fn handlebars_helper_isnull_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                r#"{{#if (isnull edge.date) }}
  undated
{{/if}}"#,
                &json!({"edge": {"date": null}}),
            )
            .expect("This to render");
        assert_eq!(res, "  undated\n");
    }

    #[test]
    fn edge_tooltip_shows_mapped_fields_only() {
        let tooltip = render_edge_tooltip(&edge(EdgeContent {
            title: "Login".to_string(),
            description: field(None, json!("ignored")),
            edge_color: field(None, json!(0)),
            edge_width: field(Some("bytes"), json!(5)),
        }))
        .expect("This to render");

        assert!(tooltip.starts_with("<h3>Login</h3>"));
        assert!(tooltip.contains("<p>bytes: 5</p>"));
        assert!(!tooltip.contains("ignored"));
        assert!(!tooltip.contains(": 0"));
    }

    #[test]
    fn edge_tooltip_escapes_html() {
        let tooltip = render_edge_tooltip(&edge(EdgeContent {
            title: "<b>x</b>".to_string(),
            description: field(Some("note"), json!("a & b")),
            edge_color: field(None, json!(0)),
            edge_width: field(None, json!(0)),
        }))
        .expect("This to render");

        assert!(tooltip.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(tooltip.contains("<p>a &amp; b</p>"));
    }

    #[test]
    fn node_tooltip_only_for_table_nodes() {
        let mut node = GraphNode {
            id: "a".to_string(),
            label: "a".to_string(),
            data: NodeData {
                node_type: "child".to_string(),
                degree: 1,
                tooltip: None,
            },
            style: NodeStyle {
                size: 2.0,
                color: "#C900C8".to_string(),
            },
        };
        assert_eq!(render_node_tooltip(&node).unwrap(), None);

        node.data.tooltip = Some(NodeTooltip {
            title: "Server A".to_string(),
            description: field(Some("role"), json!("database")),
        });
        let html = render_node_tooltip(&node).unwrap().expect("a tooltip");
        assert!(html.contains("<h3>Server A</h3>"));
        assert!(html.contains("<p>database</p>"));
    }
}
