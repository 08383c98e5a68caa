use netgraph::execution::{self, InputFiles, RenderOptions};
use netgraph::export::ExportFormat;
use netgraph::filter::Filters;
use serde_json::Value;
use std::fs;
use std::path::Path;

const EDGES: &str = r#"[
    {"src": "web", "dst": "db", "bytes": 40, "at": "2020-03-01T10:05:00Z", "kind": "query"},
    {"src": "web", "dst": "cache", "bytes": 10, "at": "2020-03-01T10:40:00Z", "kind": "lookup"},
    {"src": "cache", "dst": "db", "bytes": 20, "at": "2020-03-01T12:15:00Z", "kind": "refill"},
    {"src": "batch", "dst": "db", "bytes": 90, "at": "2020-03-01T23:00:00Z", "kind": "load"}
]"#;

const NODES: &str = r#"[
    {"name": "web", "tier": "front", "load": 3},
    {"name": "db", "tier": "storage", "load": 9},
    {"name": "cache", "tier": "storage", "load": 2},
    {"name": "batch", "tier": "jobs", "load": 1}
]"#;

const MAPPING: &str = "source: src
target: dst
node_id: name
date: at
edge_width: bytes
edge_color: bytes
node_radius: load
node_color: tier
edge_tooltip_title: kind
";

fn write_inputs(dir: &Path, with_nodes: bool) -> InputFiles {
    fs::write(dir.join("edges.json"), EDGES).unwrap();
    fs::write(dir.join("mapping.yaml"), MAPPING).unwrap();
    let nodes = if with_nodes {
        fs::write(dir.join("nodes.json"), NODES).unwrap();
        Some(dir.join("nodes.json"))
    } else {
        None
    };
    InputFiles {
        edges: dir.join("edges.json"),
        nodes,
        mapping: dir.join("mapping.yaml"),
    }
}

fn options(input: InputFiles, format: ExportFormat) -> RenderOptions {
    RenderOptions {
        input,
        filters: Filters::default(),
        expand: Vec::new(),
        format,
        force: false,
    }
}

#[test]
fn render_json_with_node_table() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), true);

    let out = execution::execute_render(&options(input, ExportFormat::Json)).unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(value["edges"].as_array().unwrap().len(), 4);
    let db = value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "db")
        .unwrap();
    assert_eq!(db["data"]["type"], "storage");
    assert_eq!(db["style"]["size"], 70.0);
    assert_eq!(value["legend"]["nodeColorLabel"], "tier");
    assert_eq!(value["legend"]["nodeColor"][0]["label"], "storage");
    assert_eq!(value["edges"][0]["data"]["content"]["title"], "query");
    assert!(value["edges"][0]["tooltip"]
        .as_str()
        .unwrap()
        .starts_with("<h3>query</h3>"));
    assert!(db["tooltip"].as_str().unwrap().starts_with("<h3>db</h3>"));
}

#[test]
fn render_filtered_and_expanded_to_file() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), false);

    let mut opts = options(input, ExportFormat::Csv);
    opts.filters = execution::build_filters(
        Some("web"),
        1,
        execution::parse_date_range(Some("2020-03-01T10:00:00Z"), Some("2020-03-01T12:00:00Z"))
            .unwrap(),
    );
    opts.expand = vec!["db".to_string()];

    let out = execution::execute_render(&opts).unwrap();
    let output = temp_dir.path().join("graph.csv");
    execution::write_output(Some(&output), &out).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "id,source,target,index,date,width,color");
    assert!(lines[1].starts_with("web-db-0,web,db,0,Mar 01 10am,"));
    assert!(lines[2].starts_with("web-cache-1,web,cache,1,Mar 01 10am,"));
    assert!(lines[3].starts_with("cache-db-2,cache,db,2,Mar 01 12pm,"));
    assert_eq!(lines.len(), 4, "the 11pm load is outside the date range");
}

#[test]
fn render_dot() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), false);

    let out = execution::execute_render(&options(input, ExportFormat::Dot)).unwrap();
    assert!(out.starts_with("digraph G {"));
    assert!(out.contains(r#""batch" -> "db" [ id="batch-db-3""#));
}

#[test]
fn degrees_and_timeline() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), false);

    let degrees = execution::execute_degrees(&input, false).unwrap();
    assert!(degrees.starts_with("key,value\n"));
    assert!(degrees.contains("db,3\n"));
    assert!(degrees.contains("web,2\n"));

    let range =
        execution::parse_date_range(Some("2020-03-01T10:00:00Z"), Some("2020-03-01T12:00:00Z")).unwrap();
    let bins = execution::execute_timeline(&input, range, false).unwrap();
    let counts: Vec<&str> = bins
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(counts, vec!["2", "0", "1"]);
}

#[test]
fn large_input_needs_force() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let records: Vec<String> = (0..301)
        .map(|i| format!(r#"{{"src": "n{}", "dst": "hub"}}"#, i))
        .collect();
    fs::write(temp_dir.path().join("edges.json"), format!("[{}]", records.join(","))).unwrap();
    fs::write(temp_dir.path().join("mapping.yaml"), "source: src\ntarget: dst\n").unwrap();
    let input = InputFiles {
        edges: temp_dir.path().join("edges.json"),
        nodes: None,
        mapping: temp_dir.path().join("mapping.yaml"),
    };

    let err = execution::execute_render(&options(input.clone(), ExportFormat::Json)).unwrap_err();
    assert!(err.to_string().contains("--force"));

    let mut forced = options(input, ExportFormat::Json);
    forced.force = true;
    assert!(execution::execute_render(&forced).is_ok());
}

#[test]
fn missing_source_mapping_fails() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), false);
    fs::write(&input.mapping, "target: dst\n").unwrap();

    let err = execution::execute_render(&options(input, ExportFormat::Json)).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("source"));
}

#[test]
fn expanding_an_unknown_id_leaves_the_graph_alone() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let input = write_inputs(temp_dir.path(), false);

    let plain = execution::execute_render(&options(input.clone(), ExportFormat::Csv)).unwrap();
    let mut opts = options(input, ExportFormat::Csv);
    opts.expand = vec!["mainframe".to_string()];
    let expanded = execution::execute_render(&opts).unwrap();
    assert_eq!(plain, expanded);
}
