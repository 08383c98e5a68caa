//! Command execution: load files, drive a [`GraphExplorer`] and produce the
//! text a command prints or writes.

use anyhow::{anyhow, bail, Context, Result};
use csv::Writer;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::common;
use crate::data_loader::{self, RawDataset};
use crate::export::{self, ExportFormat};
use crate::filter::{EntitySelector, Filters};
use crate::mapping::ColumnMapping;
use crate::state::GraphExplorer;
use crate::timeline::{self, DateRange};

/// Input files of a run.
#[derive(Debug, Clone)]
pub struct InputFiles {
    pub edges: PathBuf,
    pub nodes: Option<PathBuf>,
    pub mapping: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub input: InputFiles,
    pub filters: Filters,
    pub expand: Vec<String>,
    pub format: ExportFormat,
    pub force: bool,
}

/// Read the edge table (or a combined `{nodes, edges}` JSON document) and
/// the optional separate node table.
pub fn load_input(input: &InputFiles) -> Result<(RawDataset, ColumnMapping)> {
    let mapping = ColumnMapping::load(&input.mapping)
        .with_context(|| format!("Failed to read mapping {}", input.mapping.display()))?;

    let dataset = match &input.nodes {
        Some(nodes) => {
            let edges = data_loader::load_records(&input.edges)
                .with_context(|| format!("Failed to read edges {}", input.edges.display()))?;
            let nodes = data_loader::load_records(nodes)
                .with_context(|| format!("Failed to read nodes {}", nodes.display()))?;
            RawDataset::from_edges(edges).with_nodes(nodes)
        }
        None => data_loader::load_dataset(&input.edges)
            .with_context(|| format!("Failed to read {}", input.edges.display()))?,
    };
    info!("Loaded {}", dataset.stats());
    Ok((dataset, mapping))
}

/// Import into a fresh explorer. A dataset over the soft cap fails unless
/// `force` is set.
pub fn import(input: &InputFiles, force: bool) -> Result<GraphExplorer> {
    let (dataset, mapping) = load_input(input)?;
    let mut explorer = GraphExplorer::new();
    if let Some(warning) = explorer.import(dataset, mapping, force)? {
        bail!("{}. Pass --force to render it anyway", warning.message());
    }
    Ok(explorer)
}

/// Both ends or neither. Values take any format accepted for raw dates.
pub fn parse_date_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>> {
    let parse = |s: &str| {
        timeline::parse_timestamp(&Value::String(s.to_string()))
            .ok_or_else(|| anyhow!("Cannot parse date {:?}", s))
    };
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => Ok(Some(DateRange::new(parse(from)?, parse(to)?)?)),
        _ => bail!("--from and --to must be given together"),
    }
}

pub fn build_filters(entity: Option<&str>, degree: u8, date_range: Option<DateRange>) -> Filters {
    Filters {
        entity: entity.map(EntitySelector::from).unwrap_or_default(),
        date_range,
        degree,
    }
}

pub fn execute_render(options: &RenderOptions) -> Result<String> {
    let mut explorer = import(&options.input, options.force)?;

    if options.filters != Filters::default() {
        explorer.on_form_submit(options.filters.clone())?;
    }
    for id in &options.expand {
        let before = explorer.graph().edges.len();
        explorer.on_node_click(id)?;
        let added = explorer.graph().edges.len() - before;
        if added == 0 {
            match explorer.graph().node(id) {
                Ok(_) => warn!("Expanding {} added no edges", id),
                Err(err) => warn!("Expanding {} added no edges: {}", id, err),
            }
        } else {
            debug!("Expanding {} added {} edges", id, added);
        }
    }

    if let Err(err) = explorer.graph().ensure_integrity() {
        warn!("{}", err);
    }

    info!("Rendering {} as {}", explorer.graph().stats(), options.format);
    Ok(export::render(options.format, explorer.graph(), explorer.legend())?)
}

/// Degree table as `key,value` CSV.
pub fn execute_degrees(input: &InputFiles, force: bool) -> Result<String> {
    let explorer = import(input, force)?;
    let session = explorer
        .state()
        .session
        .as_ref()
        .ok_or_else(|| anyhow!("No dataset was imported"))?;

    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(["key", "value"])?;
    for entry in session.degrees.entries() {
        wtr.write_record([entry.key, entry.value.to_string()])?;
    }
    let data = wtr.into_inner()?;
    Ok(String::from_utf8(data)?)
}

/// Hourly histogram of the edges in `date_range` as `bucket,start,count` CSV.
pub fn execute_timeline(input: &InputFiles, date_range: Option<DateRange>, force: bool) -> Result<String> {
    let mut explorer = import(input, force)?;
    if date_range.is_some() {
        explorer.on_form_submit(build_filters(None, 1, date_range))?;
    }

    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(["bucket", "start", "count"])?;
    for bin in explorer.timeline() {
        wtr.write_record([bin.bucket, bin.start.to_rfc3339(), bin.count.to_string()])?;
    }
    let data = wtr.into_inner()?;
    Ok(String::from_utf8(data)?)
}

/// The explicit `format`, else the one named by the extension of `output`,
/// else JSON.
pub fn resolve_format(format: Option<ExportFormat>, output: Option<&Path>) -> Result<ExportFormat> {
    if let Some(format) = format {
        return Ok(format);
    }
    let extension = output
        .filter(|path| *path != Path::new("-"))
        .and_then(|path| path.extension())
        .and_then(|ext| ext.to_str());
    match extension {
        Some(ext) => Ok(ext.parse::<ExportFormat>()?),
        None => Ok(ExportFormat::default()),
    }
}

/// Write `content` to `output`, or to stdout when there is no output path or
/// it is `-`.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) if path != Path::new("-") => {
            common::write_string_to_file(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        _ => println!("{}", content),
    }
    Ok(())
}
