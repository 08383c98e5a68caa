use csv::Writer;

use crate::errors::{ImportExportError, ImportExportResult};
use crate::graph::GraphModel;

pub fn render(graph: &GraphModel) -> ImportExportResult<String> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(["id", "source", "target", "index", "date", "width", "color"])?;

    for edge in &graph.edges {
        wtr.write_record([
            edge.id.clone(),
            edge.source.clone(),
            edge.target.clone(),
            edge.data.index.to_string(),
            edge.data.date.clone().unwrap_or_default(),
            edge.style.width.to_string(),
            edge.style.color.clone(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ImportExportError::ExportFailed(e.to_string()))?;
    String::from_utf8(data).map_err(|e| ImportExportError::ExportFailed(e.to_string()))
}
