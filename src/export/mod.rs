pub mod to_csv_edges;
pub mod to_dot;
pub mod to_json;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ImportExportError, ImportExportResult};
use crate::graph::GraphModel;
use crate::style::LegendDescription;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Dot,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ImportExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" | "gv" => Ok(ExportFormat::Dot),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ImportExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Render the graph model in `format`. The legend is only part of the JSON
/// export.
pub fn render(
    format: ExportFormat,
    graph: &GraphModel,
    legend: Option<&LegendDescription>,
) -> ImportExportResult<String> {
    match format {
        ExportFormat::Json => to_json::render(graph, legend),
        ExportFormat::Dot => to_dot::render(graph),
        ExportFormat::Csv => to_csv_edges::render(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("DOT".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        let err = "gml".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }
}
