//! Ingestion of raw tabular data.
//!
//! Uploaded text is parsed as JSON first and falls back to a naive CSV reader
//! (first line headers, comma split, no quoting). Both produce the same
//! [`RawRecord`] shape: an ordered map from field name to JSON value.

use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::errors::{ImportExportError, ImportExportResult};

/// An untyped record with arbitrary field names.
pub type RawRecord = IndexMap<String, Value>;

/// The raw tables of one import. `nodes` is empty unless node attributes
/// are tracked in a separate table.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RawDataset {
    #[serde(default)]
    pub nodes: Vec<RawRecord>,
    pub edges: Vec<RawRecord>,
}

impl RawDataset {
    pub fn from_edges(edges: Vec<RawRecord>) -> Self {
        Self {
            nodes: Vec::new(),
            edges,
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<RawRecord>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn stats(&self) -> String {
        format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len())
    }
}

/// Parse uploaded text into a dataset: JSON when it parses, CSV otherwise.
pub fn parse_dataset(text: &str) -> ImportExportResult<RawDataset> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => dataset_from_json(value),
        Err(err) => {
            debug!("Input is not JSON ({}), reading as CSV", err);
            Ok(RawDataset::from_edges(parse_csv(text)?))
        }
    }
}

/// Parse a single table (JSON array or CSV) of records.
pub fn parse_records(text: &str) -> ImportExportResult<Vec<RawRecord>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(records_from_array(items)),
        Ok(other) => Err(ImportExportError::InvalidFormat(format!(
            "expected an array of records, found {}",
            json_kind(&other)
        ))),
        Err(_) => parse_csv(text),
    }
}

pub fn load_dataset(path: &Path) -> ImportExportResult<RawDataset> {
    debug!("Loading dataset from: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_dataset(&text)
}

pub fn load_records(path: &Path) -> ImportExportResult<Vec<RawRecord>> {
    debug!("Loading records from: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_records(&text)
}

fn dataset_from_json(value: Value) -> ImportExportResult<RawDataset> {
    match value {
        Value::Array(items) => Ok(RawDataset::from_edges(records_from_array(items))),
        Value::Object(mut map) => {
            let edges = match map.remove("edges") {
                Some(Value::Array(items)) => records_from_array(items),
                _ => {
                    return Err(ImportExportError::InvalidFormat(
                        "JSON object input must contain an 'edges' array".to_string(),
                    ))
                }
            };
            let nodes = match map.remove("nodes") {
                Some(Value::Array(items)) => records_from_array(items),
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(ImportExportError::InvalidFormat(format!(
                        "'nodes' must be an array, found {}",
                        json_kind(&other)
                    )))
                }
            };
            Ok(RawDataset { nodes, edges })
        }
        other => Err(ImportExportError::InvalidFormat(format!(
            "expected an array of records or a {{nodes, edges}} object, found {}",
            json_kind(&other)
        ))),
    }
}

fn records_from_array(items: Vec<Value>) -> Vec<RawRecord> {
    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        })
        .collect();
    if records.len() < total {
        debug!(
            "Skipped {} non-object entries out of {}",
            total - records.len(),
            total
        );
    }
    records
}

/// Naive CSV: the first line holds the headers, every following line is split
/// on commas. Quoted fields are not interpreted.
pub fn parse_csv(text: &str) -> ImportExportResult<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_end_matches('\r').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportExportError::InvalidFormat(
            "CSV input has no header line".to_string(),
        ));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| {
                (
                    header.clone(),
                    Value::String(cell.trim_end_matches('\r').to_string()),
                )
            })
            .collect();
        records.push(record);
    }

    debug!(
        "Parsed {} CSV records with {} columns",
        records.len(),
        headers.len()
    );
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
