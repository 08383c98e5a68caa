use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::data_loader::RawRecord;
use crate::errors::{GraphError, GraphResult, ImportExportResult};

/// ## Structure
/// The column mapping ties arbitrary field names in the uploaded tables to
/// graph semantics. It is usually kept in a YAML file next to the data.
///
/// ```text
/// ColumnMapping
///   ├── source / target             (required, edge table)
///   ├── node_id                     (node table)
///   ├── date                        (edge table)
///   ├── edge_width / edge_color     (edge table, numeric)
///   ├── node_radius                 (node table, numeric)
///   ├── node_color                  (node table, categorical)
///   └── edge_tooltip_* / node_tooltip_*
/// ```
///
/// Every optional field is resolved against the data into a [`Column`]:
/// a mapping that names a field no record carries is `Column::Absent`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_radius: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_tooltip_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_tooltip_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_tooltip_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_tooltip_description: Option<String>,
}

impl ColumnMapping {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> ImportExportResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> ImportExportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> ImportExportResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Source and target are the only required fields.
    pub fn validate(&self) -> GraphResult<()> {
        if self.source.trim().is_empty() {
            return Err(GraphError::Configuration(
                "the source column must be mapped".to_string(),
            ));
        }
        if self.target.trim().is_empty() {
            return Err(GraphError::Configuration(
                "the target column must be mapped".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve every optional column against the raw tables. Edge columns are
    /// checked on the edge table, node columns on the node table.
    pub fn resolve(&self, nodes: &[RawRecord], edges: &[RawRecord]) -> GraphResult<ResolvedMapping> {
        self.validate()?;

        let resolved = ResolvedMapping {
            source: self.source.trim().to_string(),
            target: self.target.trim().to_string(),
            node_id: Column::detect(self.node_id.as_deref(), nodes),
            date: Column::detect(self.date.as_deref(), edges),
            edge_width: Column::detect(self.edge_width.as_deref(), edges),
            edge_color: Column::detect(self.edge_color.as_deref(), edges),
            node_radius: Column::detect(self.node_radius.as_deref(), nodes),
            node_color: Column::detect(self.node_color.as_deref(), nodes),
            edge_tooltip_title: Column::detect(self.edge_tooltip_title.as_deref(), edges),
            edge_tooltip_description: Column::detect(
                self.edge_tooltip_description.as_deref(),
                edges,
            ),
            node_tooltip_title: Column::detect(self.node_tooltip_title.as_deref(), nodes),
            node_tooltip_description: Column::detect(
                self.node_tooltip_description.as_deref(),
                nodes,
            ),
        };

        debug!("Resolved column mapping: {:?}", resolved);
        Ok(resolved)
    }
}

/// A mapped column, present only when at least one record carries the field.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "state", content = "column", rename_all = "camelCase")]
pub enum Column {
    #[default]
    Absent,
    Present(String),
}

impl Column {
    pub fn detect(name: Option<&str>, records: &[RawRecord]) -> Self {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() && records.iter().any(|r| r.contains_key(name)) => {
                Column::Present(name.to_string())
            }
            _ => Column::Absent,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Column::Present(name) => Some(name),
            Column::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Column::Present(_))
    }
}

/// Column mapping after checking it against the data.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResolvedMapping {
    pub source: String,
    pub target: String,
    pub node_id: Column,
    pub date: Column,
    pub edge_width: Column,
    pub edge_color: Column,
    pub node_radius: Column,
    pub node_color: Column,
    pub edge_tooltip_title: Column,
    pub edge_tooltip_description: Column,
    pub node_tooltip_title: Column,
    pub node_tooltip_description: Column,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_requires_source_and_target() {
        assert!(ColumnMapping::new("u", "v").validate().is_ok());

        let err = ColumnMapping::new("", "v").validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");

        let err = ColumnMapping::new("u", "  ").validate().unwrap_err();
        assert!(matches!(err, GraphError::Configuration(_)));
    }

    #[test]
    fn test_resolve_detects_present_columns() {
        let edges = vec![
            record(json!({"u": "1", "v": "2"})),
            record(json!({"u": "2", "v": "3", "w": 4})),
        ];
        let mapping = ColumnMapping {
            edge_width: Some("w".to_string()),
            edge_color: Some("missing".to_string()),
            ..ColumnMapping::new("u", "v")
        };

        let resolved = mapping.resolve(&[], &edges).unwrap();
        assert_eq!(resolved.edge_width, Column::Present("w".to_string()));
        assert_eq!(resolved.edge_color, Column::Absent);
        assert_eq!(resolved.date, Column::Absent);
    }

    #[test]
    fn test_node_columns_resolve_against_node_table() {
        let nodes = vec![record(json!({"id": "1", "group": "a"}))];
        let edges = vec![record(json!({"u": "1", "v": "2", "group": "x"}))];
        let mapping = ColumnMapping {
            node_id: Some("id".to_string()),
            node_color: Some("group".to_string()),
            ..ColumnMapping::new("u", "v")
        };

        let resolved = mapping.resolve(&nodes, &edges).unwrap();
        assert!(resolved.node_color.is_present());

        let resolved = mapping.resolve(&[], &edges).unwrap();
        assert!(!resolved.node_color.is_present());
        assert!(!resolved.node_id.is_present());
    }

    #[test]
    fn test_mapping_deserialization() {
        let yaml_str = r#"
source: u
target: v
date: t
edge_width: w
"#;

        let mapping = ColumnMapping::from_yaml(yaml_str).unwrap();
        assert_eq!(mapping.source, "u");
        assert_eq!(mapping.date.as_deref(), Some("t"));
        assert!(mapping.node_color.is_none());
    }

    #[test]
    fn test_mapping_serialization_skips_unset_columns() {
        let yaml_str = ColumnMapping::new("from", "to").to_yaml().unwrap();
        assert!(yaml_str.contains("source: from"));
        assert!(!yaml_str.contains("edge_width"));
    }
}
