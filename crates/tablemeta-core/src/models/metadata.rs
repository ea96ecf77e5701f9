//! Metadata record models
//!
//! The record maps table name to a [`TableMetadata`], which maps column name to a
//! [`ColumnMetadata`]. This is exactly the shape of the JSON cache file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Table name → table descriptor
///
/// Ordered maps keep the written cache file deterministic.
pub type MetadataRecord = BTreeMap<String, TableMetadata>;

/// Cache file identity: one cache file per (project, dataset) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId {
    pub project_id: String,
    pub dataset_name: String,
}

impl DatasetId {
    pub fn new(project_id: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_name: dataset_name.into(),
        }
    }

    /// Default cache file name: `{project_id}__{dataset_name}.json`
    pub fn cache_file_name(&self) -> String {
        format!("{}__{}.json", self.project_id, self.dataset_name)
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_name)
    }
}

/// Descriptor of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Name of the object in the source system (LookML view name)
    #[serde(default)]
    pub source_name: String,

    /// Human-readable label
    #[serde(default)]
    pub source_label: String,

    #[serde(default)]
    pub description: String,

    /// Column name → column descriptor
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnMetadata>,

    /// Keys written by other builders, preserved on round-trip
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TableMetadata {
    /// Number of columns that cannot hold NULL
    pub fn required_column_count(&self) -> usize {
        self.columns.values().filter(|c| !c.is_nullable).count()
    }
}

/// Descriptor of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub field_name: String,

    #[serde(default = "default_field_type")]
    pub field_type: String,

    #[serde(default)]
    pub field_label: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_nullable")]
    pub is_nullable: bool,

    /// Supplementary description merged in by an enhancement step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_description: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ColumnMetadata {
    /// Column with the default type, its name as label, and nullable
    pub fn new(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            field_label: field_name.clone(),
            field_name,
            field_type: default_field_type(),
            description: String::new(),
            is_nullable: true,
            extra_description: None,
            extra: BTreeMap::new(),
        }
    }
}

fn default_field_type() -> String {
    "string".to_string()
}

fn default_nullable() -> bool {
    true
}
