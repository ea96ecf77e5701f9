//! Extra column descriptions merged into an extracted record
//!
//! The overlay file is a JSON object `{ table: { column: description } }`. Entries
//! for tables or columns absent from the record are skipped.

use crate::error::{CoreError, Result};
use crate::models::MetadataRecord;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Table → column → supplementary description
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DescriptionOverlay {
    tables: BTreeMap<String, BTreeMap<String, String>>,
}

impl DescriptionOverlay {
    /// Load an overlay file. A missing file is not an error and yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No description overlay (optional)");
                return Ok(None);
            }
            Err(e) => return Err(CoreError::from_read(path, e)),
        };

        let overlay = serde_json::from_str(&content).map_err(|e| CoreError::json_parse(path, e))?;
        Ok(Some(overlay))
    }

    /// Set `extra_description` on matching columns, returning how many were set
    pub fn apply(&self, metadata: &mut MetadataRecord) -> usize {
        let mut applied = 0;

        for (table_name, descriptions) in &self.tables {
            let Some(table) = metadata.get_mut(table_name) else {
                warn!(table = %table_name, "Overlay table not in metadata, skipping");
                continue;
            };

            for (column_name, text) in descriptions {
                match table.columns.get_mut(column_name) {
                    Some(column) => {
                        column.extra_description = Some(text.clone());
                        applied += 1;
                    }
                    None => {
                        debug!(table = %table_name, column = %column_name, "Overlay column not found");
                    }
                }
            }
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnMetadata, TableMetadata};
    use tempfile::tempdir;

    fn record_with_orders() -> MetadataRecord {
        let mut table = TableMetadata::default();
        table.columns.insert("id".into(), ColumnMetadata::new("id"));
        table
            .columns
            .insert("status".into(), ColumnMetadata::new("status"));

        let mut record = MetadataRecord::new();
        record.insert("orders".into(), table);
        record
    }

    #[test]
    fn test_missing_overlay_is_none() {
        let dir = tempdir().unwrap();
        let overlay = DescriptionOverlay::load(&dir.path().join("extra.json")).unwrap();
        assert!(overlay.is_none());
    }

    #[test]
    fn test_apply_matching_entries_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extra.json");
        std::fs::write(
            &path,
            r#"{
                "orders": {"status": "Lifecycle state", "ghost": "not a column"},
                "customers": {"id": "never applied"}
            }"#,
        )
        .unwrap();

        let overlay = DescriptionOverlay::load(&path).unwrap().unwrap();
        let mut record = record_with_orders();
        let applied = overlay.apply(&mut record);

        assert_eq!(applied, 1);
        let columns = &record["orders"].columns;
        assert_eq!(
            columns["status"].extra_description.as_deref(),
            Some("Lifecycle state")
        );
        assert!(columns["id"].extra_description.is_none());
        assert!(!record.contains_key("customers"));
    }

    #[test]
    fn test_malformed_overlay_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extra.json");
        std::fs::write(&path, r#"{"orders": ["not", "a", "map"]}"#).unwrap();

        let err = DescriptionOverlay::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::JsonParse { .. }));
    }
}
