//! Metadata extraction from a LookML file
//!
//! Each view becomes a table and each dimension or measure becomes a column:
//! - table name: `sql_table_name` (or the view name) without backticks, last
//!   `.` segment
//! - column name: `sql` (or the field name) without the `${TABLE}.` placeholder
//! - a column is nullable unless the field is `primary_key: yes`

use crate::cache::{MetadataBuilder, MetadataExtractor};
use crate::error::{CoreError, Result};
use crate::extractors::overlay::DescriptionOverlay;
use crate::models::{
    ColumnMetadata, DatasetId, LookmlField, LookmlView, MetadataRecord, TableMetadata,
};
use crate::parsers::LookmlParser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Looker's table substitution prefix in field SQL
pub const TABLE_PLACEHOLDER: &str = "${TABLE}.";

/// Builder pairing the cache client with a LookML extractor
pub type LookmlMetadataBuilder = MetadataBuilder<LookmlExtractor>;

/// Extracts metadata from one LookML file
#[derive(Debug, Clone)]
pub struct LookmlExtractor {
    lookml_path: PathBuf,
    extra_descriptions: Option<PathBuf>,
}

impl LookmlExtractor {
    pub fn new(lookml_path: impl Into<PathBuf>) -> Self {
        Self {
            lookml_path: lookml_path.into(),
            extra_descriptions: None,
        }
    }

    /// Merge descriptions from a `{table: {column: text}}` JSON file during enhance
    pub fn with_extra_descriptions(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_descriptions = Some(path.into());
        self
    }

    /// Wrap into a builder caching under `dataset`
    pub fn into_builder(
        self,
        dataset: DatasetId,
        metadata_file: Option<PathBuf>,
    ) -> LookmlMetadataBuilder {
        MetadataBuilder::new(self, dataset, metadata_file)
    }

    pub fn lookml_path(&self) -> &Path {
        &self.lookml_path
    }

    /// Convert parsed views into a metadata record
    pub fn record_from_views(views: &[LookmlView]) -> MetadataRecord {
        let mut record = MetadataRecord::new();

        for view in views {
            let name = table_name(view);
            if record.contains_key(&name) {
                debug!(view = %view.name, table = %name, "Duplicate table name, later view wins");
            }
            record.insert(name, table_metadata(view));
        }

        record
    }
}

impl MetadataExtractor for LookmlExtractor {
    fn source_kind(&self) -> &'static str {
        "lookml"
    }

    fn extract(&self) -> Result<MetadataRecord> {
        if !self.lookml_path.exists() {
            return Err(CoreError::FileNotFound {
                path: self.lookml_path.clone(),
            });
        }

        let model = LookmlParser::load_model(&self.lookml_path)?;
        let record = Self::record_from_views(&model.views);

        info!(
            path = %self.lookml_path.display(),
            views = model.views.len(),
            tables = record.len(),
            "Extracted metadata from LookML"
        );
        Ok(record)
    }

    fn enhance(&self, metadata: &mut MetadataRecord) -> Result<()> {
        let Some(path) = &self.extra_descriptions else {
            return Ok(());
        };

        if let Some(overlay) = DescriptionOverlay::load(path)? {
            let applied = overlay.apply(metadata);
            debug!(path = %path.display(), applied, "Applied extra descriptions");
        }
        Ok(())
    }
}

/// `` `proj.ds.orders` `` → `orders`; falls back to the view name
pub fn table_name(view: &LookmlView) -> String {
    let raw = view.sql_table_name.as_deref().unwrap_or(&view.name);
    let unquoted = raw.replace('`', "");
    unquoted
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// `${TABLE}.total_amount` → `total_amount`; falls back to the field name
pub fn column_name(field: &LookmlField) -> String {
    field
        .sql
        .as_deref()
        .unwrap_or(&field.name)
        .replace(TABLE_PLACEHOLDER, "")
}

fn table_metadata(view: &LookmlView) -> TableMetadata {
    let mut columns = BTreeMap::new();
    for field in view.fields() {
        let column = column_metadata(field);
        columns.insert(column.field_name.clone(), column);
    }

    TableMetadata {
        source_name: view.name.clone(),
        source_label: view.label.clone().unwrap_or_else(|| view.name.clone()),
        description: view.description.clone().unwrap_or_default(),
        columns,
        extra: BTreeMap::new(),
    }
}

fn column_metadata(field: &LookmlField) -> ColumnMetadata {
    let name = column_name(field);
    let mut column = ColumnMetadata::new(name.clone());

    if let Some(field_type) = &field.field_type {
        column.field_type = field_type.clone();
    }
    column.field_label = field.label.clone().unwrap_or(name);
    column.description = field.description.clone().unwrap_or_default();
    column.is_nullable = !field.is_primary_key();
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn view(value: serde_json::Value) -> LookmlView {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_orders_scenario() {
        let orders = view(json!({
            "name": "orders",
            "sql_table_name": "`proj.ds.orders`",
            "dimensions": [{"name": "id", "primary_key": "yes"}],
            "measures": [{"name": "total", "sql": "${TABLE}.total_amount", "type": "sum"}]
        }));

        let record = LookmlExtractor::record_from_views(&[orders]);
        let table = &record["orders"];
        assert_eq!(table.source_name, "orders");
        assert_eq!(table.source_label, "orders");
        assert_eq!(table.description, "");
        assert_eq!(table.columns.len(), 2);

        let id = &table.columns["id"];
        assert!(!id.is_nullable);
        assert_eq!(id.field_type, "string");
        assert_eq!(id.field_label, "id");

        let total = &table.columns["total_amount"];
        assert!(total.is_nullable);
        assert_eq!(total.field_type, "sum");
        assert_eq!(total.field_name, "total_amount");
        assert_eq!(total.field_label, "total_amount");
    }

    #[test]
    fn test_table_name_falls_back_to_view_name() {
        let v = view(json!({"name": "users"}));
        assert_eq!(table_name(&v), "users");

        let v = view(json!({"name": "x", "sql_table_name": "analytics.events"}));
        assert_eq!(table_name(&v), "events");
    }

    #[test]
    fn test_labels_and_descriptions_carried() {
        let v = view(json!({
            "name": "customers",
            "label": "Customers",
            "description": "One row per customer",
            "dimensions": [{
                "name": "email",
                "sql": "${TABLE}.email_address",
                "label": "Email",
                "description": "Contact email",
                "primary_key": "no"
            }]
        }));

        let record = LookmlExtractor::record_from_views(&[v]);
        let table = &record["customers"];
        assert_eq!(table.source_label, "Customers");
        assert_eq!(table.description, "One row per customer");

        let email = &table.columns["email_address"];
        assert_eq!(email.field_label, "Email");
        assert_eq!(email.description, "Contact email");
        assert!(email.is_nullable);
    }

    #[test]
    fn test_into_builder_keeps_source_and_dataset() {
        let builder = LookmlExtractor::new("models/orders.view.lkml")
            .into_builder(DatasetId::new("p", "d"), None);
        assert_eq!(
            builder.extractor().lookml_path(),
            Path::new("models/orders.view.lkml")
        );
        assert_eq!(builder.client().metadata_path(), Path::new("p__d.json"));
    }

    #[test]
    fn test_extract_missing_file_is_not_found() {
        let extractor = LookmlExtractor::new("/nonexistent/model.view.lkml");
        let err = extractor.extract().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_extract_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
view: orders {{
  sql_table_name: `proj.ds.orders` ;;
  dimension: id {{
    primary_key: yes
    sql: ${{TABLE}}.id ;;
  }}
  measure: total {{
    type: sum
    sql: ${{TABLE}}.total_amount ;;
  }}
}}
"#
        )
        .unwrap();

        let record = LookmlExtractor::new(file.path()).extract().unwrap();
        assert_eq!(record.len(), 1);
        assert!(!record["orders"].columns["id"].is_nullable);
        assert_eq!(record["orders"].columns["total_amount"].field_type, "sum");
    }

    #[test]
    fn test_enhance_with_overlay() {
        let dir = tempdir().unwrap();
        let overlay = dir.path().join("extra.json");
        std::fs::write(&overlay, r#"{"orders": {"id": "Surrogate key"}}"#).unwrap();

        let extractor = LookmlExtractor::new("unused.lkml").with_extra_descriptions(&overlay);
        let mut record = LookmlExtractor::record_from_views(&[view(json!({
            "name": "orders",
            "dimensions": [{"name": "id"}]
        }))]);

        extractor.enhance(&mut record).unwrap();
        assert_eq!(
            record["orders"].columns["id"].extra_description.as_deref(),
            Some("Surrogate key")
        );
    }

    #[test]
    fn test_enhance_without_overlay_is_noop() {
        let extractor = LookmlExtractor::new("unused.lkml");
        let mut record = MetadataRecord::new();
        extractor.enhance(&mut record).unwrap();
        assert!(record.is_empty());
    }
}
