//! Data models for tablemeta

pub mod lookml;
pub mod metadata;

pub use lookml::{LookmlField, LookmlModel, LookmlView};
pub use metadata::{ColumnMetadata, DatasetId, MetadataRecord, TableMetadata};
