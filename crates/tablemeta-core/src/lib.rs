//! tablemeta-core - Core library for tablemeta
//!
//! Provides the metadata cache client, the build-on-miss builder, and the LookML
//! extractor that populates it.

pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod models;
pub mod parsers;

pub use cache::{MetadataBuilder, MetadataClient, MetadataExtractor};
pub use config::ProjectConfig;
pub use error::CoreError;
pub use extractors::{LookmlExtractor, LookmlMetadataBuilder};
pub use models::{ColumnMetadata, DatasetId, MetadataRecord, TableMetadata};
