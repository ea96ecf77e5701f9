//! Source-specific metadata extractors

pub mod lookml;
pub mod overlay;

pub use lookml::{LookmlExtractor, LookmlMetadataBuilder, TABLE_PLACEHOLDER};
pub use overlay::DescriptionOverlay;
