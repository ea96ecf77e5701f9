//! Caching layer for tablemeta-core
//!
//! JSON cache files read once per client, built on first miss by a builder.

pub mod builder;
pub mod client;

pub use builder::{MetadataBuilder, MetadataExtractor};
pub use client::{read_cache_file, write_cache_file, CacheFileInfo, MetadataClient};
