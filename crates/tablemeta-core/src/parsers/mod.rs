//! Parsers for metadata source files

pub mod lookml;

pub use lookml::{LookmlParser, LookmlSyntaxError};
