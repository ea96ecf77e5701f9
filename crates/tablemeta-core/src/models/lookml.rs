//! Typed LookML views and fields
//!
//! Deserialized from the parsed tree (see [`crate::parsers::lookml`]). Only the
//! keys needed for metadata extraction are modelled; everything else is ignored.

use serde::Deserialize;

/// A parsed LookML document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookmlModel {
    #[serde(default)]
    pub views: Vec<LookmlView>,
}

/// One `view: name { ... }` block
#[derive(Debug, Clone, Deserialize)]
pub struct LookmlView {
    pub name: String,

    #[serde(default)]
    pub sql_table_name: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub dimensions: Vec<LookmlField>,

    #[serde(default)]
    pub measures: Vec<LookmlField>,
}

impl LookmlView {
    /// Dimensions first, then measures
    pub fn fields(&self) -> impl Iterator<Item = &LookmlField> {
        self.dimensions.iter().chain(self.measures.iter())
    }
}

/// A dimension or measure
#[derive(Debug, Clone, Deserialize)]
pub struct LookmlField {
    pub name: String,

    #[serde(default)]
    pub sql: Option<String>,

    #[serde(default, rename = "type")]
    pub field_type: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub primary_key: Option<String>,
}

impl LookmlField {
    /// `primary_key: yes`, case-insensitive
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("yes"))
    }
}
