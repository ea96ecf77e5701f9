//! Project configuration for tablemeta
//!
//! Read from `tablemeta.toml` (or an explicit path). Every field is optional;
//! command-line values take precedence over the file.
//!
//! ```toml
//! project_id = "analytics-prod"
//! dataset_name = "sales"
//! lookml_file = "views/orders.view.lkml"
//! cache_dir = ".tablemeta"
//! extra_descriptions = "extra_descriptions.json"
//! ```

use crate::error::{CoreError, Result};
use crate::models::DatasetId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tablemeta.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub project_id: Option<String>,
    pub dataset_name: Option<String>,

    /// LookML source file
    pub lookml_file: Option<PathBuf>,

    /// Explicit cache file path, overrides `cache_dir`
    pub metadata_file: Option<PathBuf>,

    /// Directory holding `{project_id}__{dataset_name}.json`
    pub cache_dir: Option<PathBuf>,

    /// `{table: {column: text}}` JSON merged into built metadata
    pub extra_descriptions: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load from `path`. A missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found (optional)");
                return Ok(Self::default());
            }
            Err(e) => return Err(CoreError::from_read(path, e)),
        };

        toml::from_str(&content).map_err(|e| CoreError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `tablemeta.toml` from `dir`
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Overlay non-empty values from `other` onto `self`
    pub fn merge(mut self, other: ProjectConfig) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            project_id,
            dataset_name,
            lookml_file,
            metadata_file,
            cache_dir,
            extra_descriptions
        );
        self
    }

    /// Dataset identity, if both parts are configured
    pub fn dataset(&self) -> Option<DatasetId> {
        match (&self.project_id, &self.dataset_name) {
            (Some(project), Some(dataset)) => Some(DatasetId::new(project, dataset)),
            _ => None,
        }
    }

    /// Cache file path for `dataset`: `metadata_file`, else `cache_dir/<default name>`,
    /// else `None` to let the client use its default
    pub fn metadata_file_for(&self, dataset: &DatasetId) -> Option<PathBuf> {
        self.metadata_file.clone().or_else(|| {
            self.cache_dir
                .as_ref()
                .map(|dir| dir.join(dataset.cache_file_name()))
        })
    }
}
