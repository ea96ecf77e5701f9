//! CLI helpers: option resolution and output formatting

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use std::path::{Path, PathBuf};
use tablemeta_core::config::CONFIG_FILE_NAME;
use tablemeta_core::{DatasetId, MetadataRecord, ProjectConfig, TableMetadata};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    MissingDataset,
    MissingLookml,
    UnknownTable { name: String, available: String },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::MissingDataset => write!(
                f,
                "No dataset configured: pass --project and --dataset or set them in {}",
                CONFIG_FILE_NAME
            ),
            CliError::MissingLookml => write!(
                f,
                "No LookML file configured: pass --lookml or set lookml_file in {}",
                CONFIG_FILE_NAME
            ),
            CliError::UnknownTable { name, available } => {
                write!(f, "Table '{}' not in metadata. Available: {}", name, available)
            }
        }
    }
}

impl std::error::Error for CliError {}

// ============================================================================
// Option Resolution
// ============================================================================

/// Config file chain, lowest priority first: user config dir, then working dir
/// (or the explicit `--config` path instead of both)
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ProjectConfig> {
    if let Some(path) = explicit {
        return Ok(ProjectConfig::load(path)?);
    }

    let global = match dirs::config_dir() {
        Some(dir) => ProjectConfig::load(&dir.join("tablemeta").join(CONFIG_FILE_NAME))?,
        None => ProjectConfig::default(),
    };
    let local = ProjectConfig::load_from_dir(cwd)?;

    Ok(global.merge(local))
}

/// Dataset identity and cache path after merging config and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub dataset: DatasetId,
    pub metadata_file: Option<PathBuf>,
}

pub fn resolve_target(config: &ProjectConfig) -> Result<Target, CliError> {
    let dataset = config.dataset().ok_or(CliError::MissingDataset)?;
    let metadata_file = config.metadata_file_for(&dataset);
    Ok(Target {
        dataset,
        metadata_file,
    })
}

// ============================================================================
// Formatters
// ============================================================================

fn header(titles: &[&str], no_color: bool) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| {
            let cell = Cell::new(t);
            if no_color {
                cell
            } else {
                cell.fg(Color::Cyan)
            }
        })
        .collect()
}

/// One row per table
pub fn format_table_summary(record: &MetadataRecord, no_color: bool) -> String {
    if record.is_empty() {
        return "No tables in metadata.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(
        &["Table", "Source", "Label", "Columns", "Required", "Description"],
        no_color,
    ));

    for (name, meta) in record {
        table.add_row(Row::from(vec![
            name.clone(),
            meta.source_name.clone(),
            meta.source_label.clone(),
            meta.columns.len().to_string(),
            meta.required_column_count().to_string(),
            truncate(&meta.description, 40),
        ]));
    }

    table.to_string()
}

/// One row per column of `meta`
pub fn format_column_table(meta: &TableMetadata, no_color: bool) -> String {
    if meta.columns.is_empty() {
        return "No columns.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(
        &["Column", "Type", "Label", "Nullable", "Description"],
        no_color,
    ));

    for column in meta.columns.values() {
        let description = match &column.extra_description {
            Some(extra) if column.description.is_empty() => extra.clone(),
            Some(extra) => format!("{} ({})", column.description, extra),
            None => column.description.clone(),
        };
        table.add_row(Row::from(vec![
            column.field_name.clone(),
            column.field_type.clone(),
            column.field_label.clone(),
            if column.is_nullable { "yes" } else { "no" }.to_string(),
            truncate(&description, 60),
        ]));
    }

    table.to_string()
}

/// Look up a table by name, listing the alternatives on failure
pub fn find_table<'a>(record: &'a MetadataRecord, name: &str) -> Result<&'a TableMetadata, CliError> {
    record.get(name).ok_or_else(|| CliError::UnknownTable {
        name: name.to_string(),
        available: record.keys().cloned().collect::<Vec<_>>().join(", "),
    })
}

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
