//! tablemeta - Build and inspect cached table metadata

mod cli;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tablemeta_core::{LookmlExtractor, MetadataClient, ProjectConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tablemeta",
    version,
    about = "Build and inspect cached table metadata extracted from LookML",
    long_about = "Extracts table and column metadata from a LookML file and caches it as JSON.\n\
                  \n\
                  The cache file defaults to {project_id}__{dataset_name}.json and is built on\n\
                  first use. An existing cache file is always preferred over the LookML source.\n\
                  \n\
                  Examples:\n\
                    tablemeta --project p --dataset d build --lookml orders.view.lkml\n\
                    tablemeta --project p --dataset d show\n\
                    tablemeta --project p --dataset d show --table orders\n\
                    tablemeta --project p --dataset d clear-cache\n\
                  \n\
                  Configuration (lowest priority first):\n\
                    ~/.config/tablemeta/tablemeta.toml\n\
                    ./tablemeta.toml                 # or --config <path>\n\
                    command-line flags / environment\n\
                  \n\
                  Environment Variables:\n\
                    TABLEMETA_PROJECT                # Project id\n\
                    TABLEMETA_DATASET                # Dataset name\n\
                    TABLEMETA_CACHE_DIR              # Directory for cache files\n\
                    TABLEMETA_NO_COLOR               # Disable ANSI colors\n\
                    RUST_LOG                         # Log filter (e.g. tablemeta_core=debug)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Config file (default: ./tablemeta.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project id of the dataset
    #[arg(long, global = true, env = "TABLEMETA_PROJECT")]
    project: Option<String>,

    /// Dataset name
    #[arg(long, global = true, env = "TABLEMETA_DATASET")]
    dataset: Option<String>,

    /// Explicit cache file path (overrides --cache-dir)
    #[arg(long, global = true)]
    metadata_file: Option<PathBuf>,

    /// Directory holding cache files
    #[arg(long, global = true, env = "TABLEMETA_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true, env = "TABLEMETA_NO_COLOR")]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Mode {
    /// Load the cache, building it from LookML if missing
    Build {
        /// LookML source file
        #[arg(long)]
        lookml: Option<PathBuf>,
        /// JSON file of extra column descriptions ({table: {column: text}})
        #[arg(long)]
        extra_descriptions: Option<PathBuf>,
        /// Output the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show cached metadata without building
    Show {
        /// Only show columns of this table
        #[arg(long, short = 't')]
        table: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the cache file
    ClearCache,
    /// Print the resolved cache file path
    Path,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let file_config = cli::load_config(cli.config.as_deref(), &cwd)?;

    let (lookml, extra_descriptions) = match &cli.mode {
        Mode::Build {
            lookml,
            extra_descriptions,
            ..
        } => (lookml.clone(), extra_descriptions.clone()),
        _ => (None, None),
    };

    let config = file_config.merge(ProjectConfig {
        project_id: cli.project,
        dataset_name: cli.dataset,
        lookml_file: lookml,
        metadata_file: cli.metadata_file,
        cache_dir: cli.cache_dir,
        extra_descriptions,
    });
    tracing::debug!(?config, "Resolved configuration");

    let no_color = cli.no_color;

    match cli.mode {
        Mode::Build { json, .. } => run_build(&config, json, no_color),
        Mode::Show { table, json } => run_show(&config, table, json, no_color),
        Mode::ClearCache => run_clear_cache(&config),
        Mode::Path => run_path(&config),
    }
}

fn run_build(config: &ProjectConfig, json: bool, no_color: bool) -> Result<()> {
    let target = cli::resolve_target(config)?;
    let lookml = config
        .lookml_file
        .clone()
        .ok_or(cli::CliError::MissingLookml)?;

    let mut extractor = LookmlExtractor::new(lookml);
    if let Some(extra) = &config.extra_descriptions {
        extractor = extractor.with_extra_descriptions(extra);
    }

    let builder = extractor.into_builder(target.dataset, target.metadata_file);
    let existed = builder.client().cache_exists();
    let record = builder
        .get_metadata()
        .with_context(|| format!("Failed to build metadata for {}", builder.client().dataset()))?;

    if json {
        print_json(record)?;
        return Ok(());
    }

    if existed {
        println!(
            "Loaded {} tables from {}",
            record.len(),
            builder.client().metadata_path().display()
        );
    } else {
        println!(
            "Built {} tables from {} -> {}",
            record.len(),
            builder.extractor().lookml_path().display(),
            builder.client().metadata_path().display()
        );
    }
    println!();
    println!("{}", cli::format_table_summary(record, no_color));
    Ok(())
}

fn run_show(
    config: &ProjectConfig,
    table: Option<String>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let target = cli::resolve_target(config)?;
    let client = MetadataClient::new(target.dataset, target.metadata_file);

    let record = match client.get_metadata() {
        Ok(record) => record,
        Err(e) if e.is_not_found() => {
            println!("No cache at: {}", client.metadata_path().display());
            println!("Run 'tablemeta build --lookml <file>' to create it.");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read metadata cache"),
    };

    if let Some(name) = table {
        let meta = cli::find_table(record, &name)?;
        if json {
            return print_json(meta);
        }
        println!("{} ({})", name, meta.source_label);
        if !meta.description.is_empty() {
            println!("{}", meta.description);
        }
        println!();
        println!("{}", cli::format_column_table(meta, no_color));
        return Ok(());
    }

    if json {
        return print_json(record);
    }

    if let Some(info) = client.cache_info()? {
        let modified = info
            .modified
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Cache: {} ({}, modified {})",
            info.path.display(),
            cli::format_size(info.size_bytes),
            modified
        );
        println!();
    }
    println!("{}", cli::format_table_summary(record, no_color));
    Ok(())
}

fn run_clear_cache(config: &ProjectConfig) -> Result<()> {
    let target = cli::resolve_target(config)?;
    let client = MetadataClient::new(target.dataset, target.metadata_file);

    let Some(info) = client.cache_info()? else {
        println!("Cache not found at: {}", client.metadata_path().display());
        println!("Nothing to clear.");
        return Ok(());
    };

    std::fs::remove_file(&info.path)
        .with_context(|| format!("Failed to delete cache: {}", info.path.display()))?;

    println!(
        "Cleared cache: {} ({})",
        info.path.display(),
        cli::format_size(info.size_bytes)
    );
    Ok(())
}

fn run_path(config: &ProjectConfig) -> Result<()> {
    let target = cli::resolve_target(config)?;
    let client = MetadataClient::new(target.dataset, target.metadata_file);
    println!("{}", client.metadata_path().display());
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize metadata")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablemeta_core::MetadataRecord;

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from([
            "tablemeta",
            "--project",
            "p",
            "--dataset",
            "d",
            "build",
            "--lookml",
            "orders.lkml",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.project.as_deref(), Some("p"));
        match cli.mode {
            Mode::Build { lookml, json, .. } => {
                assert_eq!(lookml, Some(PathBuf::from("orders.lkml")));
                assert!(json);
            }
            _ => panic!("Expected Build"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tablemeta", "show", "-t", "orders", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.mode, Mode::Show { table: Some(ref t), .. } if t == "orders"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["tablemeta"]).is_err());
    }

    #[test]
    fn test_print_json_record() {
        assert!(print_json(&MetadataRecord::new()).is_ok());
    }
}
