//! shelfwise - Metadata fusion and adaptive suggestion CLI
//!
//! Drives the assistant from a shell. Every subcommand prints its result as
//! pretty JSON on stdout; logs go to stderr (or the configured log file).
//!
//! ```bash
//! shelfwise fuse "Authors/J.R.R. Tolkien/Lord of the Rings/01 - Prologue.mp3"
//! shelfwise record --file action.json
//! shelfwise suggest Incoming/book.mp3 --kinds naming,metadata --min-confidence 0.6
//! shelfwise prefs --mode explicit < prefs.json
//! shelfwise insights statistics
//! shelfwise prune
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use shelfwise_common::config::{
    default_config_path, load_toml_config, resolve_state_dir, validate, RootFolderResolver,
    TomlConfig,
};
use shelfwise_engine::preferences::PreferenceUpdate;
use shelfwise_engine::suggestions::SuggestionRequest;
use shelfwise_engine::types::{FileDescriptor, LearningMode, UserAction};
use shelfwise_engine::{Assistant, AssistantConfig};

/// Command-line arguments for shelfwise
#[derive(Parser, Debug)]
#[command(name = "shelfwise")]
#[command(about = "Metadata fusion and adaptive suggestions for media libraries")]
#[command(version)]
struct Args {
    /// Root folder all relative paths are resolved against
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Directory holding learning_data.json and user_preferences.json
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Configuration file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print fused metadata for a path relative to the root
    Fuse {
        path: String,

        /// Treat the path as a directory (path structure only)
        #[arg(long)]
        directory: bool,
    },

    /// Record a user action (JSON) and learn from it
    Record {
        /// Read the action from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Generate suggestions for paths relative to the root
    Suggest {
        #[arg(required = true)]
        paths: Vec<String>,

        /// Comma-separated kinds: naming, organization, metadata, conversion, all
        #[arg(long, value_delimiter = ',', default_value = "all")]
        kinds: Vec<String>,

        /// Drop suggestions below this confidence (config default if omitted)
        #[arg(long)]
        min_confidence: Option<f32>,

        /// Return at most this many suggestions (config default if omitted)
        #[arg(long)]
        max_count: Option<usize>,

        /// Label echoed back in the result
        #[arg(long, default_value = ".")]
        target: String,
    },

    /// Apply an explicit preference update (JSON: category → key → value)
    Prefs {
        /// explicit, adaptive or conservative
        #[arg(long, default_value = "adaptive")]
        mode: String,

        /// Read the update from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show learned insights: patterns, preferences, statistics, suggestions, all
    Insights {
        #[arg(default_value = "all")]
        kind: String,
    },

    /// Drop stale learned patterns
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => load_toml_config(path),
        None => TomlConfig::default(),
    };

    init_tracing(&config, args.log_level.as_deref())?;
    validate(&config).context("Invalid configuration")?;

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root.clone())
        .with_config(&config)
        .resolve();
    let state_dir = resolve_state_dir(args.state_dir.as_deref(), &config, &root_folder);

    info!("Starting shelfwise v{}", env!("CARGO_PKG_VERSION"));
    debug!(config = ?config_path, "Configuration source");

    let mut assistant = Assistant::open(AssistantConfig {
        root_folder,
        state_dir,
        retention: config.retention.clone(),
    })
    .await;

    match args.command {
        Command::Fuse { path, directory } => {
            let estimate = if directory {
                assistant.fuse_directory(&path)
            } else {
                assistant.fuse_file(&path).await
            };
            print_json(&estimate)?;
        }

        Command::Record { file } => {
            let input = read_input(file.as_deref()).await?;
            let action: UserAction =
                serde_json::from_str(&input).context("Failed to parse user action JSON")?;
            let outcome = assistant.record_action(action).await;
            print_json(&outcome)?;
        }

        Command::Suggest {
            paths,
            kinds,
            min_confidence,
            max_count,
            target,
        } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                files.push(describe(&assistant, path).await);
            }

            let request = SuggestionRequest {
                target,
                kinds,
                min_confidence: min_confidence.unwrap_or(config.suggestions.min_confidence),
                max_count: max_count.unwrap_or(config.suggestions.max_count),
            };
            let batch = assistant.generate_suggestions(&request, &files).await?;
            print_json(&batch)?;
        }

        Command::Prefs { mode, file } => {
            let mode: LearningMode = mode.parse()?;
            let input = read_input(file.as_deref()).await?;
            let update: PreferenceUpdate =
                serde_json::from_str(&input).context("Failed to parse preference update JSON")?;
            let written = assistant.update_preferences(&update, mode).await;
            print_json(&written)?;
        }

        Command::Insights { kind } => {
            let insights = assistant.insights(&kind)?;
            print_json(&insights)?;
        }

        Command::Prune => {
            let removed = assistant.prune_patterns().await;
            info!(removed = removed.len(), "Prune complete");
            print_json(&removed)?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--log-level`, which wins over the configured level.
fn init_tracing(config: &TomlConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(config.logging.level.as_str()).to_string();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Describe a path under the root, fusing its metadata
async fn describe(assistant: &Assistant, relative_path: &str) -> FileDescriptor {
    let absolute = assistant.root_folder().join(relative_path);
    let (size, is_directory) = match tokio::fs::metadata(&absolute).await {
        Ok(meta) => (meta.len(), meta.is_dir()),
        Err(e) => {
            debug!(
                path = %absolute.display(),
                error = %e,
                "Path not found on disk, treating as file"
            );
            (0, false)
        }
    };
    assistant
        .describe_file(relative_path, size, is_directory)
        .await
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
