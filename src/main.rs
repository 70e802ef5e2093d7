//! ordercache CLI - drives the entity store from the command line

mod commands;

use clap::{Parser, Subcommand};
use ordercache::{EntityKind, View};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ordercache")]
#[command(version)]
#[command(about = "Persistence and reference resolution for customers, orders and keywords")]
#[command(long_about = r#"
ordercache keeps customers, orders and keyword tags in JSON snapshots and
imports customers into SQLite in chunked transactions.

Example usage:
  ordercache init
  ordercache stats
  ordercache resolve --save
  ordercache export --kind orders --view foreign
  ordercache import-customers --chunk-size 5000
"#)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with every default spelled out
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Load everything and show entity counts
    Stats,

    /// Replace the SQLite customer table with the snapshot customers
    ImportCustomers {
        /// Rows per transaction (overrides the config)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Resolve order references and report what was bound
    Resolve {
        /// Only resolve this order
        #[arg(short, long)]
        order: Option<i64>,

        /// Write the snapshots back afterwards
        #[arg(short, long)]
        save: bool,
    },

    /// Print the records of one entity kind as JSON
    Export {
        /// customers, orders, positions or keywords
        #[arg(short, long)]
        kind: EntityKind,

        /// full, foreign or cache
        #[arg(long, default_value = "full")]
        view: View,
    },

    /// List one entity kind as a table
    List {
        /// customers, orders or keywords
        #[arg(short, long)]
        kind: EntityKind,
    },
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON envelope for a finished command
pub fn emit_success(mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config_path = cli.config.clone();

    let result = match cli.command {
        Commands::Init { force } => commands::run_init(mode, config_path.as_deref(), force),
        Commands::Stats => commands::run_stats(mode, config_path.as_deref()),
        Commands::ImportCustomers { chunk_size } => {
            commands::run_import_customers(mode, config_path.as_deref(), chunk_size)
        }
        Commands::Resolve { order, save } => {
            commands::run_resolve(mode, config_path.as_deref(), order, save)
        }
        Commands::Export { kind, view } => {
            commands::run_export(config_path.as_deref(), kind, view)
        }
        Commands::List { kind } => commands::run_list(mode, config_path.as_deref(), kind),
    };

    if let Err(e) = result {
        ordercache::ui::failure(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
