mod commands;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "waterline",
    version,
    about = "Ingest legacy water-quality reports into a queryable record store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDF/DOCX report files (or directories of them)
    Ingest {
        /// Report files or directories to scan for .pdf/.docx files
        inputs: Vec<PathBuf>,

        /// SQLite database file
        #[arg(long, default_value = "waterline.db")]
        db: PathBuf,

        /// Custom vocabulary JSON file (default: built-in "standard")
        #[arg(long, value_name = "FILE")]
        vocab: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Query stored measurements
    Query {
        /// SQLite database file
        #[arg(long, default_value = "waterline.db")]
        db: PathBuf,

        /// Filter by site identifier (e.g. "Giant City SP/Cold Dist")
        #[arg(long)]
        site: Option<String>,

        /// Filter by canonical parameter code (e.g. "conductivity")
        #[arg(short, long)]
        parameter: Option<String>,

        /// Earliest report date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest report date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect quarantined records
    Quarantine {
        /// SQLite database file
        #[arg(long, default_value = "waterline.db")]
        db: PathBuf,

        /// Filter by failure kind (unknown_parameter, incompatible_unit,
        /// invalid_value, conflicting_measurement)
        #[arg(short, long)]
        kind: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Manage and inspect parameter vocabularies
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
}

#[derive(Subcommand)]
enum VocabAction {
    /// List built-in vocabularies
    List,
    /// Show a vocabulary's parameters, units and ranges
    Show {
        /// Preset name (e.g. "standard")
        preset: String,
    },
    /// Validate a custom vocabulary file
    Validate {
        /// Path to JSON vocabulary file
        file: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("waterline=info,waterline_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest {
            inputs,
            db,
            vocab,
            output,
        } => commands::ingest::run(inputs, &db, vocab, &output),
        Commands::Query {
            db,
            site,
            parameter,
            from,
            to,
            output,
        } => commands::query::run(&db, site, parameter, from, to, &output),
        Commands::Quarantine { db, kind, output } => {
            commands::quarantine::run(&db, kind, &output)
        }
        Commands::Vocab { action } => match action {
            VocabAction::List => commands::vocab::list(),
            VocabAction::Show { preset } => commands::vocab::show(&preset),
            VocabAction::Validate { file } => commands::vocab::validate(&file),
        },
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
