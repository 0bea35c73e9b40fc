use archsort::cli::{MigrateCommand, run_cli};
use archsort::config::MigrationConfig;
use archsort::output::OutputFormatter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archsort")]
#[command(about = "Sort a document archive into a fixed folder taxonomy", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: .archsortrc.toml, then ~/.config/archsort/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the archive folders
    #[arg(long, global = true)]
    archive_root: Option<PathBuf>,

    /// Directory the taxonomy folders live in
    #[arg(long, global = true)]
    destination_root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and migrate archive folders
    Migrate {
        /// Show what would happen without moving files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Export the plan to a CSV file (combine with --dry-run to also print the report)
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Archive folders to process
        #[arg(short = 'm', long, num_args = 1..)]
        folders: Vec<String>,
    },

    /// Undo the most recent migration
    Undo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match MigrationConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let command = match cli.command {
        Commands::Migrate {
            dry_run,
            csv,
            folders,
        } => {
            config.apply_overrides(cli.archive_root, cli.destination_root, folders);
            MigrateCommand::Migrate { dry_run, csv }
        }
        Commands::Undo => {
            config.apply_overrides(cli.archive_root, cli.destination_root, Vec::new());
            MigrateCommand::Undo
        }
    };

    match run_cli(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
