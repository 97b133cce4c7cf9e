//! Label Finder CLI - herbarium sheet label finding
//!
//! Builds expedition images and YOLO datasets, reconciles volunteer boxes,
//! and turns model results into label crops.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use label_finder_cli::commands::build_expedition::BuildExpeditionCommand;
use label_finder_cli::commands::inference_data::InferenceDataCommand;
use label_finder_cli::commands::reconcile::ReconcileCommand;
use label_finder_cli::commands::results_to_labels::ResultsToLabelsCommand;
use label_finder_cli::commands::training_data::TrainingDataCommand;
use label_finder_cli::commands::typewritten::TypewrittenCommand;
use label_finder_cli::commands::RunContext;
use label_finder_cli::config::{config_path, load_config};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "label-finder",
    version,
    about = "Find labels on herbarium sheets with YOLO",
    after_help = "EXAMPLES:\n  \
                  # Shrink sheets for a volunteer expedition\n  \
                  label-finder build-expedition --sheet-dir sheets --expedition-dir expedition --reduce-by 4\n\n  \
                  # Reconcile the volunteer boxes back to full size\n  \
                  label-finder reconcile --unreconciled raw.csv --reconciled labels.csv --expand-by 4\n\n  \
                  # Build a YOLO dataset and cut labels from model output\n  \
                  label-finder training-data --label-csv labels.csv --yolo-images yolo/images --yolo-labels yolo/labels\n  \
                  label-finder results-to-labels --yolo-labels runs/labels --sheet-dir sheets --label-dir crops\n  \
                  label-finder typewritten --label-dir crops --typewritten-dir crops/typewritten"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and hide progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// TOML config file (default: ./label-finder.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile volunteer boxes into one box per label
    Reconcile(ReconcileCommand),

    /// Shrink sheet images for a volunteer expedition
    BuildExpedition(BuildExpeditionCommand),

    /// Build YOLO training images and label files
    TrainingData(TrainingDataCommand),

    /// Resize sheet images for YOLO inference
    InferenceData(InferenceDataCommand),

    /// Cut labels out of sheets using YOLO result files
    ResultsToLabels(ResultsToLabelsCommand),

    /// Move typewritten label crops into their own directory
    Typewritten(TypewrittenCommand),
}

fn main() -> Result<()> {
    // LABEL_FINDER_THREADS caps the worker pool used for per-sheet work
    if let Ok(threads_str) = std::env::var("LABEL_FINDER_THREADS") {
        if let Ok(num_threads) = threads_str.parse::<usize>() {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok();
        }
    }

    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::WARN
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // RUST_LOG wins over the flags when set
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let path = config_path(cli.config.as_deref());
    let config = load_config(&path)?;
    debug!("Config from {}: {:?}", path.display(), config);

    let ctx = RunContext {
        config,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Reconcile(cmd) => cmd.execute(&ctx),
        Commands::BuildExpedition(cmd) => cmd.execute(&ctx),
        Commands::TrainingData(cmd) => cmd.execute(&ctx),
        Commands::InferenceData(cmd) => cmd.execute(&ctx),
        Commands::ResultsToLabels(cmd) => cmd.execute(&ctx),
        Commands::Typewritten(cmd) => cmd.execute(&ctx),
    }
}
