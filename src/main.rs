use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod aggregate;
mod baseline;
mod config;
mod emotions;
mod error;
mod evaluation;
mod models;
mod output;
mod parser;
mod runner;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Emotion rating evaluation CLI - Score model emotion ratings for video clips against human annotations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain", global = true)]
    output: OutputFormat,

    /// Verbose output - log per-model parsing and matching details
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute per-model error metrics against ground truth, with baselines
    Evaluate(EvaluateArgs),
    /// Export the averaged scores of one model per video
    Scores(ScoresArgs),
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to predictions JSON
    #[arg(long)]
    pred: PathBuf,

    /// Path to ground-truth (test set) JSON
    #[arg(long)]
    gt: PathBuf,

    /// Path to save result JSON
    #[arg(long)]
    out: PathBuf,

    /// Error metric to compute (mse or mae); repeat for several
    #[arg(long)]
    metric: Vec<String>,

    /// Seed for the random baseline
    #[arg(long)]
    seed: Option<u64>,

    /// Leave the baselines out of the report
    #[arg(long)]
    no_baselines: bool,

    /// Optional TOML run file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScoresArgs {
    /// Path to predictions JSON
    #[arg(long)]
    pred: PathBuf,

    /// Model whose predictions are exported
    #[arg(long)]
    model: String,

    /// Path to save the per-video scores JSON
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Evaluate(args) => {
            let config = evaluate_config(&args)?;
            let report = Runner::new(config).run_evaluation(&args.pred, &args.gt, &args.out)?;
            output::print_report(&report, cli.output);
        }
        Command::Scores(args) => {
            let scores = Runner::new(Config::default()).export_scores(&args.pred, &args.model, &args.out)?;
            output::print_scores(&scores, cli.output);
        }
    }

    Ok(())
}

/// Load the run file, if any, and apply command-line overrides
fn evaluate_config(args: &EvaluateArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if !args.metric.is_empty() {
        config.metrics = args.metric.clone();
    }
    if args.seed.is_some() {
        config.baselines.seed = args.seed;
    }
    if args.no_baselines {
        config.baselines.enabled = false;
    }

    Ok(config)
}

/// Log to stderr; RUST_LOG overrides the verbosity flag
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose { "emotion_eval=debug" } else { "emotion_eval=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
