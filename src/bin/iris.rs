//! Iris classifier binary.
//!
//! Loads the dataset, fits normalization, trains the network, then classifies
//! tuples typed on stdin and retrains on user corrections.
//! Diagnostics go to stderr through `tracing`; the dialogue uses stdout.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use iris_feedback::checkpoint::{load_checkpoint, save_checkpoint};
use iris_feedback::data::{load_dataset, Dataset, DatasetOptions, LabelEncoder, NormalizationParams};
use iris_feedback::{train, Classifier, Config, MetricsWriter, Network, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "iris",
    about = "Train an Iris classifier, then classify and learn from corrections interactively"
)]
struct Args {
    /// Dataset file: four numbers and a label per line
    #[arg(long, default_value = "./iris.data")]
    data: PathBuf,

    /// Number of training epochs
    #[arg(long, default_value_t = 5000)]
    epochs: usize,

    /// Hidden layer size
    #[arg(long, default_value_t = 4)]
    hidden: usize,

    /// Weight learning rate (eta)
    #[arg(long, default_value_t = 0.15)]
    learning_rate: f64,

    /// Momentum applied to the previous weight update (alpha)
    #[arg(long, default_value_t = 0.5)]
    momentum: f64,

    /// Number of samples the running error average is smoothed over
    #[arg(long, default_value_t = 150.0)]
    error_smoothing: f64,

    /// Reject unparsable numbers, malformed rows, and unknown labels in the dataset
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Keep the last line of the dataset file instead of dropping it
    #[arg(long, default_value_t = false)]
    keep_last: bool,

    /// Seed for the initial weights
    #[arg(long)]
    seed: Option<u64>,

    /// Log training progress every N epochs (0 = never)
    #[arg(long, default_value_t = 500)]
    log_every: usize,

    /// Write per-epoch metrics to this JSONL file
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Save the trained network and normalization to this checkpoint
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a checkpoint instead of loading and training
    #[arg(long, conflicts_with = "save")]
    resume: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            topology: vec![
                iris_feedback::data::FEATURES,
                self.hidden,
                iris_feedback::data::CLASSES,
            ],
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            error_smoothing: self.error_smoothing,
            dataset: DatasetOptions {
                strict: self.strict,
                drop_last: !self.keep_last,
            },
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("iris_feedback=info,iris=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    println!("Welcome to the Iris neural network classifier");
    let encoder = LabelEncoder::iris();

    let (mut network, params) = match &args.resume {
        Some(path) => {
            let (data, network) = load_checkpoint(path)
                .with_context(|| format!("cannot resume from {}", path.display()))?;
            println!(
                "Resumed network trained for {} epochs, error rate {:.2}%",
                data.epochs_trained,
                network.recent_average_error() * 100.0
            );
            (network, data.normalization)
        }
        None => train_from_file(args, &encoder)?,
    };

    let stdin = io::stdin();
    let summary = Session::new(
        &mut network,
        &params,
        &encoder,
        stdin.lock(),
        io::stdout().lock(),
    )
    .run()
    .context("interactive session failed")?;

    tracing::info!(
        classified = summary.classified,
        corrected = summary.corrected,
        "goodbye"
    );
    Ok(())
}

fn train_from_file(args: &Args, encoder: &LabelEncoder) -> Result<(Network, NormalizationParams)> {
    let config = args.config();

    tracing::info!("loading training samples");
    let raw = load_dataset(&args.data, encoder, config.dataset)
        .with_context(|| format!("cannot load dataset {}", args.data.display()))?;
    let dataset = Dataset::from_raw(&raw).context("cannot normalize dataset")?;
    println!("Extracted {} samples", dataset.len());

    let mut network = config
        .build_network(args.seed)
        .context("invalid network configuration")?;
    tracing::info!(?network, epochs = config.epochs, "training");

    let mut metrics = match &args.metrics_file {
        Some(path) => Some(
            MetricsWriter::create(path)
                .with_context(|| format!("cannot create metrics file {}", path.display()))?,
        ),
        None => None,
    };

    let report = train(&mut network, &dataset, config.epochs, |m| {
        if args.log_every > 0 && m.epoch % args.log_every == 0 {
            tracing::info!(
                epoch = m.epoch,
                error = m.recent_average_error,
                skipped = m.skipped,
                "epoch complete"
            );
        }
        if let Some(w) = metrics.as_mut() {
            if let Err(e) = w.write_epoch(m) {
                tracing::warn!("failed to write epoch metrics: {e}");
            }
        }
    })
    .context("training failed")?;

    if let Some(w) = metrics.as_mut() {
        w.write_report(&report).context("failed to write training report")?;
    }

    println!("Training complete");
    println!(
        "Average error rate for the network: {:.2} %",
        report.recent_average_error * 100.0
    );

    if let Some(path) = &args.save {
        save_checkpoint(&network, &dataset.params, report.epochs, path)
            .with_context(|| format!("cannot save checkpoint {}", path.display()))?;
    }

    Ok((network, dataset.params))
}
