use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use aidp_classifier::{HoldoutEvaluation, LogisticConfig};
use aidp_core::{ColumnSchema, ModelKey, PipelineConfig, PredictionEngine, TrainingEngine};
use aidp_io::{FsModelStore, ResultWriter, SubjectReader, read_column_schema};

#[derive(Parser)]
#[command(name = "aidp")]
#[command(about = "Automated imaging differentiation of parkinsonism")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the train/validation split
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input and storage locations shared by both commands.
#[derive(Args, Debug, Clone)]
struct PathArgs {
    /// Path to the subject CSV file
    input: PathBuf,

    /// Root directory of the model store
    #[arg(long, default_value = "resources/models")]
    models_dir: PathBuf,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// One-name-per-line reference column list (built-in list if not set)
    #[arg(long)]
    columns: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Predict probabilities and a diagnosis for every subject
    Predict {
        #[command(flatten)]
        paths: PathArgs,

        /// Model collection to load (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "default")]
        model_key: String,
    },

    /// Train every experiment/grouping model and report performance
    Train {
        #[command(flatten)]
        paths: PathArgs,

        /// Model collection to create (defaults to a timestamp)
        #[arg(long)]
        model_key: Option<String>,

        /// Fraction of each class held out for validation
        #[arg(long, default_value_t = 0.2)]
        validation_fraction: f64,

        /// Report performance without saving models
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Gradient descent epochs
        #[arg(long, default_value_t = 500)]
        epochs: usize,

        /// Gradient descent step size
        #[arg(long, default_value_t = 0.1)]
        learning_rate: f64,

        /// L2 penalty on the weights
        #[arg(long, default_value_t = 1e-3)]
        l2: f64,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct PredictOutput {
    model_key: String,
    input: String,
    output: String,
    n_subjects: usize,
    n_probability_columns: usize,
    diagnoses: BTreeMap<String, usize>,
}

#[derive(Serialize)]
struct TrainOutput {
    model_key: String,
    n_subjects: usize,
    models_saved: bool,
    models_dir: String,
    tracks: Vec<TrackOutput>,
}

#[derive(Serialize)]
struct TrackOutput {
    experiment: String,
    report: String,
    groupings: Vec<GroupingOutput>,
}

#[derive(Serialize)]
struct GroupingOutput {
    grouping: String,
    n_train: usize,
    n_validation: usize,
    validation_auc: f64,
    validation_accuracy: f64,
}

fn load_schema(columns: Option<&Path>) -> Result<ColumnSchema> {
    match columns {
        Some(path) => read_column_schema(path).context("failed to read column list"),
        None => Ok(ColumnSchema::standard()),
    }
}

fn timestamp_key() -> String {
    chrono::Local::now().format("%Y-%m-%d-%H%M%S%6f").to_string()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Predict { paths, model_key } => {
            let model_key = ModelKey::new(model_key)?;
            let schema = load_schema(paths.columns.as_deref())?;

            let input = SubjectReader::new(&paths.input, schema.clone())
                .read()
                .context("failed to read input CSV")?;

            let config = PipelineConfig::default().with_schema(schema);
            let store = FsModelStore::new(&paths.models_dir);
            let outcome = PredictionEngine::new(&config, &store)
                .run(input.table(), &model_key)
                .with_context(|| format!("prediction with model collection \"{model_key}\" failed"))?;

            let writer = ResultWriter::new(&paths.output_dir)?;
            let output_path = writer
                .write_predictions(&paths.input, &input, &outcome)
                .context("failed to write results")?;

            // Build and print stdout summary
            let output = PredictOutput {
                model_key: model_key.to_string(),
                input: paths.input.display().to_string(),
                output: output_path.display().to_string(),
                n_subjects: outcome.results.n_subjects(),
                n_probability_columns: outcome.results.columns().len(),
                diagnoses: outcome
                    .diagnosis_counts()
                    .into_iter()
                    .map(|(d, n)| (d.to_string(), n))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Train {
            paths,
            model_key,
            validation_fraction,
            no_save,
            epochs,
            learning_rate,
            l2,
        } => {
            let model_key = ModelKey::new(model_key.unwrap_or_else(timestamp_key))?;
            let schema = load_schema(paths.columns.as_deref())?;

            let input = SubjectReader::new(&paths.input, schema.clone())
                .with_labels_required(true)
                .read()
                .context("failed to read input CSV")?;

            let classifier = LogisticConfig::new(epochs)?
                .with_learning_rate(learning_rate)
                .with_l2(l2);
            let holdout = HoldoutEvaluation::new(validation_fraction)?.with_seed(cli.seed);
            let config = PipelineConfig::default()
                .with_schema(schema)
                .with_classifier(classifier)
                .with_holdout(holdout);

            let store = FsModelStore::new(&paths.models_dir);
            let mut writer = ResultWriter::new(&paths.output_dir)?;
            let reports = TrainingEngine::new(&config, &store, &mut writer)
                .with_persist(!no_save)
                .run(input.table(), &model_key)
                .with_context(|| format!("training model collection \"{model_key}\" failed"))?;

            if !no_save {
                info!(dir = %store.collection_dir(&model_key).display(), "models saved");
            }

            // Build and print stdout summary
            let output = TrainOutput {
                model_key: model_key.to_string(),
                n_subjects: input.table().n_subjects(),
                models_saved: !no_save,
                models_dir: store.collection_dir(&model_key).display().to_string(),
                tracks: reports
                    .iter()
                    .map(|report| TrackOutput {
                        experiment: report.experiment.to_string(),
                        report: writer
                            .performance_path(&report.model_key, report.experiment)
                            .display()
                            .to_string(),
                        groupings: report
                            .records
                            .iter()
                            .map(|r| GroupingOutput {
                                grouping: r.grouping.to_string(),
                                n_train: r.n_train,
                                n_validation: r.n_validation,
                                validation_auc: r.validation.auc,
                                validation_accuracy: r.validation.accuracy,
                            })
                            .collect(),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
