//! ASL Alphabet Recognition CLI
//!
//! Entry point for training, evaluating, and running predictions with the
//! ASL alphabet classifiers.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use asl_alphabet::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use asl_alphabet::dataset::augment::{AugmentConfig, Augmenter};
use asl_alphabet::dataset::batcher::AslItem;
use asl_alphabet::dataset::AslDataset;
use asl_alphabet::inference::{evaluate, predict_directory};
use asl_alphabet::model::cnn::{SignConvNet, SignConvNetConfig};
use asl_alphabet::model::dense::{SignDenseNet, SignDenseNetConfig};
use asl_alphabet::model::{Classifier, ModelKind};
use asl_alphabet::training::{
    fit, TrainingConfig, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
};
use asl_alphabet::utils::charts::generate_architecture_diagram;
use asl_alphabet::utils::logging::{init_logging, LogConfig};
use asl_alphabet::{CATEGORIES, IMAGE_SIZE};

use burn::module::{AutodiffModule, Module};
use burn::record::CompactRecorder;

/// ASL Alphabet Recognition
///
/// Trains a convolutional or fully-connected classifier over per-letter
/// image folders and evaluates it with a classification report, confusion
/// matrix, and an annotated test-prediction grid.
#[derive(Parser, Debug)]
#[command(name = "asl_alphabet")]
#[command(version)]
#[command(about = "ASL alphabet recognition with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI spelling of the two pipelines
#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModelArg {
    /// Convolutional network over RGB images
    Cnn,
    /// Fully-connected network over grayscale images
    Dense,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Cnn => ModelKind::Convolutional,
            ModelArg::Dense => ModelKind::Dense,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a model on a per-category image directory
    Train {
        /// Path to the training directory (one subdirectory per category)
        #[arg(short, long, default_value = "data/asl_alphabet_train")]
        data_dir: String,

        /// Which architecture to train
        #[arg(short, long, value_enum, default_value = "cnn")]
        model: ModelArg,

        /// Number of training epochs
        #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Learning rate for the Adam optimizer
        #[arg(short, long, default_value_t = DEFAULT_LEARNING_RATE)]
        learning_rate: f64,

        /// Output directory for the checkpoint and artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: String,

        /// Random seed for shuffling and augmentation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Disable data augmentation on the convolutional path
        #[arg(long, default_value = "false")]
        no_augmentation: bool,

        /// Optional flat test directory to evaluate after training
        #[arg(long)]
        test_dir: Option<String>,
    },

    /// Evaluate a trained checkpoint with a classification report and
    /// confusion matrix
    Evaluate {
        /// Path to the training directory
        #[arg(short, long, default_value = "data/asl_alphabet_train")]
        data_dir: String,

        /// Which architecture the checkpoint belongs to
        #[arg(short, long, value_enum, default_value = "cnn")]
        model: ModelArg,

        /// Path to the checkpoint file (without extension)
        #[arg(short, long)]
        checkpoint: String,

        /// Output directory for artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: String,

        /// Row-normalize the confusion matrix
        #[arg(long, default_value = "false")]
        normalize: bool,

        /// Seed used at training time (reproduces the same shuffle)
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Predict a flat directory of test images and render the grid
    Predict {
        /// Path to the flat test directory
        #[arg(short, long, default_value = "data/asl_alphabet_test")]
        input: String,

        /// Which architecture the checkpoint belongs to
        #[arg(short, long, value_enum, default_value = "cnn")]
        model: ModelArg,

        /// Path to the checkpoint file (without extension)
        #[arg(short, long)]
        checkpoint: String,

        /// Output directory for the prediction grid
        #[arg(short, long, default_value = "output")]
        output_dir: String,
    },

    /// Show dataset statistics
    Stats {
        /// Path to the training directory
        #[arg(short, long, default_value = "data/asl_alphabet_train")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            model,
            epochs,
            batch_size,
            learning_rate,
            output_dir,
            seed,
            no_augmentation,
            test_dir,
        } => cmd_train(
            &data_dir,
            model.into(),
            epochs,
            batch_size,
            learning_rate,
            &output_dir,
            seed,
            no_augmentation,
            test_dir.as_deref(),
        ),

        Commands::Evaluate {
            data_dir,
            model,
            checkpoint,
            output_dir,
            normalize,
            seed,
        } => cmd_evaluate(
            &data_dir,
            model.into(),
            &checkpoint,
            &output_dir,
            normalize,
            seed,
        ),

        Commands::Predict {
            input,
            model,
            checkpoint,
            output_dir,
        } => cmd_predict(&input, model.into(), &checkpoint, &output_dir),

        Commands::Stats { data_dir } => cmd_stats(&data_dir),
    }
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ASL Alphabet Recognition
 Sign language classification with Burn + Rust
"#
        .green()
    );
    println!("  Backend: {}\n", backend_name());
}

/// Scan, shuffle and decode the training corpus for the given pipeline
fn load_training_items(data_dir: &str, kind: ModelKind, seed: u64) -> Result<Vec<AslItem>> {
    println!("{}", "Loading dataset...".cyan());
    let mut dataset = AslDataset::scan(data_dir, None)?;

    let stats = dataset.stats();
    stats.print();

    if dataset.is_empty() {
        anyhow::bail!(
            "no images found under {data_dir}; expected one subdirectory per category (A..Z, del, space, nothing)"
        );
    }

    dataset.shuffle(seed);

    let (items, skipped) = dataset.load_items(kind.color_mode());
    if !skipped.is_empty() {
        println!(
            "{} {} files failed to decode and were skipped",
            "Warning:".yellow(),
            skipped.len()
        );
    }
    if items.is_empty() {
        anyhow::bail!("every file in {data_dir} failed to decode");
    }

    Ok(items)
}

#[allow(clippy::too_many_arguments)]
fn cmd_train(
    data_dir: &str,
    kind: ModelKind,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    output_dir: &str,
    seed: u64,
    no_augmentation: bool,
    test_dir: Option<&str>,
) -> Result<()> {
    info!("Training a {} model on {}", kind, data_dir);

    let items = load_training_items(data_dir, kind, seed)?;

    let mut config = TrainingConfig::new(output_dir);
    config.epochs = epochs;
    config.batch_size = batch_size;
    config.learning_rate = learning_rate;
    config.seed = seed;

    let augmenter = (kind.augments() && !no_augmentation)
        .then(|| Augmenter::new(AugmentConfig::default(), IMAGE_SIZE));

    println!("{}", "Creating model...".cyan());
    let device = default_device();

    match kind {
        ModelKind::Convolutional => {
            let model =
                SignConvNet::<TrainingBackend>::new(&SignConvNetConfig::new(), &device);
            let eval_model =
                SignConvNet::<DefaultBackend>::new(&SignConvNetConfig::new(), &device);
            train_pipeline(
                model, eval_model, kind, items, augmenter, &config, test_dir,
            )
        }
        ModelKind::Dense => {
            let model =
                SignDenseNet::<TrainingBackend>::new(&SignDenseNetConfig::new(), &device);
            let eval_model =
                SignDenseNet::<DefaultBackend>::new(&SignDenseNetConfig::new(), &device);
            train_pipeline(
                model, eval_model, kind, items, augmenter, &config, test_dir,
            )
        }
    }
}

/// Fit a model, then re-load the best checkpoint and run the evaluation and
/// test-prediction steps against it
fn train_pipeline<M, E>(
    model: M,
    eval_model: E,
    kind: ModelKind,
    items: Vec<AslItem>,
    augmenter: Option<Augmenter>,
    config: &TrainingConfig,
    test_dir: Option<&str>,
) -> Result<()>
where
    M: Classifier<TrainingBackend> + AutodiffModule<TrainingBackend>,
    M::InnerModule: Classifier<DefaultBackend>,
    E: Classifier<DefaultBackend>,
{
    let device = default_device();

    std::fs::create_dir_all(&config.output_dir)?;
    generate_architecture_diagram(
        &format!("{kind} architecture"),
        &model.describe(),
        &config.output_dir.join("architecture.svg"),
    )?;

    println!("{}", "Starting training...".green().bold());
    let (_, history) = fit(
        model,
        &items,
        kind.color_mode(),
        augmenter.as_ref(),
        config,
        &device,
    )?;

    let best_val_acc = history
        .val_accuracy
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    println!("{}", "Training complete!".green().bold());
    println!("  Best validation accuracy: {:.2}%", 100.0 * best_val_acc);
    println!("  Checkpoint: {:?}", config.checkpoint_path());
    println!();

    // Evaluation and test predictions run on the best checkpoint, not the
    // final epoch's weights
    println!("{}", "Reloading best checkpoint...".cyan());
    let recorder = CompactRecorder::new();
    let best = eval_model
        .load_file(config.checkpoint_path(), &recorder, &device)
        .map_err(|e| anyhow::anyhow!("failed to load checkpoint: {e:?}"))?;

    let report = evaluate(
        &best,
        &items,
        kind.color_mode(),
        IMAGE_SIZE,
        &CATEGORIES,
        config.batch_size,
        false,
        &config.output_dir,
        &device,
    )?;
    println!("{}", report.report_text);

    if let Some(test_dir) = test_dir {
        run_test_predictions(
            &best,
            Path::new(test_dir),
            kind,
            config.batch_size,
            &config.output_dir,
        )?;
    }

    Ok(())
}

fn cmd_evaluate(
    data_dir: &str,
    kind: ModelKind,
    checkpoint: &str,
    output_dir: &str,
    normalize: bool,
    seed: u64,
) -> Result<()> {
    let items = load_training_items(data_dir, kind, seed)?;
    let device = default_device();
    let output_dir = PathBuf::from(output_dir);

    match kind {
        ModelKind::Convolutional => {
            let model = load_checkpoint(
                SignConvNet::<DefaultBackend>::new(&SignConvNetConfig::new(), &device),
                checkpoint,
            )?;
            let report = evaluate(
                &model,
                &items,
                kind.color_mode(),
                IMAGE_SIZE,
                &CATEGORIES,
                DEFAULT_BATCH_SIZE,
                normalize,
                &output_dir,
                &device,
            )?;
            println!("{}", report.report_text);
        }
        ModelKind::Dense => {
            let model = load_checkpoint(
                SignDenseNet::<DefaultBackend>::new(&SignDenseNetConfig::new(), &device),
                checkpoint,
            )?;
            let report = evaluate(
                &model,
                &items,
                kind.color_mode(),
                IMAGE_SIZE,
                &CATEGORIES,
                DEFAULT_BATCH_SIZE,
                normalize,
                &output_dir,
                &device,
            )?;
            println!("{}", report.report_text);
        }
    }

    Ok(())
}

fn cmd_predict(input: &str, kind: ModelKind, checkpoint: &str, output_dir: &str) -> Result<()> {
    let device = default_device();
    let output_dir = PathBuf::from(output_dir);

    match kind {
        ModelKind::Convolutional => {
            let model = load_checkpoint(
                SignConvNet::<DefaultBackend>::new(&SignConvNetConfig::new(), &device),
                checkpoint,
            )?;
            run_test_predictions(&model, Path::new(input), kind, DEFAULT_BATCH_SIZE, &output_dir)
        }
        ModelKind::Dense => {
            let model = load_checkpoint(
                SignDenseNet::<DefaultBackend>::new(&SignDenseNetConfig::new(), &device),
                checkpoint,
            )?;
            run_test_predictions(&model, Path::new(input), kind, DEFAULT_BATCH_SIZE, &output_dir)
        }
    }
}

fn run_test_predictions<M: Classifier<DefaultBackend>>(
    model: &M,
    test_dir: &Path,
    kind: ModelKind,
    batch_size: usize,
    output_dir: &Path,
) -> Result<()> {
    println!("{}", "Running test predictions...".cyan());
    let device = default_device();

    let report = predict_directory(
        model,
        test_dir,
        kind.color_mode(),
        IMAGE_SIZE,
        &CATEGORIES,
        batch_size,
        output_dir,
        &device,
    )?;

    for record in &report.records {
        let marker = match record.is_match() {
            Some(true) => "✓".green().to_string(),
            Some(false) => "✗".red().to_string(),
            None => "?".yellow().to_string(),
        };
        println!(
            "  {} {:24} -> {:8} ({:.1}%)",
            marker,
            record.file_name,
            record.predicted_label,
            100.0 * record.confidence
        );
    }

    println!();
    if let (Some(accuracy), Some(ce)) = (report.accuracy, report.cross_entropy) {
        println!(
            "  Test accuracy: {:.2}% over {} labeled files",
            100.0 * accuracy,
            report.labeled
        );
        println!("  Cross-entropy: {:.4}", ce);
    } else {
        println!("  No filenames carried a recognizable label; accuracy not computed");
    }
    println!("  Prediction grid: {:?}", output_dir.join("predictions.svg"));

    Ok(())
}

fn cmd_stats(data_dir: &str) -> Result<()> {
    let dataset = AslDataset::scan(data_dir, None)?;
    dataset.stats().print();
    Ok(())
}

fn load_checkpoint<M: Module<DefaultBackend>>(model: M, checkpoint: &str) -> Result<M> {
    let device = default_device();
    let recorder = CompactRecorder::new();
    model
        .load_file(checkpoint, &recorder, &device)
        .map_err(|e| anyhow::anyhow!("failed to load checkpoint '{checkpoint}': {e:?}"))
}
