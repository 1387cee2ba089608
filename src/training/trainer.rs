//! Training loop
//!
//! A custom fit loop over Burn's autodiff API: forward, cross-entropy loss,
//! backward, Adam step. Each epoch evaluates the held-out validation slice
//! and persists the checkpoint whenever the validation loss improves
//! strictly. Training curves and a CSV log are written at the end.

use std::path::{Path, PathBuf};

use burn::{
    data::dataloader::batcher::Batcher,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion},
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::{
    CHECKPOINT_FILE, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
    VALIDATION_FRACTION, WEIGHT_DECAY,
};
use crate::dataset::augment::Augmenter;
use crate::dataset::batcher::{AslBatch, AslBatcher, AslItem};
use crate::dataset::ColorMode;
use crate::model::Classifier;
use crate::utils::charts::{self, DataSeries};
use crate::utils::error::{AslError, Result};

/// Hyperparameters and paths for one training run.
///
/// The architecture constants live in the model configs; everything here is
/// what the CLI may override.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_fraction: f64,
    pub image_size: usize,
    pub seed: u64,
    pub output_dir: PathBuf,
}

impl TrainingConfig {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            validation_fraction: VALIDATION_FRACTION,
            image_size: crate::IMAGE_SIZE,
            seed: 42,
            output_dir: output_dir.into(),
        }
    }

    /// Path of the best-validation-loss checkpoint (extension added by the
    /// recorder; newest best overwrites)
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(CHECKPOINT_FILE)
    }
}

/// Per-epoch training curves
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_loss: Vec<f64>,
    pub train_accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn record_epoch(
        &mut self,
        train_loss: f64,
        train_accuracy: f64,
        val_loss: f64,
        val_accuracy: f64,
    ) {
        self.train_loss.push(train_loss);
        self.train_accuracy.push(train_accuracy);
        self.val_loss.push(val_loss);
        self.val_accuracy.push(val_accuracy);
    }

    pub fn epochs(&self) -> usize {
        self.train_loss.len()
    }

    /// Write the per-epoch log as CSV for external visualization
    pub fn save_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut content = String::from("epoch,train_loss,train_accuracy,val_loss,val_accuracy\n");
        for epoch in 0..self.epochs() {
            content.push_str(&format!(
                "{},{:.6},{:.6},{:.6},{:.6}\n",
                epoch + 1,
                self.train_loss[epoch],
                self.train_accuracy[epoch],
                self.val_loss[epoch],
                self.val_accuracy[epoch],
            ));
        }
        std::fs::write(path, content)
    }

    /// Render the accuracy and loss curves as SVG files
    pub fn save_charts(&self, output_dir: &Path) -> std::io::Result<()> {
        let (train_color, val_color) = charts::series_colors();

        let accuracy_series = vec![
            DataSeries::from_epochs("train", &self.train_accuracy, train_color),
            DataSeries::from_epochs("validation", &self.val_accuracy, val_color),
        ];
        charts::generate_line_chart(
            "Model accuracy",
            "Epoch",
            "Accuracy",
            &accuracy_series,
            Some((0.0, 1.0)),
            &output_dir.join("accuracy.svg"),
        )?;

        let loss_series = vec![
            DataSeries::from_epochs("train", &self.train_loss, train_color),
            DataSeries::from_epochs("validation", &self.val_loss, val_color),
        ];
        charts::generate_line_chart(
            "Model loss",
            "Epoch",
            "Loss",
            &loss_series,
            None,
            &output_dir.join("loss.svg"),
        )
    }
}

/// Tracks the best validation loss seen so far.
///
/// `observe` returns true only on strict improvement, which is exactly when
/// the checkpoint is written.
#[derive(Debug, Clone, Default)]
pub struct BestLossTracker {
    best: Option<f64>,
}

impl BestLossTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an epoch's validation loss; true if it strictly improves on
    /// every previous epoch
    pub fn observe(&mut self, loss: f64) -> bool {
        match self.best {
            Some(best) if loss >= best => false,
            _ => {
                self.best = Some(loss);
                true
            }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

/// Train a classifier on preprocessed samples.
///
/// The last `validation_fraction` of `items` is held out; the rest is
/// shuffled each epoch and fed through in `batch_size` windows, augmented
/// per-batch when an augmenter is given. Returns the final model and the
/// recorded history; the best checkpoint, curves, and CSV log are written to
/// `config.output_dir` as side effects.
pub fn fit<B, M>(
    mut model: M,
    items: &[AslItem],
    mode: ColorMode,
    augmenter: Option<&Augmenter>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(M, TrainingHistory)>
where
    B: AutodiffBackend,
    M: Classifier<B> + AutodiffModule<B>,
    M::InnerModule: Classifier<B::InnerBackend>,
{
    let val_count = (items.len() as f64 * config.validation_fraction) as usize;
    let train_count = items.len() - val_count;

    if train_count == 0 || val_count == 0 {
        return Err(AslError::Training(format!(
            "not enough samples to split: {} total, {} validation",
            items.len(),
            val_count
        )));
    }

    let (train_items, val_items) = items.split_at(train_count);

    std::fs::create_dir_all(&config.output_dir)?;

    info!(
        "Training on {} samples, validating on {}",
        train_count, val_count
    );
    println!(
        "  Training samples:   {}\n  Validation samples: {}\n  Epochs: {}  Batch size: {}  LR: {}",
        train_count, val_count, config.epochs, config.batch_size, config.learning_rate
    );

    let batcher = AslBatcher::with_image_size(mode, config.image_size);
    let loss_fn = CrossEntropyLossConfig::new().init(device);

    let mut optimizer = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
        .init();

    let mut history = TrainingHistory::default();
    let mut tracker = BestLossTracker::new();
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);

    for epoch in 0..config.epochs {
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, config.epochs)
                .yellow()
                .bold()
        );

        let mut indices: Vec<usize> = (0..train_items.len()).collect();
        indices.shuffle(&mut epoch_rng);

        let mut epoch_loss = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;
        let num_batches = indices.len().div_ceil(config.batch_size);

        for batch_idx in 0..num_batches {
            let start = batch_idx * config.batch_size;
            let end = (start + config.batch_size).min(indices.len());
            let mut batch_items: Vec<AslItem> = indices[start..end]
                .iter()
                .map(|&i| train_items[i].clone())
                .collect();

            if let Some(augmenter) = augmenter {
                batch_items = augmenter.augment_items(batch_items, &mut epoch_rng);
            }

            let batch: AslBatch<B> = batcher.batch(batch_items, device);

            let output = model.forward(batch.images.clone());
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;

            let predictions = output.argmax(1).squeeze::<1>(1);
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch.targets.dims()[0];

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if (batch_idx + 1) % 10 == 0 || batch_idx == num_batches - 1 {
                println!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    batch_idx + 1,
                    num_batches,
                    loss_value,
                    100.0 * correct as f64 / seen as f64
                );
            }
        }

        let train_loss = epoch_loss / num_batches.max(1) as f64;
        let train_accuracy = correct as f64 / seen.max(1) as f64;

        // Validation on the inner backend, autodiff and dropout disabled
        let inner_device = <B::InnerBackend as Backend>::Device::default();
        let (val_loss, val_accuracy) = evaluate_split(
            &model.valid(),
            val_items,
            &batcher,
            config.batch_size,
            &inner_device,
        );

        history.record_epoch(train_loss, train_accuracy, val_loss, val_accuracy);

        let improved = tracker.observe(val_loss);
        if improved {
            let recorder = CompactRecorder::new();
            model
                .clone()
                .save_file(config.checkpoint_path(), &recorder)
                .map_err(|e| AslError::Model(format!("failed to save checkpoint: {e:?}")))?;
            info!(
                "Validation loss improved to {:.4}, checkpoint saved",
                val_loss
            );
        }

        println!(
            "  {} loss: {:.4} | acc: {:.2}% | val loss: {:.4} | val acc: {:.2}%{}",
            "→".cyan(),
            train_loss,
            100.0 * train_accuracy,
            val_loss,
            100.0 * val_accuracy,
            if improved {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    history.save_csv(&config.output_dir.join("history.csv"))?;
    history.save_charts(&config.output_dir)?;

    Ok((model, history))
}

/// Average cross-entropy loss and accuracy over a sample slice
pub fn evaluate_split<B: Backend, M: Classifier<B>>(
    model: &M,
    items: &[AslItem],
    batcher: &AslBatcher,
    batch_size: usize,
    device: &B::Device,
) -> (f64, f64) {
    let loss_fn = CrossEntropyLossConfig::new().init(device);

    let mut total_loss = 0.0f64;
    let mut batches = 0usize;
    let mut correct = 0usize;
    let mut total = 0usize;

    for window in items.chunks(batch_size) {
        if window.is_empty() {
            continue;
        }

        let batch: AslBatch<B> = batcher.batch(window.to_vec(), device);
        let output = model.forward(batch.images);

        let loss = loss_fn.forward(output.clone(), batch.targets.clone());
        total_loss += loss.into_scalar().elem::<f64>();
        batches += 1;

        let predictions = output.argmax(1).squeeze::<1>(1);
        let batch_correct: i64 = predictions
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem();
        correct += batch_correct as usize;
        total += window.len();
    }

    let loss = if batches > 0 {
        total_loss / batches as f64
    } else {
        0.0
    };
    let accuracy = if total > 0 {
        correct as f64 / total as f64
    } else {
        0.0
    };

    (loss, accuracy)
}
