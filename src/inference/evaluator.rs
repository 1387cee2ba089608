//! Validation-slice evaluation
//!
//! Runs per-sample inference over the first 10% of the (shuffled) sample
//! list and produces a text classification report plus a confusion matrix,
//! rendered as a heatmap and saved as CSV. The slice is taken by index and
//! overlaps data seen by the trainer's own internal split; treat the numbers
//! as a sanity check, not a held-out benchmark.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use tracing::info;

use crate::dataset::batcher::{AslBatch, AslBatcher, AslItem};
use crate::dataset::ColorMode;
use crate::model::Classifier;
use crate::utils::charts;
use crate::utils::error::{AslError, Result};
use crate::utils::metrics::Metrics;

/// Fraction of the sample list evaluated, from the front
pub const EVALUATION_FRACTION: f64 = 0.1;

/// The outcome of an evaluation pass
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Aggregate and per-class metrics
    pub metrics: Metrics,
    /// The formatted classification report
    pub report_text: String,
    /// Number of samples evaluated
    pub samples: usize,
}

/// Evaluate a model on the leading slice of `items`.
///
/// Writes `confusion_matrix.svg`, `confusion_matrix.csv` and `metrics.json`
/// to `output_dir`. With `normalize` set, the heatmap shows row-normalized
/// fractions instead of raw counts.
#[allow(clippy::too_many_arguments)]
pub fn evaluate<B: Backend, M: Classifier<B>>(
    model: &M,
    items: &[AslItem],
    mode: ColorMode,
    image_size: usize,
    categories: &[&str],
    batch_size: usize,
    normalize: bool,
    output_dir: &Path,
    device: &B::Device,
) -> Result<EvaluationReport> {
    let count = ((items.len() as f64 * EVALUATION_FRACTION) as usize).max(1);
    let slice = &items[..count.min(items.len())];

    info!("Evaluating on {} samples", slice.len());

    let batcher = AslBatcher::with_image_size(mode, image_size);
    let mut predictions = Vec::with_capacity(slice.len());
    let mut ground_truth = Vec::with_capacity(slice.len());

    for window in slice.chunks(batch_size) {
        let batch: AslBatch<B> = batcher.batch(window.to_vec(), device);
        let output = model.forward(batch.images);

        let predicted: Vec<i64> = output
            .argmax(1)
            .squeeze::<1>(1)
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| AslError::Inference(format!("failed to read predictions: {e:?}")))?;

        predictions.extend(predicted.into_iter().map(|p| p as usize));
        ground_truth.extend(window.iter().map(|item| item.label));
    }

    let metrics = Metrics::from_predictions(&predictions, &ground_truth, categories.len());
    let report_text = metrics.classification_report(categories);

    std::fs::create_dir_all(output_dir)?;

    charts::generate_confusion_heatmap(
        if normalize {
            "Normalized confusion matrix"
        } else {
            "Confusion matrix, without normalization"
        },
        &metrics.confusion_matrix,
        categories,
        normalize,
        &output_dir.join("confusion_matrix.svg"),
    )?;
    metrics
        .confusion_matrix
        .save_csv(&output_dir.join("confusion_matrix.csv"))?;

    let json = serde_json::to_string_pretty(&metrics)
        .map_err(|e| AslError::Serialization(e.to_string()))?;
    std::fs::write(output_dir.join("metrics.json"), json)?;

    Ok(EvaluationReport {
        samples: slice.len(),
        report_text,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::model::dense::{SignDenseNet, SignDenseNetConfig};

    type TestBackend = NdArray;

    fn tiny_items(count: usize, size: usize) -> Vec<AslItem> {
        (0..count)
            .map(|i| AslItem {
                pixels: vec![(i * 13 % 256) as u8; size * size],
                label: i % 2,
                path: format!("sample_{i}.png"),
            })
            .collect()
    }

    #[test]
    fn test_evaluate_uses_leading_slice() {
        let device = Default::default();
        let config = SignDenseNetConfig::new()
            .with_input_size(8)
            .with_num_classes(2)
            .with_hidden1(16)
            .with_hidden2(16)
            .with_hidden3(8);
        let model = SignDenseNet::<TestBackend>::new(&config, &device);

        let output_dir = std::env::temp_dir().join(format!("asl_eval_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&output_dir);

        let items = tiny_items(40, 8);
        let report = evaluate(
            &model,
            &items,
            ColorMode::Grayscale,
            8,
            &["A", "B"],
            16,
            true,
            &output_dir,
            &device,
        )
        .unwrap();

        // 10% of 40 samples
        assert_eq!(report.samples, 4);
        assert_eq!(report.metrics.total_samples, 4);
        assert!(report.report_text.contains("precision"));

        assert!(output_dir.join("confusion_matrix.svg").exists());
        assert!(output_dir.join("confusion_matrix.csv").exists());
        assert!(output_dir.join("metrics.json").exists());

        std::fs::remove_dir_all(&output_dir).unwrap();
    }

    #[test]
    fn test_evaluate_single_sample_floor() {
        let device = Default::default();
        let config = SignDenseNetConfig::new()
            .with_input_size(8)
            .with_num_classes(2)
            .with_hidden1(16)
            .with_hidden2(16)
            .with_hidden3(8);
        let model = SignDenseNet::<TestBackend>::new(&config, &device);

        let output_dir =
            std::env::temp_dir().join(format!("asl_eval_one_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&output_dir);

        // Fewer than ten samples still evaluates at least one
        let items = tiny_items(5, 8);
        let report = evaluate(
            &model,
            &items,
            ColorMode::Grayscale,
            8,
            &["A", "B"],
            16,
            false,
            &output_dir,
            &device,
        )
        .unwrap();

        assert_eq!(report.samples, 1);

        std::fs::remove_dir_all(&output_dir).unwrap();
    }
}
