//! Test-directory prediction
//!
//! Loads every image of a flat test directory, runs inference, and renders a
//! grid of thumbnails annotated with the predicted label and filename. True
//! labels are parsed from the filenames' leading token where possible, and
//! scored with standard accuracy plus a categorical cross-entropy computed
//! from the model's probability vectors against one-hot truth.

use std::io::Cursor;
use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use image::{GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::batcher::{one_hot, AslBatch, AslBatcher, AslItem};
use crate::dataset::loader::{list_image_files, load_image};
use crate::dataset::{label_from_filename, ColorMode};
use crate::model::Classifier;
use crate::utils::charts::{self, GridCell};
use crate::utils::error::{AslError, Result};

/// Probability floor for the cross-entropy computation
const PROB_EPSILON: f32 = 1e-7;

/// One test file's prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Source filename (no directory)
    pub file_name: String,
    /// Predicted class index
    pub predicted: usize,
    /// Predicted category name
    pub predicted_label: String,
    /// Probability of the predicted class
    pub confidence: f32,
    /// Full probability distribution
    pub probabilities: Vec<f32>,
    /// True class parsed from the filename, when recognizable
    pub true_label: Option<usize>,
}

impl PredictionRecord {
    /// Whether prediction and filename-derived truth agree
    pub fn is_match(&self) -> Option<bool> {
        self.true_label.map(|t| t == self.predicted)
    }
}

/// Scores over a test directory
#[derive(Debug, Clone)]
pub struct TestReport {
    pub records: Vec<PredictionRecord>,
    /// Accuracy over the files with a parseable label
    pub accuracy: Option<f64>,
    /// Mean categorical cross-entropy over the same files
    pub cross_entropy: Option<f64>,
    /// Number of files with a parseable label
    pub labeled: usize,
}

impl TestReport {
    /// Score a set of prediction records
    pub fn from_records(records: Vec<PredictionRecord>, num_classes: usize) -> Self {
        let labeled: Vec<&PredictionRecord> = records
            .iter()
            .filter(|r| r.true_label.is_some())
            .collect();

        if labeled.is_empty() {
            return Self {
                records,
                accuracy: None,
                cross_entropy: None,
                labeled: 0,
            };
        }

        let matches = labeled
            .iter()
            .filter(|r| r.is_match() == Some(true))
            .count();
        let accuracy = matches as f64 / labeled.len() as f64;

        let labels: Vec<usize> = labeled.iter().map(|r| r.true_label.unwrap()).collect();
        let probs: Vec<&[f32]> = labeled.iter().map(|r| r.probabilities.as_slice()).collect();
        let cross_entropy = mean_cross_entropy(&probs, &labels, num_classes);

        let count = labeled.len();
        Self {
            records,
            accuracy: Some(accuracy),
            cross_entropy: Some(cross_entropy),
            labeled: count,
        }
    }
}

/// Mean categorical cross-entropy of probability vectors against one-hot
/// truth: `-mean(sum(one_hot * ln(p)))`, with probabilities floored at 1e-7.
pub fn mean_cross_entropy(probabilities: &[&[f32]], labels: &[usize], num_classes: usize) -> f64 {
    let encoded = one_hot(labels, num_classes);

    let total: f64 = probabilities
        .iter()
        .zip(encoded.iter())
        .map(|(probs, truth)| {
            -probs
                .iter()
                .zip(truth.iter())
                .map(|(&p, &t)| t as f64 * (p.max(PROB_EPSILON) as f64).ln())
                .sum::<f64>()
        })
        .sum();

    total / labels.len().max(1) as f64
}

/// Run inference over every image in a flat test directory.
///
/// Each file yields exactly one processed image, preprocessed identically to
/// training. Writes `predictions.svg` to `output_dir` and returns the scored
/// records.
#[allow(clippy::too_many_arguments)]
pub fn predict_directory<B: Backend, M: Classifier<B>>(
    model: &M,
    test_dir: &Path,
    mode: ColorMode,
    image_size: usize,
    categories: &[&str],
    batch_size: usize,
    output_dir: &Path,
    device: &B::Device,
) -> Result<TestReport> {
    let files = list_image_files(test_dir)?;
    info!("Predicting {} test images from {:?}", files.len(), test_dir);

    let mut items = Vec::with_capacity(files.len());
    for path in &files {
        match load_image(path, image_size, mode) {
            Ok(pixels) => items.push(AslItem {
                pixels,
                // Targets are unused at prediction time
                label: 0,
                path: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            }),
            Err(e) => warn!("Skipping unreadable test image: {e}"),
        }
    }

    if items.is_empty() {
        return Err(AslError::Inference(format!(
            "no readable test images in {}",
            test_dir.display()
        )));
    }

    let batcher = AslBatcher::with_image_size(mode, image_size);
    let mut records = Vec::with_capacity(items.len());
    let mut cells = Vec::with_capacity(items.len());

    for window in items.chunks(batch_size) {
        let batch: AslBatch<B> = batcher.batch(window.to_vec(), device);
        let probs = model.forward_softmax(batch.images);
        let probs_data: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| AslError::Inference(format!("failed to read probabilities: {e:?}")))?;

        for (row, item) in window.iter().enumerate() {
            let probabilities =
                probs_data[row * categories.len()..(row + 1) * categories.len()].to_vec();

            let (predicted, &confidence) = probabilities
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .unwrap_or((0, &0.0));

            let predicted_label = categories.get(predicted).copied().unwrap_or("?").to_string();
            let true_label = label_from_filename(&item.path, categories);

            cells.push(GridCell {
                png: encode_thumbnail(&item.pixels, image_size, mode)?,
                title: format!("prediction = {predicted_label}"),
                subtitle: item.path.clone(),
            });

            records.push(PredictionRecord {
                file_name: item.path.clone(),
                predicted,
                predicted_label,
                confidence,
                probabilities,
                true_label,
            });
        }
    }

    std::fs::create_dir_all(output_dir)?;
    charts::generate_prediction_grid(
        "Test predictions",
        &cells,
        &output_dir.join("predictions.svg"),
    )?;

    let report = TestReport::from_records(records, categories.len());
    if let (Some(accuracy), Some(ce)) = (report.accuracy, report.cross_entropy) {
        info!(
            "Test accuracy {:.2}% over {} labeled files, cross-entropy {:.4}",
            100.0 * accuracy,
            report.labeled,
            ce
        );
    }

    Ok(report)
}

/// PNG-encode a sample's raw bytes for embedding in the grid
fn encode_thumbnail(pixels: &[u8], image_size: usize, mode: ColorMode) -> Result<Vec<u8>> {
    let size = image_size as u32;
    let mut png = Vec::new();
    let mut cursor = Cursor::new(&mut png);

    match mode {
        ColorMode::Rgb => {
            let img: RgbImage = RgbImage::from_raw(size, size, pixels.to_vec())
                .ok_or_else(|| AslError::Inference("thumbnail buffer size mismatch".into()))?;
            img.write_to(&mut cursor, ImageFormat::Png)
                .map_err(|e| AslError::Inference(format!("failed to encode thumbnail: {e}")))?;
        }
        ColorMode::Grayscale => {
            let img: GrayImage = GrayImage::from_raw(size, size, pixels.to_vec())
                .ok_or_else(|| AslError::Inference("thumbnail buffer size mismatch".into()))?;
            img.write_to(&mut cursor, ImageFormat::Png)
                .map_err(|e| AslError::Inference(format!("failed to encode thumbnail: {e}")))?;
        }
    }

    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::model::dense::{SignDenseNet, SignDenseNetConfig};

    type TestBackend = NdArray;

    fn record(predicted: usize, true_label: Option<usize>, probs: Vec<f32>) -> PredictionRecord {
        PredictionRecord {
            file_name: "x.png".to_string(),
            predicted,
            predicted_label: "?".to_string(),
            confidence: probs[predicted],
            probabilities: probs,
            true_label,
        }
    }

    #[test]
    fn test_exact_match_reporting() {
        // A correctly classified "A_test.jpg" (index 0) reports a match
        let r = record(0, Some(0), vec![0.9, 0.1]);
        assert_eq!(r.is_match(), Some(true));

        let report = TestReport::from_records(vec![r], 2);
        assert_eq!(report.accuracy, Some(1.0));
        assert_eq!(report.labeled, 1);
    }

    #[test]
    fn test_accuracy_over_labeled_files_only() {
        let records = vec![
            record(0, Some(0), vec![0.8, 0.2]),
            record(1, Some(0), vec![0.3, 0.7]),
            record(1, None, vec![0.4, 0.6]),
        ];

        let report = TestReport::from_records(records, 2);
        assert_eq!(report.labeled, 2);
        assert_eq!(report.accuracy, Some(0.5));
    }

    #[test]
    fn test_cross_entropy_perfect_prediction_is_near_zero() {
        let probs: Vec<&[f32]> = vec![&[1.0, 0.0]];
        let ce = mean_cross_entropy(&probs, &[0], 2);
        assert!(ce.abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_uniform_prediction() {
        let uniform = [0.5f32, 0.5];
        let probs: Vec<&[f32]> = vec![&uniform, &uniform];
        let ce = mean_cross_entropy(&probs, &[0, 1], 2);
        assert!((ce - 0.5f64.ln().abs()).abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_floors_zero_probability() {
        // A confidently wrong prediction must not produce infinity
        let probs: Vec<&[f32]> = vec![&[1.0, 0.0]];
        let ce = mean_cross_entropy(&probs, &[1], 2);
        assert!(ce.is_finite());
        assert!(ce > 10.0);
    }

    #[test]
    fn test_predict_directory_one_image_per_file() {
        let device = Default::default();
        let config = SignDenseNetConfig::new()
            .with_input_size(8)
            .with_num_classes(3)
            .with_hidden1(16)
            .with_hidden2(16)
            .with_hidden3(8);
        let model = SignDenseNet::<TestBackend>::new(&config, &device);

        let test_dir =
            std::env::temp_dir().join(format!("asl_predict_in_{}", std::process::id()));
        let output_dir =
            std::env::temp_dir().join(format!("asl_predict_out_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&test_dir);
        let _ = std::fs::remove_dir_all(&output_dir);
        std::fs::create_dir_all(&test_dir).unwrap();

        for name in ["A_test.png", "B_test.png", "unknown.png"] {
            let img = image::GrayImage::from_pixel(8, 8, image::Luma([120]));
            img.save(test_dir.join(name)).unwrap();
        }

        let categories = ["A", "B", "C"];
        let report = predict_directory(
            &model,
            &test_dir,
            ColorMode::Grayscale,
            8,
            &categories,
            2,
            &output_dir,
            &device,
        )
        .unwrap();

        // One record per file, no phantom copies
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.labeled, 2);
        assert!(report.accuracy.is_some());
        assert!(report.cross_entropy.is_some());

        for r in &report.records {
            assert!((r.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }

        assert!(output_dir.join("predictions.svg").exists());

        std::fs::remove_dir_all(&test_dir).unwrap();
        std::fs::remove_dir_all(&output_dir).unwrap();
    }
}
