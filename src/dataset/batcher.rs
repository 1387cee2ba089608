//! Batching samples into Burn tensors
//!
//! Samples carry raw resized channel bytes; the batcher normalizes them to
//! [0, 1] floats (dividing by the encoder maximum, 255), transposes to CHW,
//! and stacks a batch into a `[N, C, H, W]` feature tensor with a parallel
//! `[N]` integer target tensor. One-hot label matrices are produced by
//! [`one_hot`] where a full label matrix is required.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use super::ColorMode;
use crate::IMAGE_SIZE;

/// A single preprocessed sample: resized raw channel bytes plus its label
#[derive(Clone, Debug)]
pub struct AslItem {
    /// Interleaved channel bytes (HWC for RGB, HW for grayscale)
    pub pixels: Vec<u8>,
    /// Class label index
    pub label: usize,
    /// Source path, kept for reporting
    pub path: String,
}

/// A batch of samples ready for the network
#[derive(Clone, Debug)]
pub struct AslBatch<B: Backend> {
    /// Images with shape [batch_size, channels, height, width], in [0, 1]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Builds [`AslBatch`]es from sample windows
#[derive(Clone, Debug)]
pub struct AslBatcher {
    channels: usize,
    image_size: usize,
}

impl AslBatcher {
    /// Create a batcher for the given decoding mode
    pub fn new(mode: ColorMode) -> Self {
        Self {
            channels: mode.channels(),
            image_size: IMAGE_SIZE,
        }
    }

    /// Create a batcher with a custom image size
    pub fn with_image_size(mode: ColorMode, image_size: usize) -> Self {
        Self {
            channels: mode.channels(),
            image_size,
        }
    }
}

impl<B: Backend> Batcher<B, AslItem, AslBatch<B>> for AslBatcher {
    fn batch(&self, items: Vec<AslItem>, device: &B::Device) -> AslBatch<B> {
        let batch_size = items.len();
        let (channels, height, width) = (self.channels, self.image_size, self.image_size);
        let plane = height * width;

        // Normalize to [0, 1] and transpose interleaved HWC bytes to CHW
        let mut images_data = vec![0.0f32; batch_size * channels * plane];
        for (i, item) in items.iter().enumerate() {
            let base = i * channels * plane;
            for y in 0..height {
                for x in 0..width {
                    for c in 0..channels {
                        let value = item.pixels[(y * width + x) * channels + c] as f32 / 255.0;
                        images_data[base + c * plane + y * width + x] = value;
                    }
                }
            }
        }

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        AslBatch { images, targets }
    }
}

/// One-hot encode labels over `num_classes`: each row has exactly one 1.0,
/// at the label's index.
pub fn one_hot(labels: &[usize], num_classes: usize) -> Vec<Vec<f32>> {
    labels
        .iter()
        .map(|&label| {
            let mut row = vec![0.0f32; num_classes];
            row[label] = 1.0;
            row
        })
        .collect()
}
