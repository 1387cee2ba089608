//! Network architectures for ASL alphabet classification
//!
//! Two fixed architectures are available, selected by [`ModelKind`]:
//! a convolutional stack for RGB input and a fully-connected network for
//! flattened grayscale input. Hyperparameters are literal constants in the
//! respective configs; reproducing the pipeline means keeping them.

pub mod cnn;
pub mod dense;

use burn::module::Module;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::ColorMode;

pub use cnn::{SignConvNet, SignConvNetConfig};
pub use dense::{SignDenseNet, SignDenseNetConfig};

/// Which of the two fixed pipelines to run.
///
/// A tagged variant, never compared by string value: typos fail at compile
/// time instead of silently selecting the wrong branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Convolutional network over 64×64 RGB images
    Convolutional,
    /// Fully-connected network over flattened 64×64 grayscale images
    Dense,
}

impl ModelKind {
    /// The decoding mode this pipeline expects
    pub fn color_mode(&self) -> ColorMode {
        match self {
            ModelKind::Convolutional => ColorMode::Rgb,
            ModelKind::Dense => ColorMode::Grayscale,
        }
    }

    /// Whether training applies geometric augmentation
    pub fn augments(&self) -> bool {
        matches!(self, ModelKind::Convolutional)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Convolutional => "convolutional",
            ModelKind::Dense => "dense",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common interface over the two architectures.
///
/// Both consume `[N, C, H, W]` batches (the dense network flattens
/// internally) and produce `[N, num_classes]` logits.
pub trait Classifier<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;

    fn num_classes(&self) -> usize;

    /// Forward pass followed by softmax, for inference
    fn forward_softmax(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(images), 1)
    }

    /// Layer-by-layer summary for the architecture diagram
    fn describe(&self) -> Vec<LayerSummary>;
}

/// One row of an architecture summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Layer name (e.g. "conv2d_1")
    pub name: String,
    /// Output shape with the batch dimension elided
    pub output_shape: String,
    /// Trainable parameter count
    pub params: usize,
}

/// Output side length of a valid (unpadded) convolution
pub(crate) fn conv_out(size: usize, kernel: usize, stride: usize) -> usize {
    (size - kernel) / stride + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_color_modes() {
        assert_eq!(ModelKind::Convolutional.color_mode(), ColorMode::Rgb);
        assert_eq!(ModelKind::Dense.color_mode(), ColorMode::Grayscale);
        assert!(ModelKind::Convolutional.augments());
        assert!(!ModelKind::Dense.augments());
    }

    #[test]
    fn test_conv_out_dims() {
        // The convolutional stack shrinks 64 -> 61 -> 29 -> 26 -> 12 -> 9 -> 3
        let mut size = 64;
        let expected = [61, 29, 26, 12, 9, 3];
        let strides = [1, 2, 1, 2, 1, 2];
        for (out, stride) in expected.iter().zip(strides.iter()) {
            size = conv_out(size, 4, *stride);
            assert_eq!(size, *out);
        }
    }
}
