//! # ASL Alphabet Recognition
//!
//! A Rust pipeline for American Sign Language alphabet classification using
//! the Burn framework. Labeled image folders are loaded and preprocessed into
//! tensors, a convolutional or fully-connected network is trained on them,
//! and the result is evaluated with a classification report, a confusion
//! matrix heatmap, and an annotated prediction grid over an external test
//! directory.
//!
//! ## Modules
//!
//! - `dataset`: folder scanning, decoding, augmentation, and batching
//! - `model`: the two network architectures (convolutional and dense)
//! - `training`: the fit loop, best-checkpoint tracking, and training curves
//! - `inference`: validation-slice evaluation and test-directory prediction
//! - `utils`: errors, metrics, SVG charts, and logging
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use asl_alphabet::dataset::AslDataset;
//! use asl_alphabet::model::ModelKind;
//!
//! let dataset = AslDataset::scan("data/asl_alphabet_train", None)?;
//! // ... training and inference via the `training` and `inference` modules
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::batcher::{one_hot, AslBatch, AslBatcher, AslItem};
pub use dataset::loader::{AslDataset, DatasetStats, ImageEntry, SkippedFile};
pub use dataset::{class_index, class_name, ColorMode, CATEGORIES};
pub use inference::evaluator::EvaluationReport;
pub use inference::predictor::PredictionRecord;
pub use model::{Classifier, ModelKind};
pub use training::{BestLossTracker, TrainingConfig, TrainingHistory};
pub use utils::error::{AslError, Result};
pub use utils::metrics::{ConfusionMatrix, Metrics};

/// Number of ASL alphabet classes (26 letters plus "del", "space", "nothing")
pub const NUM_CLASSES: usize = 29;

/// Side length of every preprocessed image
pub const IMAGE_SIZE: usize = 64;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
