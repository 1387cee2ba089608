//! Training: the fit loop, checkpoint tracking, and training curves

pub mod trainer;

pub use trainer::{fit, BestLossTracker, TrainingConfig, TrainingHistory};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 10;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default learning rate for the Adam optimizer
pub const DEFAULT_LEARNING_RATE: f64 = 5e-4;

/// Fraction of samples held out for validation
pub const VALIDATION_FRACTION: f64 = 0.1;

/// L2 penalty applied through optimizer weight decay
pub const WEIGHT_DECAY: f32 = 1e-3;

/// File stem of the best checkpoint (the recorder appends its extension)
pub const CHECKPOINT_FILE: &str = "best_model";
