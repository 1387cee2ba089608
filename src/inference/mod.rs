//! Inference: validation-slice evaluation and test-directory prediction

pub mod evaluator;
pub mod predictor;

pub use evaluator::{evaluate, EvaluationReport};
pub use predictor::{predict_directory, PredictionRecord, TestReport};
