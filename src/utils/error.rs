//! Error handling
//!
//! Custom error types for the ASL alphabet library, defined with thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ASL alphabet operations
#[derive(Error, Debug)]
pub enum AslError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model construction or checkpointing
    #[error("Model error: {0}")]
    Model(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Error rendering a chart artifact
    #[error("Chart error: {0}")]
    Chart(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for ASL alphabet operations
pub type Result<T> = std::result::Result<T, AslError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AslError::Dataset("no samples found".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no samples found");
    }

    #[test]
    fn test_image_load_error_includes_path() {
        let path = PathBuf::from("/data/A/A1.jpg");
        let err = AslError::ImageLoad(path, "decode failed".to_string());
        assert!(format!("{}", err).contains("A1.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AslError = io.into();
        assert!(matches!(err, AslError::Io(_)));
    }
}
