//! Dataset handling for the ASL alphabet corpus
//!
//! This module provides:
//! - Scanning the per-category training folders from disk
//! - Decoding and resizing images into fixed-size samples
//! - Data augmentation for the convolutional training path
//! - Batching samples into Burn tensors
//!
//! The training corpus is one subdirectory per category; the flat test
//! directory carries its ground truth in the leading token of each filename
//! (e.g. `A_test.jpg`, `space_test.jpg`).

pub mod augment;
pub mod batcher;
pub mod loader;

// Re-export main types for convenience
pub use augment::{AugmentConfig, Augmenter};
pub use batcher::{one_hot, AslBatch, AslBatcher, AslItem};
pub use loader::{AslDataset, DatasetStats, ImageEntry, SkippedFile};

/// The 29 ASL alphabet categories, in the order the training directories
/// sort on disk. This order defines the class indices and must not change
/// between training and inference: a saved checkpoint encodes it.
pub const CATEGORIES: [&str; 29] = [
    "A", "B", "C", "D", "del", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "nothing", "O",
    "P", "Q", "R", "S", "space", "T", "U", "V", "W", "X", "Y", "Z",
];

/// How images are decoded: RGB for the convolutional path, single-channel
/// grayscale for the dense path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Grayscale,
}

impl ColorMode {
    /// Number of channels a decoded image carries
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Grayscale => 1,
        }
    }
}

/// Get the category name for a given class index
pub fn class_name(label: usize) -> Option<&'static str> {
    CATEGORIES.get(label).copied()
}

/// Get the class index for a given category name
pub fn class_index(name: &str) -> Option<usize> {
    CATEGORIES.iter().position(|&n| n == name)
}

/// Derive the true class of a test file from its name.
///
/// Multi-letter categories are matched first ("del_test.jpg" is "del", not
/// "D"); otherwise the first character, uppercased, is looked up.
pub fn label_from_filename(file_name: &str, categories: &[&str]) -> Option<usize> {
    let lower = file_name.to_lowercase();
    let mut best: Option<(usize, usize)> = None; // (name_len, index)
    for (idx, name) in categories.iter().enumerate() {
        if lower.starts_with(&name.to_lowercase())
            && best.map(|(len, _)| name.len() > len).unwrap_or(true)
        {
            best = Some((name.len(), idx));
        }
    }
    if let Some((_, idx)) = best {
        return Some(idx);
    }

    let first = file_name.chars().next()?.to_ascii_uppercase().to_string();
    categories.iter().position(|&n| n == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_count() {
        assert_eq!(CATEGORIES.len(), 29);
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name(0), Some("A"));
        assert_eq!(class_name(4), Some("del"));
        assert_eq!(class_name(15), Some("nothing"));
        assert_eq!(class_name(21), Some("space"));
        assert_eq!(class_name(28), Some("Z"));
        assert_eq!(class_name(29), None);
    }

    #[test]
    fn test_class_index_roundtrip() {
        for (idx, name) in CATEGORIES.iter().enumerate() {
            assert_eq!(class_index(name), Some(idx));
        }
        assert_eq!(class_index("unknown"), None);
    }

    #[test]
    fn test_label_from_filename_letters() {
        assert_eq!(label_from_filename("A_test.jpg", &CATEGORIES), Some(0));
        assert_eq!(label_from_filename("Z_test.jpg", &CATEGORIES), Some(28));
        assert_eq!(label_from_filename("b42.png", &CATEGORIES), Some(1));
    }

    #[test]
    fn test_label_from_filename_special() {
        assert_eq!(label_from_filename("del_test.jpg", &CATEGORIES), Some(4));
        assert_eq!(
            label_from_filename("nothing_test.jpg", &CATEGORIES),
            Some(15)
        );
        assert_eq!(label_from_filename("space_test.jpg", &CATEGORIES), Some(21));
    }

    #[test]
    fn test_label_from_filename_unknown() {
        assert_eq!(label_from_filename("7.jpg", &CATEGORIES), None);
    }

    #[test]
    fn test_color_mode_channels() {
        assert_eq!(ColorMode::Rgb.channels(), 3);
        assert_eq!(ColorMode::Grayscale.channels(), 1);
    }
}
