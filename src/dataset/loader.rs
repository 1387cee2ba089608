//! ASL dataset loader
//!
//! Scans a training directory laid out as one subdirectory per category,
//! then decodes the discovered files into fixed-size samples. Decode
//! failures are collected, not swallowed: `load_items` returns the skipped
//! files alongside the loaded samples so callers can assert on data quality.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageReader;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::batcher::AslItem;
use super::{ColorMode, CATEGORIES};
use crate::utils::error::{AslError, Result};
use crate::IMAGE_SIZE;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A discovered image file with its class assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index, the category's position in the injected list
    pub label: usize,
    /// Category name (e.g. "A", "space")
    pub class_name: String,
}

/// A file that failed to decode or resize, with the reason
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The ASL alphabet training corpus, scanned from disk
///
/// Scanning only lists files; pixel data is decoded by [`load_items`].
///
/// Expected layout:
/// ```text
/// root_dir/
/// ├── A/
/// │   ├── A1.jpg
/// │   └── A2.jpg
/// ├── B/
/// │   └── ...
/// └── ...
/// ```
///
/// [`load_items`]: AslDataset::load_items
#[derive(Debug, Clone)]
pub struct AslDataset {
    /// Root directory of the corpus
    pub root_dir: PathBuf,
    /// All discovered files, in category order until shuffled
    pub entries: Vec<ImageEntry>,
    /// The ordered category list defining the index↔label mapping
    pub categories: Vec<String>,
    /// Target side length for decoded images
    pub image_size: usize,
}

impl AslDataset {
    /// Scan a training directory against an ordered category list.
    ///
    /// `categories` defaults to the full 29-class ASL list; tests inject a
    /// smaller one. A missing category subdirectory is logged and yields no
    /// samples for that class.
    pub fn scan<P: AsRef<Path>>(root_dir: P, categories: Option<&[&str]>) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        let categories: Vec<String> = categories
            .unwrap_or(&CATEGORIES)
            .iter()
            .map(|s| s.to_string())
            .collect();

        info!("Scanning ASL dataset at {:?}", root_dir);

        if !root_dir.exists() {
            return Err(AslError::Dataset(format!(
                "dataset directory does not exist: {}",
                root_dir.display()
            )));
        }

        let mut entries = Vec::new();
        for (label, class_name) in categories.iter().enumerate() {
            let class_dir = root_dir.join(class_name);
            if !class_dir.is_dir() {
                warn!("Category directory missing: {:?}", class_dir);
                continue;
            }

            let before = entries.len();
            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();
                if has_image_extension(&path) {
                    entries.push(ImageEntry {
                        path,
                        label,
                        class_name: class_name.clone(),
                    });
                }
            }

            debug!(
                "Category '{}' (label {}): {} files",
                class_name,
                label,
                entries.len() - before
            );
        }

        info!("Found {} image files", entries.len());

        Ok(Self {
            root_dir,
            entries,
            categories,
            image_size: IMAGE_SIZE,
        })
    }

    /// Number of discovered files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files were discovered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of classes in the injected category list
    pub fn num_classes(&self) -> usize {
        self.categories.len()
    }

    /// Shuffle the entries in place with a seeded RNG.
    ///
    /// Each entry carries its own label, so features and labels permute
    /// together by construction.
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.entries.shuffle(&mut rng);
    }

    /// Decode every entry into a sample, in entry order.
    ///
    /// Files that fail to decode are returned in the second element rather
    /// than silently dropped; the count is also logged as a warning.
    pub fn load_items(&self, mode: ColorMode) -> (Vec<AslItem>, Vec<SkippedFile>) {
        let mut items = Vec::with_capacity(self.entries.len());
        let mut skipped = Vec::new();

        for entry in &self.entries {
            match load_image(&entry.path, self.image_size, mode) {
                Ok(pixels) => items.push(AslItem {
                    pixels,
                    label: entry.label,
                    path: entry.path.to_string_lossy().to_string(),
                }),
                Err(e) => skipped.push(SkippedFile {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if !skipped.is_empty() {
            warn!(
                "Skipped {} of {} files during decoding",
                skipped.len(),
                self.entries.len()
            );
        }

        (items, skipped)
    }

    /// Per-class sample counts and totals
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for entry in &self.entries {
            class_counts[entry.label] += 1;
        }

        DatasetStats {
            total_samples: self.entries.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names: self.categories.clone(),
        }
    }
}

/// Statistics about a scanned dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Print statistics to the console
    pub fn print(&self) {
        println!("\nDataset statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        for (idx, name) in self.class_names.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = if self.total_samples > 0 {
                (count as f32 / self.total_samples as f32 * 40.0) as usize
            } else {
                0
            };
            let bar: String = "█".repeat(bar_len);
            println!("    {:3}. {:10} {:6} {}", idx, name, count, bar);
        }
    }
}

/// Decode one image file, resize it to `image_size`², and return the raw
/// channel bytes (RGB interleaved or single-channel grayscale).
pub fn load_image(path: &Path, image_size: usize, mode: ColorMode) -> Result<Vec<u8>> {
    let img = ImageReader::open(path)
        .map_err(|e| AslError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .decode()
        .map_err(|e| AslError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    let resized = img.resize_exact(image_size as u32, image_size as u32, FilterType::Triangle);

    let pixels = match mode {
        ColorMode::Rgb => resized.to_rgb8().into_raw(),
        ColorMode::Grayscale => resized.to_luma8().into_raw(),
    };

    Ok(pixels)
}

/// List the image files of a flat directory (no subfolders), sorted by name.
///
/// Used for the external test directory whose filenames carry the labels.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AslError::Dataset(format!(
            "test directory does not exist: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    files.sort();

    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn write_test_image(path: &Path, shade: u8) {
        let img = ImageBuffer::from_pixel(8, 8, Rgb([shade, shade / 2, 255 - shade]));
        img.save(path).unwrap();
    }

    fn make_corpus(name: &str, categories: &[&str]) -> std::path::PathBuf {
        let root = std::env::temp_dir().join(format!("asl_loader_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        for (i, cat) in categories.iter().enumerate() {
            let dir = root.join(cat);
            std::fs::create_dir_all(&dir).unwrap();
            for j in 0..3 {
                write_test_image(&dir.join(format!("{cat}{j}.png")), (i * 50 + j) as u8);
            }
        }
        root
    }

    #[test]
    fn test_scan_assigns_labels_by_category_position() {
        let categories = ["A", "B", "C"];
        let root = make_corpus("labels", &categories);

        let dataset = AslDataset::scan(&root, Some(&categories)).unwrap();
        assert_eq!(dataset.len(), 9);
        assert_eq!(dataset.num_classes(), 3);

        for entry in &dataset.entries {
            assert!(entry.label < 3);
            assert_eq!(categories[entry.label], entry.class_name);
            // The file lives under the directory matching its label
            assert!(entry.path.starts_with(root.join(&entry.class_name)));
        }

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let result = AslDataset::scan("/nonexistent/asl/corpus", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_items_counts_match() {
        let categories = ["A", "B"];
        let root = make_corpus("load", &categories);

        let mut dataset = AslDataset::scan(&root, Some(&categories)).unwrap();
        dataset.shuffle(42);

        let (items, skipped) = dataset.load_items(ColorMode::Rgb);
        assert_eq!(items.len(), 6);
        assert!(skipped.is_empty());

        for item in &items {
            assert_eq!(item.pixels.len(), 3 * IMAGE_SIZE * IMAGE_SIZE);
            assert!(item.label < 2);
        }

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_items_accumulates_decode_failures() {
        let categories = ["A"];
        let root = make_corpus("skip", &categories);
        // A file with an image extension but garbage content
        std::fs::write(root.join("A").join("broken.jpg"), b"not an image").unwrap();

        let dataset = AslDataset::scan(&root, Some(&categories)).unwrap();
        assert_eq!(dataset.len(), 4);

        let (items, skipped) = dataset.load_items(ColorMode::Grayscale);
        assert_eq!(items.len(), 3);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].path.ends_with("broken.jpg"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_shuffle_is_seeded_and_preserves_pairs() {
        let categories = ["A", "B", "C"];
        let root = make_corpus("shuffle", &categories);

        let mut first = AslDataset::scan(&root, Some(&categories)).unwrap();
        let mut second = first.clone();
        first.shuffle(7);
        second.shuffle(7);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.entries.iter().zip(second.entries.iter()) {
            assert_eq!(a.path, b.path);
            assert_eq!(a.label, b.label);
        }

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_stats_class_counts() {
        let categories = ["A", "B"];
        let root = make_corpus("stats", &categories);

        let dataset = AslDataset::scan(&root, Some(&categories)).unwrap();
        let stats = dataset.stats();

        assert_eq!(stats.total_samples, 6);
        assert_eq!(stats.class_counts, vec![3, 3]);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
