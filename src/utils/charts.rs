//! SVG chart rendering for training and evaluation artifacts
//!
//! Generates the diagnostic images as plain SVG files: accuracy/loss curves,
//! the confusion matrix heatmap, the architecture diagram, and the annotated
//! test-prediction grid.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::metrics::ConfusionMatrix;
use crate::model::LayerSummary;

/// Chart styling constants
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;

const COLOR_PRIMARY: &str = "#3498db";
const COLOR_SECONDARY: &str = "#e67e22";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// A data point for a line chart
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// A data series for line charts
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<DataPoint>,
    pub color: String,
}

impl DataSeries {
    /// Build a series from per-epoch values, numbering epochs from 1
    pub fn from_epochs(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &y)| DataPoint {
                    x: (i + 1) as f64,
                    y,
                })
                .collect(),
            color: color.to_string(),
        }
    }
}

/// Default series colors: train then validation
pub fn series_colors() -> (&'static str, &'static str) {
    (COLOR_PRIMARY, COLOR_SECONDARY)
}

/// Generate a line chart SVG.
///
/// `y_range` fixes the value axis (e.g. `(0.0, 1.0)` for accuracy); when
/// `None` the range is fit to the data.
pub fn generate_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    y_range: Option<(f64, f64)>,
    output_path: &Path,
) -> std::io::Result<()> {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let (x_min, x_max, data_y_min, data_y_max) = find_ranges(series);
    let (y_min, y_max) = y_range.unwrap_or_else(|| {
        let pad = ((data_y_max - data_y_min).abs()).max(1e-6) * 0.1;
        ((data_y_min - pad).min(0.0), data_y_max + pad)
    });
    let x_span = (x_max - x_min).max(1e-9);
    let y_span = (y_max - y_min).max(1e-9);

    let mut svg = String::new();
    svg.push_str(&svg_header(CHART_WIDTH, CHART_HEIGHT));
    svg.push_str(&svg_title(title, CHART_WIDTH / 2.0));

    // Grid lines and value labels
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * y_span;

        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_width,
            y,
            COLOR_GRID
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.2}</text>"#,
            MARGIN_LEFT - 10.0,
            y + 4.0,
            COLOR_TEXT,
            value
        ));
    }

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        MARGIN_LEFT + plot_width,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        MARGIN_TOP + plot_height,
        COLOR_AXIS
    ));

    // Axis labels
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        COLOR_TEXT,
        escape_xml(x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {})">{}</text>"#,
        CHART_HEIGHT / 2.0,
        COLOR_TEXT,
        CHART_HEIGHT / 2.0,
        escape_xml(y_label)
    ));

    // Series lines and points
    for series_data in series {
        if series_data.points.is_empty() {
            continue;
        }

        let mut path = String::new();
        for (i, point) in series_data.points.iter().enumerate() {
            let x = MARGIN_LEFT + ((point.x - x_min) / x_span) * plot_width;
            let y = MARGIN_TOP + plot_height - ((point.y - y_min) / y_span) * plot_height;
            if i == 0 {
                path.push_str(&format!("M {} {}", x, y));
            } else {
                path.push_str(&format!(" L {} {}", x, y));
            }
        }
        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path, series_data.color
        ));

        for point in &series_data.points {
            let x = MARGIN_LEFT + ((point.x - x_min) / x_span) * plot_width;
            let y = MARGIN_TOP + plot_height - ((point.y - y_min) / y_span) * plot_height;
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="4" fill="{}" stroke="white" stroke-width="2"/>"#,
                x, y, series_data.color
            ));
        }
    }

    // Epoch tick labels from the first series
    if let Some(first) = series.first() {
        for point in &first.points {
            let x = MARGIN_LEFT + ((point.x - x_min) / x_span) * plot_width;
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{:.0}</text>"#,
                x,
                MARGIN_TOP + plot_height + 20.0,
                COLOR_TEXT,
                point.x
            ));
        }
    }

    // Legend
    let mut legend_y = MARGIN_TOP + 10.0;
    for series_data in series {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            CHART_WIDTH - MARGIN_RIGHT - 120.0,
            legend_y,
            series_data.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            CHART_WIDTH - MARGIN_RIGHT - 100.0,
            legend_y + 12.0,
            COLOR_TEXT,
            escape_xml(&series_data.name)
        ));
        legend_y += 25.0;
    }

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

/// Render a confusion matrix as a heatmap with per-cell counts.
///
/// With `normalize` set, cells show row-normalized fractions instead of raw
/// counts; color intensity always follows the displayed value.
pub fn generate_confusion_heatmap(
    title: &str,
    cm: &ConfusionMatrix,
    class_names: &[&str],
    normalize: bool,
    output_path: &Path,
) -> std::io::Result<()> {
    let n = cm.num_classes;
    let cell: f64 = if n <= 10 { 48.0 } else { 26.0 };
    let label_space = 70.0;
    let width = label_space + n as f64 * cell + 40.0;
    let height = label_space + n as f64 * cell + 80.0;

    let normalized = cm.normalize_rows();
    let max_count = cm.matrix.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut svg = String::new();
    svg.push_str(&svg_header(width, height));
    svg.push_str(&svg_title(title, width / 2.0));

    for row in 0..n {
        for col in 0..n {
            let intensity = if normalize {
                normalized[row][col]
            } else {
                cm.get(row, col) as f64 / max_count
            };

            let x = label_space + col as f64 * cell;
            let y = label_space + row as f64 * cell;

            // White-to-blue ramp
            let r = (255.0 - intensity * 203.0) as u8;
            let g = (255.0 - intensity * 139.0) as u8;
            let b = (255.0 - intensity * 36.0) as u8;

            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="rgb({},{},{})" stroke="{}" stroke-width="0.5"/>"#,
                x, y, cell, cell, r, g, b, COLOR_GRID
            ));

            let text = if normalize {
                format!("{:.2}", normalized[row][col])
            } else {
                format!("{}", cm.get(row, col))
            };
            let text_color = if intensity > 0.5 { "white" } else { COLOR_TEXT };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="{}" fill="{}">{}</text>"#,
                x + cell / 2.0,
                y + cell / 2.0 + 3.0,
                if n <= 10 { 12 } else { 8 },
                text_color,
                text
            ));
        }
    }

    // Class labels on both axes
    for (i, name) in class_names.iter().take(n).enumerate() {
        let x = label_space + i as f64 * cell + cell / 2.0;
        let y = label_space + i as f64 * cell + cell / 2.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="10" fill="{}" transform="rotate(-45 {} {})">{}</text>"#,
            x,
            label_space - 8.0,
            COLOR_TEXT,
            x,
            label_space - 8.0,
            escape_xml(name)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="10" fill="{}">{}</text>"#,
            label_space - 8.0,
            y + 3.0,
            COLOR_TEXT,
            escape_xml(name)
        ));
    }

    // Axis titles
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" fill="{}">Predicted label</text>"#,
        label_space + n as f64 * cell / 2.0,
        height - 30.0,
        COLOR_TEXT
    ));
    svg.push_str(&format!(
        r#"<text x="16" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" fill="{}" transform="rotate(-90 16 {})">True label</text>"#,
        label_space + n as f64 * cell / 2.0,
        COLOR_TEXT,
        label_space + n as f64 * cell / 2.0
    ));

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

/// A thumbnail cell of the prediction grid
#[derive(Debug, Clone)]
pub struct GridCell {
    /// PNG-encoded thumbnail
    pub png: Vec<u8>,
    /// First caption line (predicted label)
    pub title: String,
    /// Second caption line (source filename)
    pub subtitle: String,
}

/// Render the test predictions as a grid of thumbnails with captions
pub fn generate_prediction_grid(
    title: &str,
    cells: &[GridCell],
    output_path: &Path,
) -> std::io::Result<()> {
    const COLUMNS: usize = 6;
    const THUMB: f64 = 96.0;
    const CAPTION: f64 = 34.0;
    const GAP: f64 = 14.0;

    let columns = COLUMNS.min(cells.len().max(1));
    let rows = cells.len().div_ceil(columns).max(1);
    let width = GAP + columns as f64 * (THUMB + GAP);
    let height = MARGIN_TOP + rows as f64 * (THUMB + CAPTION + GAP) + GAP;

    let mut svg = String::new();
    svg.push_str(&svg_header(width, height));
    svg.push_str(&svg_title(title, width / 2.0));

    for (i, cell) in cells.iter().enumerate() {
        let col = i % columns;
        let row = i / columns;
        let x = GAP + col as f64 * (THUMB + GAP);
        let y = MARGIN_TOP + row as f64 * (THUMB + CAPTION + GAP);

        svg.push_str(&format!(
            r#"<image x="{}" y="{}" width="{}" height="{}" href="data:image/png;base64,{}"/>"#,
            x,
            y,
            THUMB,
            THUMB,
            BASE64.encode(&cell.png)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" font-weight="bold" fill="{}">{}</text>"#,
            x + THUMB / 2.0,
            y + THUMB + 14.0,
            COLOR_TEXT,
            escape_xml(&cell.title)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="9" fill="{}">{}</text>"#,
            x + THUMB / 2.0,
            y + THUMB + 27.0,
            COLOR_TEXT,
            escape_xml(&cell.subtitle)
        ));
    }

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

/// Render a layer-by-layer architecture diagram
pub fn generate_architecture_diagram(
    title: &str,
    layers: &[LayerSummary],
    output_path: &Path,
) -> std::io::Result<()> {
    const BOX_WIDTH: f64 = 360.0;
    const BOX_HEIGHT: f64 = 40.0;
    const BOX_GAP: f64 = 18.0;

    let width = BOX_WIDTH + 160.0;
    let height = MARGIN_TOP + layers.len() as f64 * (BOX_HEIGHT + BOX_GAP) + 40.0;
    let x = (width - BOX_WIDTH) / 2.0;

    let mut svg = String::new();
    svg.push_str(&svg_header(width, height));
    svg.push_str(&svg_title(title, width / 2.0));

    for (i, layer) in layers.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * (BOX_HEIGHT + BOX_GAP);

        svg.push_str(&format!(
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#eaf2fb" stroke="{}" stroke-width="1.5" rx="6"/>"##,
            x, y, BOX_WIDTH, BOX_HEIGHT, COLOR_PRIMARY
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="13" font-weight="bold" fill="{}">{}</text>"#,
            x + 12.0,
            y + 17.0,
            COLOR_TEXT,
            escape_xml(&layer.name)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="11" fill="{}">out: {}   params: {}</text>"#,
            x + 12.0,
            y + 32.0,
            COLOR_TEXT,
            escape_xml(&layer.output_shape),
            layer.params
        ));

        if i + 1 < layers.len() {
            let ax = x + BOX_WIDTH / 2.0;
            svg.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1.5"/>"#,
                ax,
                y + BOX_HEIGHT,
                ax,
                y + BOX_HEIGHT + BOX_GAP,
                COLOR_AXIS
            ));
            svg.push_str(&format!(
                r#"<path d="M {} {} l -4 -6 l 8 0 z" fill="{}"/>"#,
                ax,
                y + BOX_HEIGHT + BOX_GAP,
                COLOR_AXIS
            ));
        }
    }

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

fn svg_header(width: f64, height: f64) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            r#"<rect width="{w}" height="{h}" fill="white"/>"#
        ),
        w = width,
        h = height
    )
}

fn svg_title(title: &str, center_x: f64) -> String {
    format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        center_x,
        COLOR_TEXT,
        escape_xml(title)
    )
}

fn find_ranges(series: &[DataSeries]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for p in &s.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }

    if !x_min.is_finite() {
        return (0.0, 1.0, 0.0, 1.0);
    }
    (x_min, x_max, y_min, y_max)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("asl_chart_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_line_chart_generation() {
        let series = vec![
            DataSeries::from_epochs("train", &[0.3, 0.6, 0.8], COLOR_PRIMARY),
            DataSeries::from_epochs("validation", &[0.25, 0.5, 0.7], COLOR_SECONDARY),
        ];

        let path = temp_path("line.svg");
        generate_line_chart(
            "Model accuracy",
            "Epoch",
            "Accuracy",
            &series,
            Some((0.0, 1.0)),
            &path,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("validation"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_heatmap_generation() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 1], &[0, 0, 1, 1], 2);

        let path = temp_path("heatmap.svg");
        generate_confusion_heatmap("Confusion matrix", &cm, &["A", "B"], true, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("True label"));
        assert!(content.contains("0.50"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_prediction_grid_generation() {
        // A tiny valid PNG via the image crate
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10]));
        let mut png = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .unwrap();

        let cells = vec![GridCell {
            png,
            title: "prediction = A".to_string(),
            subtitle: "A_test.jpg".to_string(),
        }];

        let path = temp_path("grid.svg");
        generate_prediction_grid("Test predictions", &cells, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("data:image/png;base64,"));
        assert!(content.contains("A_test.jpg"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_architecture_diagram_generation() {
        let layers = vec![
            LayerSummary {
                name: "dense_4096_a".to_string(),
                output_shape: "4096".to_string(),
                params: 4096 * 4096 + 4096,
            },
            LayerSummary {
                name: "dense_29".to_string(),
                output_shape: "29".to_string(),
                params: 2000 * 29 + 29,
            },
        ];

        let path = temp_path("arch.svg");
        generate_architecture_diagram("SignDenseNet", &layers, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("dense_29"));

        std::fs::remove_file(&path).unwrap();
    }
}
