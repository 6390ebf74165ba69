// Hand-built SVG charts.
//
// The charts are plain SVG strings written under the image dir and
// referenced from the HTML report by relative path, so the report needs no
// scripts and no external assets. Per-model charts go to
// `<images>/<model>/`, cross-model charts to `<images>/comparisons/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::hub::short_model_name;
use crate::metrics::ConfusionMatrixData;
use crate::pipeline::ModelEvaluation;

/// Color cycle shared by the comparison charts.
const PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc949",
];

/// Number of histogram bins over the [0, 1] confidence range.
const HISTOGRAM_BINS: usize = 20;

/// Relative (report-facing) paths of one model's charts.
#[derive(Debug, Clone)]
pub struct ModelCharts {
    pub confusion_matrix: String,
    pub confidence_histogram: String,
}

/// Relative paths of the cross-model comparison charts.
#[derive(Debug, Clone)]
pub struct ComparisonCharts {
    pub accuracy: String,
    pub metrics: String,
    pub confidence: String,
}

/// Writes chart files under the image dir and hands back paths relative to
/// the report file (the image dir is expected to sit next to the report,
/// as the default config lays it out).
pub struct ChartGenerator {
    image_dir: PathBuf,
    web_prefix: String,
}

impl ChartGenerator {
    pub fn new(image_dir: &Path) -> Self {
        let web_prefix = image_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "images".to_string());
        Self {
            image_dir: image_dir.to_path_buf(),
            web_prefix,
        }
    }

    /// Render and save the per-model charts.
    pub fn generate_model_charts(&self, evaluation: &ModelEvaluation) -> Result<ModelCharts> {
        let model = short_model_name(&evaluation.model);
        let confidences: Vec<f64> = evaluation
            .classifications
            .iter()
            .map(|c| c.confidence)
            .collect();

        let cm_svg = confusion_matrix_svg(
            &evaluation.metrics.confusion_matrix_data,
            &format!("Confusion Matrix - {model}"),
        );
        let hist_svg = histogram_svg(
            &[(model.to_string(), confidences)],
            &format!("Confidence Distribution - {model}"),
        );

        Ok(ModelCharts {
            confusion_matrix: self.save(model, "confusion_matrix", &cm_svg)?,
            confidence_histogram: self.save(model, "confidence_histogram", &hist_svg)?,
        })
    }

    /// Render and save the cross-model comparison charts.
    pub fn generate_comparison_charts(
        &self,
        evaluations: &[ModelEvaluation],
    ) -> Result<ComparisonCharts> {
        let models: Vec<String> = evaluations
            .iter()
            .map(|e| short_model_name(&e.model).to_string())
            .collect();

        let accuracies: Vec<f64> = evaluations
            .iter()
            .map(|e| e.metrics.basic_metrics.accuracy)
            .collect();
        let accuracy_svg = bar_chart_svg("Model Accuracy Comparison", &models, &accuracies);

        let series: [(&str, fn(&ModelEvaluation) -> f64); 3] = [
            ("Precision", |e: &ModelEvaluation| e.metrics.detailed_metrics.precision),
            ("Recall", |e: &ModelEvaluation| e.metrics.detailed_metrics.recall),
            ("F1 Score", |e: &ModelEvaluation| e.metrics.detailed_metrics.f1_score),
        ];
        let grouped: Vec<(String, Vec<f64>)> = series
            .iter()
            .map(|(name, get)| (name.to_string(), evaluations.iter().map(get).collect()))
            .collect();
        let metrics_svg =
            grouped_bar_svg("Model Performance Metrics Comparison", &models, &grouped);

        let confidence_series: Vec<(String, Vec<f64>)> = evaluations
            .iter()
            .map(|e| {
                (
                    short_model_name(&e.model).to_string(),
                    e.classifications.iter().map(|c| c.confidence).collect(),
                )
            })
            .collect();
        let confidence_svg =
            histogram_svg(&confidence_series, "Confidence Distribution Comparison");

        Ok(ComparisonCharts {
            accuracy: self.save("comparisons", "comparison_accuracy", &accuracy_svg)?,
            metrics: self.save("comparisons", "comparison_metrics", &metrics_svg)?,
            confidence: self.save("comparisons", "comparison_confidence", &confidence_svg)?,
        })
    }

    /// Write one chart file and return its report-relative path.
    fn save(&self, subdir: &str, name: &str, svg: &str) -> Result<String> {
        let dir = self.image_dir.join(subdir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create chart directory: {}", dir.display()))?;

        let filename = format!("{name}.svg");
        let path = dir.join(&filename);
        fs::write(&path, svg)
            .with_context(|| format!("Failed to write chart: {}", path.display()))?;

        debug!(chart = name, path = %path.display(), "Saved chart");
        Ok(format!("{}/{subdir}/{filename}", self.web_prefix))
    }
}

/// Escape text content for XML.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Linear interpolation from white to the palette blue, for heatmap cells.
fn heat_color(value: f64) -> String {
    let t = value.clamp(0.0, 1.0);
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    // #4e79a7
    format!("rgb({},{},{})", lerp(255.0, 78.0), lerp(255.0, 121.0), lerp(255.0, 167.0))
}

/// Confusion-matrix heatmap: true labels down the side, predicted across
/// the top, cell shading by count relative to the matrix maximum.
pub fn confusion_matrix_svg(data: &ConfusionMatrixData, title: &str) -> String {
    let n = data.categories.len();
    let cell = 44.0;
    let left = 180.0;
    let top = 90.0;
    let width = left + n as f64 * cell + 40.0;
    let height = top + n as f64 * cell + 40.0;

    let max_count = data
        .confusion_matrix
        .iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut out = svg_open(width, height, title);

    for (i, row) in data.confusion_matrix.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let x = left + j as f64 * cell;
            let y = top + i as f64 * cell;
            let fill = heat_color(count as f64 / max_count);
            out.push_str(&format!(
                "<rect x='{x:.1}' y='{y:.1}' width='{cell}' height='{cell}' \
                 fill='{fill}' stroke='#ccc'/>\n"
            ));
            // Dark cells get white text
            let text_fill = if count as f64 / max_count > 0.6 { "#fff" } else { "#333" };
            out.push_str(&format!(
                "<text x='{:.1}' y='{:.1}' font-size='13' fill='{text_fill}' \
                 text-anchor='middle' dominant-baseline='middle'>{count}</text>\n",
                x + cell / 2.0,
                y + cell / 2.0
            ));
        }
    }

    for (i, category) in data.categories.iter().enumerate() {
        let label = xml_escape(category);
        // Row label (true)
        out.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='end' \
             dominant-baseline='middle'>{label}</text>\n",
            left - 8.0,
            top + i as f64 * cell + cell / 2.0
        ));
        // Column label (predicted), rotated above the grid
        let cx = left + i as f64 * cell + cell / 2.0;
        let cy = top - 8.0;
        out.push_str(&format!(
            "<text x='{cx:.1}' y='{cy:.1}' font-size='12' text-anchor='start' \
             transform='rotate(-40 {cx:.1} {cy:.1})'>{label}</text>\n"
        ));
    }

    out.push_str(&format!(
        "<text x='14' y='{:.1}' font-size='12' transform='rotate(-90 14 {:.1})' \
         text-anchor='middle'>True label</text>\n",
        top + n as f64 * cell / 2.0,
        top + n as f64 * cell / 2.0
    ));
    out.push_str(&format!(
        "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='middle'>Predicted label</text>\n",
        left + n as f64 * cell / 2.0,
        height - 12.0
    ));

    out.push_str("</svg>\n");
    out
}

/// Single-series bar chart with a 0..1 value axis and value labels on top
/// of each bar.
pub fn bar_chart_svg(title: &str, labels: &[String], values: &[f64]) -> String {
    let width = 640.0;
    let height = 400.0;
    let left = 60.0;
    let top = 50.0;
    let bottom = 90.0;
    let plot_w = width - left - 30.0;
    let plot_h = height - top - bottom;

    let mut out = svg_open(width, height, title);
    out.push_str(&axis_lines(left, top, plot_w, plot_h));

    let n = labels.len().max(1);
    let slot = plot_w / n as f64;
    let bar_w = slot * 0.6;

    for (i, (label, &value)) in labels.iter().zip(values.iter()).enumerate() {
        let v = value.clamp(0.0, 1.0);
        let x = left + i as f64 * slot + (slot - bar_w) / 2.0;
        let bar_h = v * plot_h;
        let y = top + plot_h - bar_h;

        out.push_str(&format!(
            "<rect x='{x:.1}' y='{y:.1}' width='{bar_w:.1}' height='{bar_h:.1}' fill='{}'/>\n",
            PALETTE[0]
        ));
        out.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='middle'>{:.1}%</text>\n",
            x + bar_w / 2.0,
            y - 5.0,
            value * 100.0
        ));
        out.push_str(&rotated_tick_label(
            x + bar_w / 2.0,
            top + plot_h + 14.0,
            &xml_escape(label),
        ));
    }

    out.push_str("</svg>\n");
    out
}

/// Grouped bar chart: one group per model, one bar per metric series.
pub fn grouped_bar_svg(
    title: &str,
    labels: &[String],
    series: &[(String, Vec<f64>)],
) -> String {
    let width = 720.0;
    let height = 420.0;
    let left = 60.0;
    let top = 50.0;
    let bottom = 100.0;
    let plot_w = width - left - 30.0;
    let plot_h = height - top - bottom;

    let mut out = svg_open(width, height, title);
    out.push_str(&axis_lines(left, top, plot_w, plot_h));

    let groups = labels.len().max(1);
    let slot = plot_w / groups as f64;
    let bar_w = (slot * 0.8) / series.len().max(1) as f64;

    for (s, (_, values)) in series.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        for (i, &value) in values.iter().enumerate() {
            let v = value.clamp(0.0, 1.0);
            let x = left + i as f64 * slot + slot * 0.1 + s as f64 * bar_w;
            let bar_h = v * plot_h;
            let y = top + plot_h - bar_h;
            out.push_str(&format!(
                "<rect x='{x:.1}' y='{y:.1}' width='{bar_w:.1}' height='{bar_h:.1}' fill='{color}'/>\n"
            ));
        }
    }

    for (i, label) in labels.iter().enumerate() {
        out.push_str(&rotated_tick_label(
            left + i as f64 * slot + slot / 2.0,
            top + plot_h + 14.0,
            &xml_escape(label),
        ));
    }

    // Legend in the top-right corner
    for (s, (name, _)) in series.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        let y = top + s as f64 * 18.0;
        out.push_str(&format!(
            "<rect x='{:.1}' y='{y:.1}' width='12' height='12' fill='{color}'/>\n",
            width - 130.0
        ));
        out.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='12'>{}</text>\n",
            width - 112.0,
            y + 10.0,
            xml_escape(name)
        ));
    }

    out.push_str("</svg>\n");
    out
}

/// Histogram over the [0, 1] confidence range. Multiple series overlay with
/// partial opacity, so the same function draws both the per-model chart and
/// the cross-model comparison.
pub fn histogram_svg(series: &[(String, Vec<f64>)], title: &str) -> String {
    let width = 640.0;
    let height = 380.0;
    let left = 60.0;
    let top = 50.0;
    let bottom = 70.0;
    let plot_w = width - left - 30.0;
    let plot_h = height - top - bottom;

    let binned: Vec<(String, Vec<u64>)> = series
        .iter()
        .map(|(name, values)| (name.clone(), bin_confidences(values)))
        .collect();

    let max_count = binned
        .iter()
        .flat_map(|(_, bins)| bins.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut out = svg_open(width, height, title);
    out.push_str(&axis_lines(left, top, plot_w, plot_h));

    let bin_w = plot_w / HISTOGRAM_BINS as f64;
    let opacity = if binned.len() > 1 { 0.55 } else { 0.9 };

    for (s, (_, bins)) in binned.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        for (b, &count) in bins.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let bar_h = count as f64 / max_count * plot_h;
            let x = left + b as f64 * bin_w;
            let y = top + plot_h - bar_h;
            out.push_str(&format!(
                "<rect x='{x:.1}' y='{y:.1}' width='{bin_w:.1}' height='{bar_h:.1}' \
                 fill='{color}' fill-opacity='{opacity}' stroke='#555' stroke-width='0.5'/>\n"
            ));
        }
    }

    // X axis ticks at 0.0, 0.25, 0.5, 0.75, 1.0
    for tick in 0..=4 {
        let frac = tick as f64 / 4.0;
        out.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='11' text-anchor='middle'>{frac:.2}</text>\n",
            left + frac * plot_w,
            top + plot_h + 16.0
        ));
    }
    out.push_str(&format!(
        "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='middle'>Confidence score</text>\n",
        left + plot_w / 2.0,
        height - 14.0
    ));

    // Legend only when comparing series
    if binned.len() > 1 {
        for (s, (name, _)) in binned.iter().enumerate() {
            let color = PALETTE[s % PALETTE.len()];
            let y = top + s as f64 * 18.0;
            out.push_str(&format!(
                "<rect x='{:.1}' y='{y:.1}' width='12' height='12' fill='{color}' fill-opacity='{opacity}'/>\n",
                left + 10.0
            ));
            out.push_str(&format!(
                "<text x='{:.1}' y='{:.1}' font-size='12'>{}</text>\n",
                left + 28.0,
                y + 10.0,
                xml_escape(name)
            ));
        }
    }

    out.push_str("</svg>\n");
    out
}

/// Count values into fixed-width bins over [0, 1]. Values at exactly 1.0
/// land in the last bin.
fn bin_confidences(values: &[f64]) -> Vec<u64> {
    let mut bins = vec![0u64; HISTOGRAM_BINS];
    for &v in values {
        let idx = ((v.clamp(0.0, 1.0)) * HISTOGRAM_BINS as f64) as usize;
        bins[idx.min(HISTOGRAM_BINS - 1)] += 1;
    }
    bins
}

fn svg_open(width: f64, height: f64, title: &str) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width:.0}' height='{height:.0}' \
         viewBox='0 0 {width:.0} {height:.0}' font-family='sans-serif'>\n\
         <rect width='100%' height='100%' fill='white'/>\n\
         <text x='{:.1}' y='26' font-size='16' font-weight='bold' text-anchor='middle'>{}</text>\n",
        width / 2.0,
        xml_escape(title)
    )
}

fn axis_lines(left: f64, top: f64, plot_w: f64, plot_h: f64) -> String {
    format!(
        "<line x1='{left:.1}' y1='{top:.1}' x2='{left:.1}' y2='{:.1}' stroke='#333'/>\n\
         <line x1='{left:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='#333'/>\n",
        top + plot_h,
        top + plot_h,
        left + plot_w,
        top + plot_h
    )
}

fn rotated_tick_label(x: f64, y: f64, label: &str) -> String {
    format!(
        "<text x='{x:.1}' y='{y:.1}' font-size='11' text-anchor='end' \
         transform='rotate(-30 {x:.1} {y:.1})'>{label}</text>\n"
    )
}
