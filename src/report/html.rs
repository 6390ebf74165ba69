// HTML comparison report.
//
// Built by string concatenation into a single self-contained page: a
// cross-model summary table, the comparison charts, and one section per
// model with its metrics, charts, and a sample of misclassified
// transactions. Charts are referenced by path relative to the report file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::dataset::TransactionSet;
use crate::hub::short_model_name;
use crate::pipeline::ModelEvaluation;

use super::svg::{ComparisonCharts, ModelCharts};
use super::truncate_chars;

/// Misclassification rows shown per model before the listing is cut off.
const MAX_ERROR_ROWS: usize = 15;

const STYLE: &str = "\
body{font-family:sans-serif;max-width:1080px;margin:24px auto;padding:0 16px;color:#222}\
h1{border-bottom:2px solid #4e79a7;padding-bottom:8px}\
h2{margin-top:40px;color:#2a4a6b}\
table{border-collapse:collapse;width:100%;margin:12px 0}\
th,td{border:1px solid #ddd;padding:6px 10px;text-align:left;font-size:14px}\
th{background:#4e79a7;color:#fff}\
tr:nth-child(even){background:#f5f7fa}\
img{max-width:100%;border:1px solid #eee;margin:8px 0}\
.charts{display:flex;flex-wrap:wrap;gap:12px}\
.charts img{flex:1 1 420px}\
.timestamp{color:#888;font-size:13px}\
.wrong{color:#b33}";

/// Render the report and write it to `output_file`.
pub fn generate_report(
    evaluations: &[ModelEvaluation],
    model_charts: &[ModelCharts],
    comparison: &ComparisonCharts,
    transactions: &TransactionSet,
    output_file: &Path,
) -> Result<PathBuf> {
    let mut page = String::with_capacity(16 * 1024);

    page.push_str("<!DOCTYPE html>\n<html lang='en'>\n<head>\n<meta charset='utf-8'>\n");
    page.push_str("<title>Model Evaluation Report</title>\n");
    page.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));

    page.push_str("<h1>Model Evaluation Report</h1>\n");
    page.push_str(&format!(
        "<p class='timestamp'>Generated {} &middot; {} models &middot; {} test transactions</p>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        evaluations.len(),
        transactions.len()
    ));

    // --- Summary table ---
    page.push_str("<h2>Performance Summary</h2>\n<table>\n<tr>");
    for header in [
        "Model",
        "Accuracy",
        "Precision",
        "Recall",
        "F1 Score",
        "Mean Confidence",
    ] {
        page.push_str(&format!("<th>{header}</th>"));
    }
    page.push_str("</tr>\n");

    for evaluation in evaluations {
        let m = &evaluation.metrics;
        page.push_str(&format!(
            "<tr><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td></tr>\n",
            html_escape(short_model_name(&evaluation.model)),
            m.basic_metrics.accuracy,
            m.detailed_metrics.precision,
            m.detailed_metrics.recall,
            m.detailed_metrics.f1_score,
            m.confidence_stats.mean_confidence,
        ));
    }
    page.push_str("</table>\n");

    // --- Comparison charts ---
    page.push_str("<h2>Model Comparison</h2>\n<div class='charts'>\n");
    for chart in [&comparison.accuracy, &comparison.metrics, &comparison.confidence] {
        page.push_str(&format!("<img src='{chart}' alt='comparison chart'>\n"));
    }
    page.push_str("</div>\n");

    // --- Per-model sections ---
    for (evaluation, charts) in evaluations.iter().zip(model_charts.iter()) {
        push_model_section(&mut page, evaluation, charts, transactions);
    }

    page.push_str("</body>\n</html>\n");

    fs::write(output_file, &page)
        .with_context(|| format!("Failed to write report to {}", output_file.display()))?;

    info!(path = %output_file.display(), "Report generated");
    Ok(output_file.to_path_buf())
}

fn push_model_section(
    page: &mut String,
    evaluation: &ModelEvaluation,
    charts: &ModelCharts,
    transactions: &TransactionSet,
) {
    let m = &evaluation.metrics;
    page.push_str(&format!(
        "<h2>{}</h2>\n",
        html_escape(short_model_name(&evaluation.model))
    ));
    page.push_str(&format!(
        "<p>Accuracy <b>{:.4}</b> &middot; F1 <b>{:.4}</b> &middot; \
         confidence mean {:.4}, median {:.4}, range {:.4}&ndash;{:.4}</p>\n",
        m.basic_metrics.accuracy,
        m.detailed_metrics.f1_score,
        m.confidence_stats.mean_confidence,
        m.confidence_stats.median_confidence,
        m.confidence_stats.min_confidence,
        m.confidence_stats.max_confidence,
    ));

    page.push_str("<div class='charts'>\n");
    page.push_str(&format!(
        "<img src='{}' alt='confusion matrix'>\n<img src='{}' alt='confidence histogram'>\n",
        charts.confusion_matrix, charts.confidence_histogram
    ));
    page.push_str("</div>\n");

    let errors = evaluation.misclassified(transactions);
    if errors.is_empty() {
        page.push_str("<p>No misclassified transactions.</p>\n");
        return;
    }

    page.push_str(&format!(
        "<h3>Misclassified transactions ({})</h3>\n",
        errors.len()
    ));
    page.push_str("<table>\n<tr><th>Transaction</th><th>Predicted</th><th>Confidence</th><th>True category</th></tr>\n");
    for (classification, true_label) in errors.iter().take(MAX_ERROR_ROWS) {
        page.push_str(&format!(
            "<tr><td>{}</td><td class='wrong'>{}</td><td>{:.5}</td><td>{}</td></tr>\n",
            html_escape(&truncate_chars(&classification.text, 80)),
            html_escape(&classification.category),
            classification.confidence,
            html_escape(true_label),
        ));
    }
    page.push_str("</table>\n");
    if errors.len() > MAX_ERROR_ROWS {
        page.push_str(&format!(
            "<p class='timestamp'>... and {} more</p>\n",
            errors.len() - MAX_ERROR_ROWS
        ));
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::dataset::Transaction;
    use crate::metrics;

    fn fixture() -> (Vec<ModelEvaluation>, TransactionSet) {
        let transactions = TransactionSet {
            records: vec![
                Transaction {
                    index: 0,
                    text: "WHOLE FOODS MKT".to_string(),
                    label: "Groceries".to_string(),
                },
                Transaction {
                    index: 1,
                    text: "UBER TRIP & TOLL".to_string(),
                    label: "Transportation".to_string(),
                },
            ],
        };
        let classifications = vec![
            Classification {
                index: 0,
                text: "WHOLE FOODS MKT".to_string(),
                category: "Groceries".to_string(),
                confidence: 0.91234,
            },
            Classification {
                index: 1,
                text: "UBER TRIP & TOLL".to_string(),
                category: "Groceries".to_string(),
                confidence: 0.5,
            },
        ];
        let y_true = transactions.labels();
        let y_pred: Vec<String> = classifications.iter().map(|c| c.category.clone()).collect();
        let evaluation = ModelEvaluation {
            model: "org/tiny".to_string(),
            classifications,
            metrics: metrics::evaluate(&y_true, &y_pred, &[0.91234, 0.5]),
        };
        (vec![evaluation], transactions)
    }

    fn charts() -> (Vec<ModelCharts>, ComparisonCharts) {
        (
            vec![ModelCharts {
                confusion_matrix: "images/tiny/confusion_matrix.svg".to_string(),
                confidence_histogram: "images/tiny/confidence_histogram.svg".to_string(),
            }],
            ComparisonCharts {
                accuracy: "images/comparisons/comparison_accuracy.svg".to_string(),
                metrics: "images/comparisons/comparison_metrics.svg".to_string(),
                confidence: "images/comparisons/comparison_confidence.svg".to_string(),
            },
        )
    }

    #[test]
    fn report_contains_summary_and_error_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        let (evaluations, transactions) = fixture();
        let (model_charts, comparison) = charts();

        generate_report(&evaluations, &model_charts, &comparison, &transactions, &path).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Model Evaluation Report"));
        assert!(html.contains("<td>tiny</td>"));
        assert!(html.contains("0.5000")); // accuracy in the summary table
        assert!(html.contains("images/tiny/confusion_matrix.svg"));
        // The misclassified UBER row appears with escaped text
        assert!(html.contains("UBER TRIP &amp; TOLL"));
        assert!(html.contains("Transportation"));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let (evaluations, transactions) = fixture();
        let (model_charts, comparison) = charts();
        let err = generate_report(
            &evaluations,
            &model_charts,
            &comparison,
            &transactions,
            Path::new("/nonexistent/report.html"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to write report"));
    }
}
