// Classification metrics — accuracy, weighted precision/recall/F1,
// confusion matrix, and confidence statistics.
//
// The weighted averages follow scikit-learn's `average='weighted'`
// semantics: per-label scores are computed over the sorted union of true
// and predicted labels (0.0 when a denominator is zero) and averaged
// weighted by true-label support. Labels that never appear in the truth
// have zero support and contribute nothing.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Round to `places` decimal places. Metric values are rounded to 4,
/// classification confidences to 5.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Fraction of predictions matching the true label, rounded to 4 d.p.
pub fn accuracy(y_true: &[String], y_pred: &[String]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    round_to(correct as f64 / y_true.len() as f64, 4)
}

/// Precision, recall, and F1, weighted by true-label support.
pub fn precision_recall_f1_weighted(y_true: &[String], y_pred: &[String]) -> (f64, f64, f64) {
    let labels = label_union(y_true, y_pred);
    if y_true.is_empty() || labels.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut true_counts: HashMap<&str, u64> = HashMap::new();
    let mut pred_counts: HashMap<&str, u64> = HashMap::new();
    let mut tp_counts: HashMap<&str, u64> = HashMap::new();

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        *true_counts.entry(t.as_str()).or_insert(0) += 1;
        *pred_counts.entry(p.as_str()).or_insert(0) += 1;
        if t == p {
            *tp_counts.entry(t.as_str()).or_insert(0) += 1;
        }
    }

    let total_support = y_true.len() as f64;
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;

    for label in &labels {
        let support = *true_counts.get(label.as_str()).unwrap_or(&0) as f64;
        if support == 0.0 {
            continue;
        }

        let tp = *tp_counts.get(label.as_str()).unwrap_or(&0) as f64;
        let predicted = *pred_counts.get(label.as_str()).unwrap_or(&0) as f64;

        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let recall = tp / support;
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        precision_sum += precision * support;
        recall_sum += recall * support;
        f1_sum += f1 * support;
    }

    (
        round_to(precision_sum / total_support, 4),
        round_to(recall_sum / total_support, 4),
        round_to(f1_sum / total_support, 4),
    )
}

/// Confusion matrix data: rows are true labels, columns are predicted,
/// both over the sorted union of observed labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrixData {
    pub confusion_matrix: Vec<Vec<u64>>,
    pub categories: Vec<String>,
}

pub fn confusion_matrix(y_true: &[String], y_pred: &[String]) -> ConfusionMatrixData {
    let categories = label_union(y_true, y_pred);
    let index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    let mut matrix = vec![vec![0u64; categories.len()]; categories.len()];
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        matrix[index[t.as_str()]][index[p.as_str()]] += 1;
    }

    ConfusionMatrixData {
        confusion_matrix: matrix,
        categories,
    }
}

/// Summary statistics over classification confidences, all 4 d.p.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub mean_confidence: f64,
    pub median_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
}

pub fn confidence_stats(confidences: &[f64]) -> ConfidenceStats {
    if confidences.is_empty() {
        return ConfidenceStats {
            mean_confidence: 0.0,
            median_confidence: 0.0,
            min_confidence: 0.0,
            max_confidence: 0.0,
        };
    }

    let mut sorted = confidences.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let mean = sorted.iter().sum::<f64>() / n as f64;

    ConfidenceStats {
        mean_confidence: round_to(mean, 4),
        median_confidence: round_to(median, 4),
        min_confidence: round_to(sorted[0], 4),
        max_confidence: round_to(sorted[n - 1], 4),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Everything the report needs about one model's classification quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub basic_metrics: BasicMetrics,
    pub detailed_metrics: DetailedMetrics,
    pub confidence_stats: ConfidenceStats,
    pub confusion_matrix_data: ConfusionMatrixData,
}

/// Compute every metric in one pass over aligned truth/prediction/confidence
/// slices. The slices come from the same classification records, so they are
/// always the same length.
pub fn evaluate(y_true: &[String], y_pred: &[String], confidences: &[f64]) -> ModelMetrics {
    let (precision, recall, f1_score) = precision_recall_f1_weighted(y_true, y_pred);
    ModelMetrics {
        basic_metrics: BasicMetrics {
            accuracy: accuracy(y_true, y_pred),
        },
        detailed_metrics: DetailedMetrics {
            precision,
            recall,
            f1_score,
        },
        confidence_stats: confidence_stats(confidences),
        confusion_matrix_data: confusion_matrix(y_true, y_pred),
    }
}

/// Sorted union of true and predicted labels.
fn label_union(y_true: &[String], y_pred: &[String]) -> Vec<String> {
    let set: BTreeSet<&String> = y_true.iter().chain(y_pred.iter()).collect();
    set.into_iter().cloned().collect()
}
