// Colored terminal output for evaluation summaries.
//
// This module handles all terminal-specific formatting: colors and tables.
// The main.rs display calls delegate here.

use colored::Colorize;

use crate::hub::short_model_name;
use crate::pipeline::ModelEvaluation;

use super::truncate_chars;

/// Display one model's metrics after its run.
pub fn display_model_summary(evaluation: &ModelEvaluation) {
    let m = &evaluation.metrics;

    println!(
        "\n{}",
        format!("=== {} ===", short_model_name(&evaluation.model)).bold()
    );
    println!("  Accuracy:        {}", colorize_score(m.basic_metrics.accuracy));
    println!("  Precision:       {:.4}", m.detailed_metrics.precision);
    println!("  Recall:          {:.4}", m.detailed_metrics.recall);
    println!("  F1 score:        {:.4}", m.detailed_metrics.f1_score);
    println!(
        "  Confidence:      mean {:.4}, median {:.4}, range {:.4}-{:.4}",
        m.confidence_stats.mean_confidence,
        m.confidence_stats.median_confidence,
        m.confidence_stats.min_confidence,
        m.confidence_stats.max_confidence,
    );

    let total = evaluation.classifications.len();
    let correct = (m.basic_metrics.accuracy * total as f64).round() as usize;
    if total > correct {
        println!("  Misclassified:   {} of {total}", total - correct);
    }
}

/// Display the cross-model ranking, best accuracy first.
pub fn display_comparison(evaluations: &[ModelEvaluation]) {
    if evaluations.is_empty() {
        println!("No models evaluated yet. Run `ledgermark run` first.");
        return;
    }

    let mut ranked: Vec<&ModelEvaluation> = evaluations.iter().collect();
    ranked.sort_by(|a, b| {
        b.metrics
            .basic_metrics
            .accuracy
            .total_cmp(&a.metrics.basic_metrics.accuracy)
    });

    println!(
        "\n{}",
        format!("=== Model Comparison ({} models) ===", ranked.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<32} {:>9}  {:>10}  {:>7}  {:>9}  {:>11}",
        "Rank".dimmed(),
        "Model".dimmed(),
        "Accuracy".dimmed(),
        "Precision".dimmed(),
        "Recall".dimmed(),
        "F1".dimmed(),
        "Mean conf".dimmed(),
    );
    println!("  {}", "-".repeat(92).dimmed());

    for (i, evaluation) in ranked.iter().enumerate() {
        let m = &evaluation.metrics;
        println!(
            "  {:>4}. {:<32} {:>9}  {:>10.4}  {:>7.4}  {:>9.4}  {:>11.4}",
            i + 1,
            truncate_chars(short_model_name(&evaluation.model), 32),
            colorize_score(m.basic_metrics.accuracy),
            m.detailed_metrics.precision,
            m.detailed_metrics.recall,
            m.detailed_metrics.f1_score,
            m.confidence_stats.mean_confidence,
        );
    }
    println!();

    if let Some(best) = ranked.first() {
        println!(
            "  Best accuracy: {} ({:.4})",
            short_model_name(&best.model).bold(),
            best.metrics.basic_metrics.accuracy
        );
    }
}

/// Color an accuracy-like score: green is good, yellow is middling.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:.4}");
    if score >= 0.85 {
        text.green()
    } else if score >= 0.6 {
        text.yellow()
    } else {
        text.red()
    }
}
