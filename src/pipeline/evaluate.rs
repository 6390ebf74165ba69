// Per-model evaluation: embed category keywords, embed transactions,
// classify, and score against the ground-truth labels.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{classify_transactions, CategoryMatcher, Classification};
use crate::dataset::{CategorySet, TransactionSet};
use crate::embedding::store::NamedEmbeddings;
use crate::embedding::traits::TextEncoder;
use crate::metrics::{self, ModelMetrics};

/// Everything one model produced: raw classifications plus the aggregated
/// metrics. This is what gets written to the results dir and fed to the
/// report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub model: String,
    pub classifications: Vec<Classification>,
    pub metrics: ModelMetrics,
}

impl ModelEvaluation {
    /// True labels, prediction, and text for each misclassified transaction,
    /// paired for the report's error listing.
    pub fn misclassified<'a>(
        &'a self,
        transactions: &'a TransactionSet,
    ) -> Vec<(&'a Classification, &'a str)> {
        self.classifications
            .iter()
            .zip(transactions.records.iter())
            .filter(|(c, r)| c.category != r.label)
            .map(|(c, r)| (c, r.label.as_str()))
            .collect()
    }
}

/// One model's full run output, including the category embeddings so the
/// caller can dump them alongside the results.
pub struct ModelRun {
    pub evaluation: ModelEvaluation,
    pub category_embeddings: NamedEmbeddings,
}

/// Run the classification pipeline for a single model.
pub async fn evaluate_model(
    model: &str,
    encoder: &dyn TextEncoder,
    categories: &CategorySet,
    transactions: &TransactionSet,
) -> Result<ModelRun> {
    info!(model, categories = categories.len(), "Embedding category keywords");
    let matcher = CategoryMatcher::build(encoder, categories).await?;

    info!(model, transactions = transactions.len(), "Classifying transactions");
    let classifications = classify_transactions(encoder, &matcher, transactions).await?;

    let y_true = transactions.labels();
    let y_pred: Vec<String> = classifications.iter().map(|c| c.category.clone()).collect();
    let confidences: Vec<f64> = classifications.iter().map(|c| c.confidence).collect();

    let metrics = metrics::evaluate(&y_true, &y_pred, &confidences);

    info!(
        model,
        accuracy = metrics.basic_metrics.accuracy,
        f1 = metrics.detailed_metrics.f1_score,
        "Model evaluation complete"
    );

    Ok(ModelRun {
        evaluation: ModelEvaluation {
            model: model.to_string(),
            classifications,
            metrics,
        },
        category_embeddings: matcher.named_embeddings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Deterministic encoder: every known text maps to a fixed vector.
    struct StubEncoder {
        vectors: HashMap<String, Vec<f64>>,
    }

    #[async_trait]
    impl TextEncoder for StubEncoder {
        async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            texts
                .iter()
                .map(|t| {
                    self.vectors
                        .get(t)
                        .cloned()
                        .ok_or_else(|| anyhow!("no stub vector for '{t}'"))
                })
                .collect()
        }
    }

    fn stub() -> StubEncoder {
        let mut vectors = HashMap::new();
        // Keyword axes
        vectors.insert("supermarket".to_string(), vec![1.0, 0.0, 0.0]);
        vectors.insert("taxi".to_string(), vec![0.0, 1.0, 0.0]);
        // Transactions: two clearly grocery-like, one taxi-like, one that
        // lands on the grocery axis despite a Transportation label.
        vectors.insert("WHOLE FOODS MKT".to_string(), vec![0.9, 0.1, 0.0]);
        vectors.insert("TRADER JOES #512".to_string(), vec![0.8, 0.0, 0.1]);
        vectors.insert("UBER TRIP 4512".to_string(), vec![0.1, 0.9, 0.0]);
        vectors.insert("SHELL OIL 220".to_string(), vec![0.7, 0.2, 0.0]);
        StubEncoder { vectors }
    }

    fn fixtures() -> (CategorySet, TransactionSet) {
        use crate::dataset::{Category, Transaction};
        let categories = CategorySet {
            categories: vec![
                Category {
                    name: "Groceries".to_string(),
                    keywords: vec!["supermarket".to_string()],
                },
                Category {
                    name: "Transportation".to_string(),
                    keywords: vec!["taxi".to_string()],
                },
            ],
        };
        let records = [
            ("WHOLE FOODS MKT", "Groceries"),
            ("TRADER JOES #512", "Groceries"),
            ("UBER TRIP 4512", "Transportation"),
            ("SHELL OIL 220", "Transportation"),
        ]
        .iter()
        .enumerate()
        .map(|(index, (text, label))| Transaction {
            index,
            text: text.to_string(),
            label: label.to_string(),
        })
        .collect();
        (categories, TransactionSet { records })
    }

    #[tokio::test]
    async fn evaluates_a_model_end_to_end() {
        let (categories, transactions) = fixtures();
        let run = evaluate_model("org/stub-model", &stub(), &categories, &transactions)
            .await
            .unwrap();

        let eval = &run.evaluation;
        assert_eq!(eval.model, "org/stub-model");
        assert_eq!(eval.classifications.len(), 4);

        // SHELL OIL lands on the grocery axis, so 3 of 4 are correct.
        assert_eq!(eval.metrics.basic_metrics.accuracy, 0.75);
        assert_eq!(eval.classifications[3].category, "Groceries");

        // Misclassified listing pairs the prediction with the true label.
        let errors = eval.misclassified(&transactions);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0.text, "SHELL OIL 220");
        assert_eq!(errors[0].1, "Transportation");

        // Category embeddings come back in file order for dumping.
        assert_eq!(run.category_embeddings[0].0, "Groceries");
        assert_eq!(run.category_embeddings[1].0, "Transportation");
    }

    #[tokio::test]
    async fn confidences_are_clamped_and_rounded() {
        let (categories, transactions) = fixtures();
        let run = evaluate_model("org/stub-model", &stub(), &categories, &transactions)
            .await
            .unwrap();

        for c in &run.evaluation.classifications {
            assert!((0.0..=1.0).contains(&c.confidence));
            let scaled = c.confidence * 1e5;
            assert!((scaled - scaled.round()).abs() < 1e-9, "not 5 d.p.: {}", c.confidence);
        }
    }
}
