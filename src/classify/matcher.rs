// Nearest-category matching.
//
// A category's score for a transaction is the maximum cosine similarity
// between the transaction embedding and any of the category's keyword
// embeddings; the prediction is the argmax category. Ties resolve to the
// category that appears first in the categories file, and the winning
// score becomes the classification confidence (rounded to 5 d.p., as the
// original pipeline reports it).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{CategorySet, TransactionSet};
use crate::embedding::store::NamedEmbeddings;
use crate::embedding::traits::TextEncoder;
use crate::metrics::round_to;

use super::similarity::cosine_similarity;

/// One category's name and keyword embeddings.
#[derive(Debug, Clone)]
pub struct CategoryEmbeddings {
    pub name: String,
    pub keyword_vectors: Vec<Vec<f64>>,
}

/// Keyword embeddings for every category, in categories-file order.
pub struct CategoryMatcher {
    categories: Vec<CategoryEmbeddings>,
}

/// The classification of a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub index: usize,
    pub text: String,
    pub category: String,
    pub confidence: f64,
}

impl CategoryMatcher {
    /// Embed every category's keywords with the given encoder.
    pub async fn build(encoder: &dyn TextEncoder, categories: &CategorySet) -> Result<Self> {
        let mut embedded = Vec::with_capacity(categories.len());

        for category in &categories.categories {
            let keyword_vectors = encoder
                .encode_batch(&category.keywords)
                .await
                .with_context(|| {
                    format!("Failed to embed keywords for category '{}'", category.name)
                })?;

            debug!(
                category = %category.name,
                keywords = keyword_vectors.len(),
                "Embedded category keywords"
            );

            embedded.push(CategoryEmbeddings {
                name: category.name.clone(),
                keyword_vectors,
            });
        }

        Ok(Self {
            categories: embedded,
        })
    }

    /// Rebuild a matcher from a previously dumped embedding set.
    pub fn from_named_embeddings(embeddings: NamedEmbeddings) -> Self {
        let categories = embeddings
            .into_iter()
            .map(|(name, keyword_vectors)| CategoryEmbeddings {
                name,
                keyword_vectors,
            })
            .collect();
        Self { categories }
    }

    /// The category embeddings in dump format (name -> vector list).
    pub fn named_embeddings(&self) -> NamedEmbeddings {
        self.categories
            .iter()
            .map(|c| (c.name.clone(), c.keyword_vectors.clone()))
            .collect()
    }

    /// Score every category against a transaction embedding and return the
    /// best (category name, confidence) pair.
    pub fn best_match(&self, embedding: &[f64]) -> Result<(String, f64)> {
        let mut best: Option<(&str, f64)> = None;

        for category in &self.categories {
            let score = category
                .keyword_vectors
                .iter()
                .map(|kw| cosine_similarity(embedding, kw))
                .fold(0.0_f64, f64::max);

            // Strict comparison keeps the earlier category on ties
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((&category.name, score)),
            }
        }

        let (name, score) =
            best.context("Cannot classify against an empty category set")?;
        Ok((name.to_string(), round_to(score, 5)))
    }
}

/// Embed all transactions and classify each against the matcher.
pub async fn classify_transactions(
    encoder: &dyn TextEncoder,
    matcher: &CategoryMatcher,
    transactions: &TransactionSet,
) -> Result<Vec<Classification>> {
    let texts = transactions.texts();
    let embeddings = encoder
        .encode_batch(&texts)
        .await
        .context("Failed to embed test transactions")?;

    if embeddings.len() != transactions.len() {
        anyhow::bail!(
            "Encoder returned {} vectors for {} transactions",
            embeddings.len(),
            transactions.len()
        );
    }

    let mut results = Vec::with_capacity(transactions.len());
    for (record, embedding) in transactions.records.iter().zip(embeddings.iter()) {
        let (category, confidence) = matcher.best_match(embedding)?;
        results.push(Classification {
            index: record.index,
            text: record.text.clone(),
            category,
            confidence,
        });
    }

    Ok(results)
}
