// Test data loading — expense categories and labeled transactions.
//
// Both files are flat JSON objects. `categories.json` maps a category name
// to a list of representative keywords; `transactions.json` maps a
// transaction description to its ground-truth category. File order is
// preserved (serde_json's preserve_order feature) so that similarity ties
// and report ordering are stable across runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One expense category and the keywords that represent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

/// The fixed set of expense categories, in file order.
#[derive(Debug, Clone)]
pub struct CategorySet {
    pub categories: Vec<Category>,
}

impl CategorySet {
    /// Load categories from a JSON object of name -> keyword list.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Categories file not found at {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in categories file: {}", path.display()))?;

        let object = value
            .as_object()
            .with_context(|| format!("Categories file must be a JSON object: {}", path.display()))?;

        if object.is_empty() {
            anyhow::bail!("Categories file is empty: {}", path.display());
        }

        let mut categories = Vec::with_capacity(object.len());
        for (name, keywords) in object {
            let keywords: Vec<String> = serde_json::from_value(keywords.clone()).with_context(
                || format!("Category '{name}' must map to a list of keyword strings"),
            )?;
            if keywords.is_empty() {
                anyhow::bail!("Category '{name}' has no keywords");
            }
            categories.push(Category {
                name: name.clone(),
                keywords,
            });
        }

        Ok(Self { categories })
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A single labeled test transaction. The index is the position in the
/// file, used to key results the way the original data set is keyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub index: usize,
    pub text: String,
    pub label: String,
}

/// All labeled test transactions, in file order.
#[derive(Debug, Clone)]
pub struct TransactionSet {
    pub records: Vec<Transaction>,
}

impl TransactionSet {
    /// Load transactions from a JSON object of description -> true category.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Transactions file not found at {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in transactions file: {}", path.display()))?;

        let object = value.as_object().with_context(|| {
            format!("Transactions file must be a JSON object: {}", path.display())
        })?;

        if object.is_empty() {
            anyhow::bail!("Transactions file is empty: {}", path.display());
        }

        let mut records = Vec::with_capacity(object.len());
        for (index, (text, label)) in object.iter().enumerate() {
            let label = label.as_str().with_context(|| {
                format!("Transaction '{text}' must map to a category name string")
            })?;
            records.push(Transaction {
                index,
                text: text.clone(),
                label: label.to_string(),
            });
        }

        Ok(Self { records })
    }

    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.text.clone()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(|r| r.label.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn categories_load_preserves_file_order() {
        let (_dir, path) = write_temp(
            r#"{
                "Transportation": ["uber", "gas station"],
                "Groceries": ["supermarket"]
            }"#,
        );
        let set = CategorySet::load(&path).unwrap();
        assert_eq!(set.names(), vec!["Transportation", "Groceries"]);
        assert_eq!(set.categories[0].keywords.len(), 2);
    }

    #[test]
    fn categories_reject_empty_object() {
        let (_dir, path) = write_temp("{}");
        assert!(CategorySet::load(&path).is_err());
    }

    #[test]
    fn categories_reject_empty_keyword_list() {
        let (_dir, path) = write_temp(r#"{ "Groceries": [] }"#);
        let err = CategorySet::load(&path).unwrap_err();
        assert!(err.to_string().contains("no keywords"));
    }

    #[test]
    fn categories_reject_non_string_keywords() {
        let (_dir, path) = write_temp(r#"{ "Groceries": [1, 2] }"#);
        assert!(CategorySet::load(&path).is_err());
    }

    #[test]
    fn transactions_load_assigns_indices_in_order() {
        let (_dir, path) = write_temp(
            r#"{
                "UBER TRIP 4512": "Transportation",
                "WHOLE FOODS MKT": "Groceries"
            }"#,
        );
        let set = TransactionSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].index, 0);
        assert_eq!(set.records[0].text, "UBER TRIP 4512");
        assert_eq!(set.records[1].label, "Groceries");
    }

    #[test]
    fn transactions_reject_empty_object() {
        let (_dir, path) = write_temp("{}");
        assert!(TransactionSet::load(&path).is_err());
    }

    #[test]
    fn transactions_reject_non_string_labels() {
        let (_dir, path) = write_temp(r#"{ "UBER TRIP": 3 }"#);
        assert!(TransactionSet::load(&path).is_err());
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = TransactionSet::load(Path::new("/nonexistent/t.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/t.json"));
    }
}
