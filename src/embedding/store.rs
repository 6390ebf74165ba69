// Flat JSON persistence for named embedding sets.
//
// Category keyword embeddings are dumped per model as
// `<embeddings_dir>/<model>.json`, a JSON object of name -> list of
// vectors. These files are diagnostic output and a cache for re-runs;
// nothing else in the pipeline depends on them existing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::hub::short_model_name;

/// A named set of embedding vectors, in insertion order.
pub type NamedEmbeddings = Vec<(String, Vec<Vec<f64>>)>;

/// Path of the embedding dump for one model.
pub fn dump_path(dir: &Path, repo: &str) -> PathBuf {
    dir.join(format!("{}.json", short_model_name(repo)))
}

/// Write a model's embeddings as a JSON object of name -> vector list.
pub fn dump(dir: &Path, repo: &str, embeddings: &NamedEmbeddings) -> Result<PathBuf> {
    let mut object = serde_json::Map::with_capacity(embeddings.len());
    for (name, vectors) in embeddings {
        object.insert(name.clone(), json!(vectors));
    }

    let path = dump_path(dir, repo);
    let raw = serde_json::to_string(&Value::Object(object))?;
    fs::write(&path, raw)
        .with_context(|| format!("Failed to write embeddings to {}", path.display()))?;
    Ok(path)
}

/// Read an embedding dump back into memory.
pub fn load(path: &Path) -> Result<NamedEmbeddings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Embeddings file not found at {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in embeddings file: {}", path.display()))?;

    let object = value
        .as_object()
        .with_context(|| format!("Embeddings file must be a JSON object: {}", path.display()))?;

    let mut embeddings = Vec::with_capacity(object.len());
    for (name, vectors) in object {
        let vectors: Vec<Vec<f64>> = serde_json::from_value(vectors.clone())
            .with_context(|| format!("Entry '{name}' must be a list of embedding vectors"))?;
        embeddings.push((name.clone(), vectors));
    }

    Ok(embeddings)
}
