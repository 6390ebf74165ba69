// Result persistence — per-model evaluation JSON in the results dir.
//
// `ledgermark report` re-renders the HTML report from these files without
// re-running inference, so they are the pipeline's only durable output
// besides the report itself.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::hub::short_model_name;

use super::evaluate::ModelEvaluation;

/// Write one model's evaluation as `<dir>/<model>.json`.
pub fn save(dir: &Path, evaluation: &ModelEvaluation) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", short_model_name(&evaluation.model)));
    let raw = serde_json::to_string_pretty(evaluation)?;
    fs::write(&path, raw)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    debug!(model = %evaluation.model, path = %path.display(), "Saved evaluation results");
    Ok(path)
}

/// Load every saved evaluation from the results dir, sorted by file name
/// so report ordering is stable.
pub fn load_all(dir: &Path) -> Result<Vec<ModelEvaluation>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Results directory not found at {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        anyhow::bail!(
            "No result files in {}. Run `ledgermark run` first.",
            dir.display()
        );
    }

    let mut evaluations = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let evaluation: ModelEvaluation = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid result file: {}", path.display()))?;
        evaluations.push(evaluation);
    }

    Ok(evaluations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    fn sample(model: &str) -> ModelEvaluation {
        let y = vec!["A".to_string(), "B".to_string()];
        ModelEvaluation {
            model: model.to_string(),
            classifications: Vec::new(),
            metrics: metrics::evaluate(&y, &y, &[0.9, 0.8]),
        }
    }

    #[test]
    fn save_then_load_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), &sample("org/model-b")).unwrap();
        save(dir.path(), &sample("org/model-a")).unwrap();

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        // Sorted by file name, not insertion order
        assert_eq!(loaded[0].model, "org/model-a");
        assert_eq!(loaded[1].model, "org/model-b");
        assert_eq!(loaded[0].metrics.basic_metrics.accuracy, 1.0);
    }

    #[test]
    fn empty_results_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_all(dir.path()).unwrap_err();
        assert!(err.to_string().contains("ledgermark run"));
    }
}
