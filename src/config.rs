use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Central configuration, loaded from a JSON file.
///
/// The file path is resolved from (in order): an explicit `--config` flag,
/// the `LEDGERMARK_CONFIG` env var, or `./config.json`. The model storage
/// directory is machine-local and comes from the environment instead of the
/// config file. A `.env` file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub models: ModelsConfig,
    #[serde(default)]
    pub embedding_settings: EmbeddingSettings,
    pub test_data: TestDataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory containing the downloaded ONNX model files.
    /// From LEDGERMARK_MODEL_DIR, not the config file.
    #[serde(skip)]
    pub model_dir: PathBuf,
}

/// Which sentence-embedding models to evaluate.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// HuggingFace repo ids, e.g. "sentence-transformers/all-MiniLM-L6-v2"
    pub transformer_models: Vec<String>,
    /// Accepted for config-file compatibility; no subcommand consumes it
    #[serde(default)]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    /// Where per-model embedding dumps are written
    #[serde(default = "default_embeddings_dir")]
    pub embeddings_output_dir: PathBuf,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            embeddings_output_dir: default_embeddings_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestDataConfig {
    /// JSON object of transaction description -> true category
    pub transactions_file: PathBuf,
    /// JSON object of category -> keyword list
    pub categories_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// The rendered HTML comparison report
    #[serde(default = "default_report_file")]
    pub output_file: PathBuf,
    /// Where chart files are written (referenced from the report by
    /// path relative to the report file)
    #[serde(default = "default_image_dir")]
    pub image_storage: PathBuf,
    /// Where per-model result JSON files are written
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_file: default_report_file(),
            image_storage: default_image_dir(),
            results_dir: default_results_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback level for the tracing env filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_embeddings_dir() -> PathBuf {
    PathBuf::from("embeddings")
}

fn default_report_file() -> PathBuf {
    PathBuf::from("output/report.html")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("output/images")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("output/results")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the given path, or from LEDGERMARK_CONFIG /
    /// ./config.json when no path is passed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => env::var("LEDGERMARK_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config.json")),
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Configuration file not found at {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON configuration file: {}", path.display()))?;

        config.model_dir = env::var("LEDGERMARK_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(config)
    }

    /// Create every configured output directory so later stages can write
    /// without checking. Missing parents of the test data files are created
    /// too, which makes the error for an absent file itself unambiguous.
    pub fn ensure_directories(&self) -> Result<()> {
        let mut dirs: Vec<&Path> = vec![
            &self.embedding_settings.embeddings_output_dir,
            &self.output.image_storage,
            &self.output.results_dir,
        ];

        let report_parent = self.output.output_file.parent();
        let tx_parent = self.test_data.transactions_file.parent();
        let cat_parent = self.test_data.categories_file.parent();
        dirs.extend([report_parent, tx_parent, cat_parent].into_iter().flatten());

        for dir in dirs {
            if dir.as_os_str().is_empty() {
                continue;
            }
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Check that at least one model is configured.
    /// Call this before any operation that iterates the model list.
    pub fn require_models(&self) -> Result<()> {
        if self.models.transformer_models.is_empty() {
            anyhow::bail!(
                "No models configured. Add HuggingFace repo ids to \
                 models.transformer_models in config.json."
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "models": {
            "transformer_models": ["sentence-transformers/all-MiniLM-L6-v2"]
        },
        "test_data": {
            "transactions_file": "data/transactions.json",
            "categories_file": "data/categories.json"
        }
    }"#;

    #[test]
    fn load_minimal_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, MINIMAL).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.models.transformer_models.len(), 1);
        assert_eq!(config.output.output_file, PathBuf::from("output/report.html"));
        assert_eq!(config.output.image_storage, PathBuf::from("output/images"));
        assert_eq!(
            config.embedding_settings.embeddings_output_dir,
            PathBuf::from("embeddings")
        );
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn default_model_is_optional_but_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "models": {
                    "transformer_models": ["org/model"],
                    "default_model": "org/model"
                },
                "test_data": {
                    "transactions_file": "t.json",
                    "categories_file": "c.json"
                }
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.models.default_model.as_deref(), Some("org/model"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn ensure_directories_creates_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let base = dir.path().to_string_lossy().to_string();
        let raw = format!(
            r#"{{
                "models": {{ "transformer_models": ["org/model"] }},
                "test_data": {{
                    "transactions_file": "{base}/data/transactions.json",
                    "categories_file": "{base}/data/categories.json"
                }},
                "output": {{
                    "output_file": "{base}/out/report.html",
                    "image_storage": "{base}/out/images",
                    "results_dir": "{base}/out/results"
                }},
                "embedding_settings": {{ "embeddings_output_dir": "{base}/emb" }}
            }}"#
        );
        fs::write(&path, raw).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        config.ensure_directories().unwrap();

        assert!(dir.path().join("out/images").is_dir());
        assert!(dir.path().join("out/results").is_dir());
        assert!(dir.path().join("emb").is_dir());
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn require_models_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "models": { "transformer_models": [] },
                "test_data": {
                    "transactions_file": "t.json",
                    "categories_file": "c.json"
                }
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.require_models().is_err());
    }
}
