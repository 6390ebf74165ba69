// Model download helper for ONNX sentence-transformer models.
//
// Each configured model gets its own subdirectory holding `model.onnx`
// (from the repo's onnx/ export) and `tokenizer.json`. Files are stored in
// a platform-appropriate directory (~/.local/share/ledgermark/models/ on
// Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::hub::short_model_name;

/// Path within a HuggingFace repo for the ONNX export.
const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";
const REMOTE_TOKENIZER_FILE: &str = "tokenizer.json";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/ledgermark/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledgermark")
        .join("models")
}

/// Subdirectory within the model dir for one model repo.
pub fn model_dir_for(base: &Path, repo: &str) -> PathBuf {
    base.join(short_model_name(repo))
}

/// Check whether both required files exist for a model.
pub fn model_files_present(base: &Path, repo: &str) -> bool {
    let dir = model_dir_for(base, repo);
    dir.join("model.onnx").exists() && dir.join("tokenizer.json").exists()
}

/// Download the ONNX model and tokenizer for every repo in `repos` from
/// the given hub, so a mirror configured for validation is also the one
/// downloaded from.
///
/// Shows progress bars for the model files. Skips files that already
/// exist. Creates directories as needed.
pub async fn download_models(base: &Path, repos: &[String], hub_url: &str) -> Result<()> {
    for repo in repos {
        let dir = model_dir_for(base, repo);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

        println!("\n{}:", short_model_name(repo));

        let tokenizer_path = dir.join("tokenizer.json");
        if tokenizer_path.exists() {
            info!(model = %repo, "Tokenizer already exists, skipping");
            println!("  tokenizer.json (already exists)");
        } else {
            println!("  Downloading tokenizer.json...");
            download_file(
                &remote_file_url(hub_url, repo, REMOTE_TOKENIZER_FILE),
                &tokenizer_path,
                false,
            )
            .await?;
        }

        let model_path = dir.join("model.onnx");
        if model_path.exists() {
            info!(model = %repo, "Model already exists, skipping");
            println!("  model.onnx (already exists)");
        } else {
            println!("  Downloading model.onnx...");
            download_file(
                &remote_file_url(hub_url, repo, REMOTE_MODEL_FILE),
                &model_path,
                true,
            )
            .await?;
        }
    }

    Ok(())
}

/// URL of one file in a repo's main revision on the hub.
fn remote_file_url(hub_url: &str, repo: &str, file: &str) -> String {
    format!("{}/{repo}/resolve/main/{file}", hub_url.trim_end_matches('/'))
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_dir_is_under_ledgermark() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("ledgermark") && path_str.contains("models"),
            "Expected path containing ledgermark/models, got: {path_str}"
        );
    }

    #[test]
    fn model_dir_uses_short_name() {
        let base = PathBuf::from("/tmp/test-models");
        let dir = model_dir_for(&base, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(dir, base.join("all-MiniLM-L6-v2"));
    }

    #[test]
    fn remote_urls_follow_the_configured_hub() {
        assert_eq!(
            remote_file_url("https://mirror.example/", "org/model", "tokenizer.json"),
            "https://mirror.example/org/model/resolve/main/tokenizer.json"
        );
        assert_eq!(
            remote_file_url("https://huggingface.co", "org/model", "onnx/model.onnx"),
            "https://huggingface.co/org/model/resolve/main/onnx/model.onnx"
        );
    }

    #[test]
    fn files_present_false_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!model_files_present(dir.path(), "org/model"));
    }

    #[test]
    fn files_present_true_when_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = model_dir_for(dir.path(), "org/model");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("model.onnx"), b"fake").unwrap();
        std::fs::write(model_dir.join("tokenizer.json"), b"fake").unwrap();

        assert!(model_files_present(dir.path(), "org/model"));
    }
}
