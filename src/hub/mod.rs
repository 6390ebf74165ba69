// HuggingFace hub model validation.
//
// Before loading anything, configured model names are checked against the
// hub's model-info API so a typo in config.json fails fast instead of
// producing a confusing download error. Invalid entries are skipped with a
// warning; the run only fails when no model survives validation.

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Default HuggingFace hub endpoint.
pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Thin reqwest wrapper over the hub's public model-info endpoint.
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubClient {
    /// Create a new hub client pointing at the given base URL.
    ///
    /// Defaults to `https://huggingface.co` — pass a different URL
    /// for testing against a local stub.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ledgermark/0.1 (embedding-benchmark)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check whether a model repo exists on the hub without downloading it.
    ///
    /// GET /api/models/{repo} — 200 means the repo exists, 404 means it
    /// doesn't. Any other status is a transport-level error.
    pub async fn model_exists(&self, repo: &str) -> Result<bool> {
        let url = format!("{}/api/models/{}", self.base_url, repo);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Hub request failed for model '{repo}'"))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        anyhow::bail!("Hub returned {status} for model '{repo}'");
    }

    /// Filter a configured model list down to the names that are well-formed
    /// and exist on the hub, preserving order. Invalid entries are skipped
    /// with a warning, matching lenient config handling: one typo shouldn't
    /// abort a multi-model evaluation.
    pub async fn validate_models(&self, names: &[String]) -> Result<Vec<String>> {
        let mut valid = Vec::with_capacity(names.len());

        for name in names {
            if let Err(reason) = check_model_name(name) {
                warn!(model = %name, %reason, "Skipping malformed model name");
                continue;
            }

            info!(model = %name, "Validating model against the hub");
            match self.model_exists(name).await {
                Ok(true) => {
                    info!(model = %name, "Model exists on the hub");
                    valid.push(name.clone());
                }
                Ok(false) => {
                    warn!(model = %name, "Model not found on the hub, skipping");
                }
                Err(e) => {
                    warn!(model = %name, error = %e, "Hub validation failed, skipping");
                }
            }
        }

        if valid.is_empty() {
            anyhow::bail!(
                "None of the configured models passed hub validation. \
                 Check models.transformer_models in config.json."
            );
        }

        Ok(valid)
    }
}

/// Validate the shape of a model name: non-empty and in
/// `organization/model-name` form.
pub fn check_model_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("model name cannot be empty".to_string());
    }
    if !name.contains('/') {
        return Err(format!(
            "invalid model name format: '{name}'. Expected 'organization/model-name'"
        ));
    }
    Ok(())
}

/// The part of a repo id after the organization, used for file and
/// directory names (e.g. "sentence-transformers/all-MiniLM-L6-v2" ->
/// "all-MiniLM-L6-v2").
pub fn short_model_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal hub stub on a local port: 200 for the one known repo,
    /// 404 for everything else.
    async fn spawn_stub_hub(known_repo: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    // Match the request line, e.g. "GET /api/models/org/real HTTP/1.1"
                    let response = if request.contains(&format!("/api/models/{known_repo} ")) {
                        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}"
                    } else {
                        "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn model_exists_maps_status_codes() {
        let url = spawn_stub_hub("org/real").await;
        let hub = HubClient::new(&url).unwrap();
        assert!(hub.model_exists("org/real").await.unwrap());
        assert!(!hub.model_exists("org/other").await.unwrap());
    }

    #[tokio::test]
    async fn validate_models_skips_invalid_entries() {
        let url = spawn_stub_hub("org/real").await;
        let hub = HubClient::new(&url).unwrap();

        let names = vec![
            "no-slash".to_string(),
            "org/real".to_string(),
            "org/missing".to_string(),
        ];
        let valid = hub.validate_models(&names).await.unwrap();
        assert_eq!(valid, vec!["org/real".to_string()]);
    }

    #[tokio::test]
    async fn validate_models_fails_when_all_names_are_malformed() {
        // Malformed names are rejected before any request, so the client
        // never needs a reachable hub.
        let hub = HubClient::new("http://127.0.0.1:1").unwrap();
        let names = vec!["no-slash".to_string(), "   ".to_string()];

        let err = hub.validate_models(&names).await.unwrap_err();
        assert!(err.to_string().contains("None of the configured models"));
    }

    #[tokio::test]
    async fn validate_models_fails_when_hub_rejects_everything() {
        let url = spawn_stub_hub("org/real").await;
        let hub = HubClient::new(&url).unwrap();

        let err = hub
            .validate_models(&["org/missing".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("None of the configured models"));
    }

    #[test]
    fn well_formed_name_passes() {
        assert!(check_model_name("sentence-transformers/all-MiniLM-L6-v2").is_ok());
    }

    #[test]
    fn empty_name_fails() {
        assert!(check_model_name("").is_err());
        assert!(check_model_name("   ").is_err());
    }

    #[test]
    fn name_without_slash_fails() {
        let err = check_model_name("all-MiniLM-L6-v2").unwrap_err();
        assert!(err.contains("organization/model-name"));
    }

    #[test]
    fn short_name_strips_organization() {
        assert_eq!(
            short_model_name("sentence-transformers/all-MiniLM-L6-v2"),
            "all-MiniLM-L6-v2"
        );
        assert_eq!(short_model_name("no-slash"), "no-slash");
    }
}
