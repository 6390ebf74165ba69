// Text encoder trait — the swap-ready abstraction.
//
// The pipeline only ever sees this trait, so the real ONNX encoder can be
// replaced by a deterministic stub in tests (no model download required)
// or by a remote embedding API later.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning text into dense embedding vectors. Implementations are
/// async because encoding is offloaded to blocking threads (ONNX) or made
/// over HTTP (remote providers).
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Encode multiple texts, returning vectors in the same order.
    /// All vectors from one encoder have the same dimension.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// Encode a single text. Default implementation wraps `encode_batch`.
    async fn encode(&self, text: &str) -> Result<Vec<f64>> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Encoder returned no vector for a single text"))
    }
}
