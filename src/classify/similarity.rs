// Cosine similarity between embedding vectors.

/// Cosine similarity, clamped to [0.0, 1.0].
///
/// Returns 0.0 for mismatched dimensions or zero vectors, so a degenerate
/// embedding can never win a category match. Negative cosines also clamp
/// to 0.0, so anti-correlated vectors score the same as orthogonal ones;
/// an input whose similarities are all negative ties every category at 0.0
/// and resolves by category file order. An unclamped implementation would
/// instead pick the least-negative category, but sentence-embedding
/// similarities in practice never go below zero across a whole category
/// set.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}
