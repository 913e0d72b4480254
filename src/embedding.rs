//! # Embedding Contract Module
//!
//! The embedding model is an external collaborator consumed as a black box:
//! it turns arbitrary text into fixed-length numeric vectors. The search
//! engine is its only consumer.

use anyhow::Result;
use async_trait::async_trait;

/// Dimensionality of the multilingual sentence embeddings the catalogue
/// index is built with.
pub const EMBEDDING_DIM: usize = 384;

/// Contract for the external embedding model.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Vector length this embedder produces. The production catalogue
    /// index runs at [`EMBEDDING_DIM`]; indexes validate every returned
    /// vector against this value.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector"))
    }
}

/// Validate that a returned vector matches the expected dimensionality.
pub fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(anyhow::anyhow!(
            "Embedding dimension mismatch: got {}, expected {}",
            vector.len(),
            expected
        ));
    }
    Ok(())
}

/// Cosine similarity between two vectors, mapped into `[0, 1]`.
///
/// Raw cosine lives in `[-1, 1]`; the affine map `(cos + 1) / 2` keeps the
/// blended search score in range for any embedder. Zero-norm vectors score
/// 0.5 (no signal either way).
pub fn cosine_unit_interval(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.5;
    }

    let cosine = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    (cosine + 1.0) / 2.0
}
