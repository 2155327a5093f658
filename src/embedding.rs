use crate::all_minilm_l6_v2::{ENCODE_BATCH_SIZE, VECTOR_SIZE};
use crate::embedding_model_factory;
use anyhow::{anyhow, Context, Result};
use fastembed::TextEmbedding;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns text into fixed-size vectors.
pub trait Embedder: Send + Sync {
    /// Number of dimensions of every vector this embedder returns.
    fn dimension(&self) -> u64;

    /// One vector per input, in input order.
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

pub struct FastEmbedder {
    model: TextEmbedding,
    dimension: u64,
}

impl FastEmbedder {
    /// Loads the model and reads its output size off a sample embedding, so
    /// collections match whatever export sits in `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model = embedding_model_factory::get_model(model_dir)?;
        let sample = model
            .embed(vec!["dimension check".to_string()], None)
            .context("embedding sample text")?;
        let dimension = output_dimension(&sample)?;
        if dimension != VECTOR_SIZE {
            warn!(dimension, expected = VECTOR_SIZE, "model output size differs from all-MiniLM-L6-v2");
        }
        Ok(Self { model, dimension })
    }
}

fn output_dimension(sample: &[Vec<f32>]) -> Result<u64> {
    match sample.first() {
        Some(vector) if !vector.is_empty() => Ok(vector.len() as u64),
        _ => Err(anyhow!("model produced an empty embedding")),
    }
}

impl Embedder for FastEmbedder {
    fn dimension(&self) -> u64 {
        self.dimension
    }

    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), "encoding texts");
        self.model
            .embed(texts, Some(ENCODE_BATCH_SIZE))
            .context("generating embeddings")
    }
}

/// Runs inference on the blocking pool and checks the model kept one vector per input.
pub async fn embed_texts(embedder: Arc<dyn Embedder>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
    let expected = texts.len();
    let vectors = tokio::task::spawn_blocking(move || embedder.embed(texts))
        .await
        .context("embedding task panicked")??;
    if vectors.len() != expected {
        return Err(anyhow!(
            "model returned {} embeddings for {} inputs",
            vectors.len(),
            expected
        ));
    }
    Ok(vectors)
}

pub async fn embed_one(embedder: Arc<dyn Embedder>, text: &str) -> Result<Vec<f32>> {
    embed_texts(embedder, vec![text.to_string()])
        .await?
        .pop()
        .ok_or_else(|| anyhow!("model returned no embedding"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Embedder for Fixed {
        fn dimension(&self) -> u64 {
            2
        }

        fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]; self.0])
        }
    }

    #[tokio::test]
    async fn mismatched_output_count_is_an_error() {
        let embedder: Arc<dyn Embedder> = Arc::new(Fixed(1));
        let err = embed_texts(embedder, vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 2 inputs"));
    }

    #[tokio::test]
    async fn embed_one_returns_the_single_vector() {
        let embedder: Arc<dyn Embedder> = Arc::new(Fixed(1));
        let v = embed_one(embedder, "hello").await.unwrap();
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[test]
    fn output_dimension_follows_the_sample_vector() {
        assert_eq!(output_dimension(&[vec![0.5; 768]]).unwrap(), 768);
        assert!(output_dimension(&[]).is_err());
        assert!(output_dimension(&[Vec::new()]).is_err());
    }
}
