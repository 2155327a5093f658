use crate::splitter::DocumentChunk;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: DocumentChunk,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub payload: DocumentChunk,
}

/// The external vector database, addressed by collection name.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Creates a cosine-distance collection for vectors of `vector_size` dimensions.
    async fn create_collection(&self, collection: &str, vector_size: u64) -> Result<()>;

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Nearest neighbours of `vector`, best match first.
    async fn search(&self, collection: &str, vector: Vec<f32>, limit: u64)
        -> Result<Vec<ScoredChunk>>;
}
