use std::sync::Arc;

use crate::config::CollectionSettings;
use crate::embedding::Embedder;
use crate::llm::ChatModel;
use crate::pdf::TextExtractor;
use crate::splitter::Chunker;
use crate::vector_store::VectorStore;

/// Process-wide singletons shared by every request. Nothing here is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn ChatModel>,
    pub extractor: Arc<dyn TextExtractor>,
    pub chunker: Arc<Chunker>,
    pub collections: CollectionSettings,
    pub max_upload_bytes: usize,
}
