use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::embedding;
use crate::error::AppError;
use crate::scheme::{self, HealthScheme};
use crate::state::AppState;
use crate::vector_store::ScoredChunk;

pub const DEFAULT_LIMIT: u64 = 3;

#[derive(Debug, Serialize)]
pub struct SearchHit {
    /// 1-based rank.
    pub result_id: usize,
    pub score: f32,
    pub text: String,
    pub filename: String,
    pub page: u32,
    pub chunk: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<HealthScheme>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}

/// Embeds `query` and returns the closest chunks in `collection`, best first.
pub async fn semantic_search(
    state: &AppState,
    collection: &str,
    query: &str,
    limit: u64,
) -> Result<Vec<ScoredChunk>, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Input("query must not be empty".to_string()));
    }
    if limit == 0 {
        return Err(AppError::Input("limit must be at least 1".to_string()));
    }
    info!(collection, limit, query, "semantic search");

    if !state
        .store
        .collection_exists(collection)
        .await
        .map_err(AppError::upstream)?
    {
        return Err(AppError::NotFound(format!(
            "Collection {collection} does not exist"
        )));
    }

    let vector = embedding::embed_one(Arc::clone(&state.embedder), query)
        .await
        .map_err(AppError::internal)?;
    let mut hits = state
        .store
        .search(collection, vector, limit)
        .await
        .map_err(AppError::upstream)?;

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit as usize);
    info!(collection, found = hits.len(), "search completed");
    Ok(hits)
}

pub fn format_hits(hits: Vec<ScoredChunk>) -> SearchResults {
    let results = hits
        .into_iter()
        .enumerate()
        .map(|(i, hit)| SearchHit {
            result_id: i + 1,
            score: hit.score,
            scheme: scheme::parse(&hit.payload.text),
            text: hit.payload.text,
            filename: hit.payload.filename,
            page: hit.payload.page,
            chunk: hit.payload.chunk,
        })
        .collect();
    SearchResults { results }
}
