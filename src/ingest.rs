use axum::body::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding;
use crate::error::AppError;
use crate::state::AppState;
use crate::vector_store::VectorRecord;

pub const UPSERT_BATCH_SIZE: usize = 128;

#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub status: &'static str,
    pub message: String,
    pub filename: String,
    pub collection_name: String,
    pub pages: usize,
    pub chunks_count: usize,
}

/// Extracts, chunks, embeds and stores one uploaded PDF.
///
/// Every call writes fresh records, so uploading the same file twice stores
/// its chunks twice. A failed upsert batch aborts the upload without removing
/// batches that were already written.
pub async fn ingest_pdf(
    state: &AppState,
    filename: &str,
    bytes: Bytes,
    collection: &str,
) -> Result<UploadSummary, AppError> {
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AppError::Input("Only PDF files are supported".to_string()));
    }
    if bytes.is_empty() {
        return Err(AppError::Input(format!("{filename} is empty")));
    }
    info!(filename, collection, size = bytes.len(), "processing pdf upload");

    let extractor = Arc::clone(&state.extractor);
    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
        .await
        .map_err(|e| AppError::Internal(format!("pdf extraction task failed: {e}")))??;

    let chunks = state.chunker.split_pages(&pages, filename);
    if chunks.is_empty() {
        warn!(filename, pages = pages.len(), "no text extracted");
        return Ok(UploadSummary {
            status: "warning",
            message: format!("No text chunks extracted from {filename}."),
            filename: filename.to_string(),
            collection_name: collection.to_string(),
            pages: pages.len(),
            chunks_count: 0,
        });
    }
    info!(filename, pages = pages.len(), chunks = chunks.len(), "split pdf into chunks");

    ensure_collection(state, collection).await?;

    let texts = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedding::embed_texts(Arc::clone(&state.embedder), texts)
        .await
        .map_err(AppError::internal)?;

    let records: Vec<VectorRecord> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(payload, vector)| VectorRecord {
            id: Uuid::new_v4(),
            vector,
            payload,
        })
        .collect();
    let count = records.len();

    for batch in records.chunks(UPSERT_BATCH_SIZE) {
        state
            .store
            .upsert(collection, batch.to_vec())
            .await
            .map_err(AppError::upstream)?;
    }

    info!(filename, collection, count, "stored pdf chunks");
    Ok(UploadSummary {
        status: "success",
        message: format!("Uploaded {count} chunks from {filename}."),
        filename: filename.to_string(),
        collection_name: collection.to_string(),
        pages: pages.len(),
        chunks_count: count,
    })
}

async fn ensure_collection(state: &AppState, collection: &str) -> Result<(), AppError> {
    let store = &state.store;
    if store
        .collection_exists(collection)
        .await
        .map_err(AppError::upstream)?
    {
        return Ok(());
    }
    info!(collection, "creating collection");
    if let Err(err) = store
        .create_collection(collection, state.embedder.dimension())
        .await
    {
        // Another upload may have created it in the meantime.
        if store.collection_exists(collection).await.unwrap_or(false) {
            return Ok(());
        }
        return Err(AppError::upstream(err));
    }
    Ok(())
}
