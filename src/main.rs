use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use pdf_semantic_search_service::config::Settings;
use pdf_semantic_search_service::embedding::FastEmbedder;
use pdf_semantic_search_service::llm::OpenAiChatClient;
use pdf_semantic_search_service::pdf::PdfExtractor;
use pdf_semantic_search_service::qdrant_util::QdrantStore;
use pdf_semantic_search_service::splitter::Chunker;
use pdf_semantic_search_service::{app, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env().context("loading configuration")?;

    let model_dir = settings.model_dir.clone();
    let embedder = tokio::task::spawn_blocking(move || FastEmbedder::load(&model_dir))
        .await
        .context("model loading task panicked")?
        .context("loading embedding model")?;
    let store = QdrantStore::connect(&settings.qdrant)?;
    let llm = OpenAiChatClient::new(&settings.llm).context("building LLM client")?;
    let chunker = Chunker::new(settings.chunking.size, settings.chunking.overlap)
        .context("configuring text splitter")?;
    info!(
        chunk_size = settings.chunking.size,
        chunk_overlap = settings.chunking.overlap,
        "text splitter ready"
    );

    let state = AppState {
        embedder: Arc::new(embedder),
        store: Arc::new(store),
        llm: Arc::new(llm),
        extractor: Arc::new(PdfExtractor),
        chunker: Arc::new(chunker),
        collections: settings.collections.clone(),
        max_upload_bytes: settings.max_upload_bytes,
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!("Server running on http://{}", settings.bind_addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
