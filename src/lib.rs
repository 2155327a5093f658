pub mod all_minilm_l6_v2;
pub mod config;
pub mod diet_plan;
pub mod embedding;
pub mod embedding_model_factory;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod nutrition;
pub mod pdf;
pub mod qdrant_util;
pub mod routes;
pub mod scheme;
pub mod search;
pub mod splitter;
pub mod state;
pub mod vector_store;

pub use error::AppError;
pub use routes::app;
pub use state::AppState;
