use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::ingest::{self, UploadSummary};
use crate::nutrition::{self, Recommendation};
use crate::search::{self, SearchResults, DEFAULT_LIMIT};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/upload-pdf/", post(upload_pdf))
        .route("/search/", get(search_by_query).post(search_by_json))
        .route("/nutrition-recommendation/", post(nutrition_recommendation))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to PDF Semantic Search API" }))
}

async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadSummary>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Input(e.body_text()))?;
    let mut file = None;
    let mut collection = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "invalid multipart body"))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "failed to read file"))?;
                file = Some((filename, bytes));
            }
            Some("collection_name") => {
                let name = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "invalid collection_name"))?;
                collection = Some(name.trim().to_string()).filter(|n| !n.is_empty());
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Input("multipart field 'file' is required".to_string()))?;
    let collection = collection.unwrap_or_else(|| state.collections.default.clone());
    info!(filename = %filename, collection = %collection, "upload-pdf requested");

    let summary = ingest::ingest_pdf(&state, &filename, bytes, &collection).await?;
    Ok(Json(summary))
}

fn multipart_error(err: MultipartError, what: &str) -> AppError {
    let detail = format!("{what}: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge(detail)
    } else {
        AppError::Input(detail)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub collection_name: Option<String>,
    pub limit: Option<u64>,
}

async fn search_by_query(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResults>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Input(e.body_text()))?;
    run_search(&state, params).await
}

async fn search_by_json(
    State(state): State<AppState>,
    body: Result<Json<SearchParams>, JsonRejection>,
) -> Result<Json<SearchResults>, AppError> {
    let Json(params) = body.map_err(|e| AppError::Input(e.body_text()))?;
    run_search(&state, params).await
}

async fn run_search(
    state: &AppState,
    params: SearchParams,
) -> Result<Json<SearchResults>, AppError> {
    let query = params.query.unwrap_or_default();
    let collection = params
        .collection_name
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.collections.default.clone());
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let hits = search::semantic_search(state, &collection, &query, limit).await?;
    Ok(Json(search::format_hits(hits)))
}

#[derive(Debug, Deserialize)]
pub struct NutritionParams {
    pub query: Option<String>,
    pub limit: Option<u64>,
}

async fn nutrition_recommendation(
    State(state): State<AppState>,
    params: Result<Query<NutritionParams>, QueryRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Input(e.body_text()))?;
    let query = params.query.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let recommendation = nutrition::recommend(&state, &query, limit).await?;
    Ok(Json(recommendation))
}
