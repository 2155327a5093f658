#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use pdf_semantic_search_service::config::CollectionSettings;
use pdf_semantic_search_service::embedding::Embedder;
use pdf_semantic_search_service::llm::{ChatModel, LlmError};
use pdf_semantic_search_service::pdf::{ExtractError, TextExtractor};
use pdf_semantic_search_service::splitter::{Chunker, DocumentChunk};
use pdf_semantic_search_service::vector_store::{ScoredChunk, VectorRecord, VectorStore};
use pdf_semantic_search_service::{app, AppState};
use serde_json::Value;

pub const DIM: usize = 64;
pub const CHUNK_SIZE: usize = 200;
pub const CHUNK_OVERLAP: usize = 20;

/// Bag-of-words hashing embedder: identical texts get identical unit vectors.
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn dimension(&self) -> u64 {
        DIM as u64
    }

    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hash_vector(t)).collect())
    }
}

fn hash_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in word.to_lowercase().bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x100000001b3);
        }
        v[(h % DIM as u64) as usize] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, (u64, Vec<VectorRecord>)>>,
    /// Upserts left before every further one fails; `None` never fails.
    upserts_before_failure: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn fail_upserts_after(&self, successes: usize) {
        *self.upserts_before_failure.lock().unwrap() = Some(successes);
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, |(_, records)| records.len())
    }

    pub fn dimension(&self, collection: &str) -> Option<u64> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|(dim, _)| *dim)
    }

    pub fn has(&self, collection: &str) -> bool {
        self.collections.lock().unwrap().contains_key(collection)
    }

    pub fn seed(&self, collection: &str, chunks: &[DocumentChunk]) {
        let records = chunks
            .iter()
            .map(|c| VectorRecord {
                id: uuid::Uuid::new_v4(),
                vector: hash_vector(&c.text),
                payload: c.clone(),
            })
            .collect();
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), (DIM as u64, records));
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.has(collection))
    }

    async fn create_collection(&self, collection: &str, vector_size: u64) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(collection) {
            bail!("collection {collection} already exists");
        }
        collections.insert(collection.to_string(), (vector_size, Vec::new()));
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if let Some(left) = self.upserts_before_failure.lock().unwrap().as_mut() {
            if *left == 0 {
                bail!("connection reset by peer");
            }
            *left -= 1;
        }
        let mut collections = self.collections.lock().unwrap();
        let (dim, stored) = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow!("collection {collection} not found"))?;
        if records.iter().any(|r| r.vector.len() as u64 != *dim) {
            bail!("wrong vector dimension");
        }
        stored.extend(records);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.lock().unwrap();
        let (_, stored) = collections
            .get(collection)
            .ok_or_else(|| anyhow!("collection {collection} not found"))?;
        let mut hits: Vec<ScoredChunk> = stored
            .iter()
            .map(|r| ScoredChunk {
                score: r.vector.iter().zip(&vector).map(|(a, b)| a * b).sum(),
                payload: r.payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit as usize);
        Ok(hits)
    }
}

/// Treats uploads as `%PDF` followed by form-feed separated page texts.
pub struct FakePdf;

impl FakePdf {
    pub fn encode(pages: &[&str]) -> Vec<u8> {
        format!("%PDF-fake\n{}", pages.join("\x0c")).into_bytes()
    }

    pub fn pages(pages: &[&str]) -> Vec<String> {
        pages.iter().map(|p| p.to_string()).collect()
    }
}

impl TextExtractor for FakePdf {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::Unreadable(e.to_string()))?;
        let body = text
            .strip_prefix("%PDF-fake\n")
            .ok_or_else(|| ExtractError::Unreadable("missing %PDF header".to_string()))?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(body.split('\x0c').map(str::to_string).collect())
    }
}

pub struct ScriptedLlm {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Timeout)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub chunker: Arc<Chunker>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_llm(ScriptedLlm::replying("{}"))
    }

    pub fn with_llm(llm: ScriptedLlm) -> Self {
        Self::build(llm, 10 * 1024 * 1024)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(ScriptedLlm::replying("{}"), max_upload_bytes)
    }

    fn build(llm: ScriptedLlm, max_upload_bytes: usize) -> Self {
        let store = Arc::new(MemoryStore::default());
        let llm = Arc::new(llm);
        let chunker = Arc::new(Chunker::new(CHUNK_SIZE, CHUNK_OVERLAP).unwrap());
        let state = AppState {
            embedder: Arc::new(HashEmbedder),
            store: store.clone(),
            llm: llm.clone(),
            extractor: Arc::new(FakePdf),
            chunker: chunker.clone(),
            collections: CollectionSettings::default(),
            max_upload_bytes,
        };
        Self {
            router: app(state),
            store,
            llm,
            chunker,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (u16, Value) {
        use tower::ServiceExt;

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn upload(&self, filename: &str, bytes: &[u8], collection: Option<&str>) -> (u16, Value) {
        self.send(multipart_upload(filename, bytes, collection)).await
    }
}

const BOUNDARY: &str = "X-TEST-BOUNDARY";

pub fn multipart_upload(filename: &str, bytes: &[u8], collection: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(name) = collection {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"collection_name\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-pdf/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Percent-encodes a query-string value.
pub fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub fn sentences(topic: &str, n: usize) -> String {
    (1..=n)
        .map(|i| format!("Sentence {i} explains {topic} in detail."))
        .collect::<Vec<_>>()
        .join(" ")
}
