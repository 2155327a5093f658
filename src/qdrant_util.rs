use crate::config::QdrantSettings;
use crate::splitter::DocumentChunk;
use crate::vector_store::{ScoredChunk, VectorRecord, VectorStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    pub fn connect(settings: &QdrantSettings) -> Result<Self> {
        info!(url = %settings.url, "connecting to Qdrant");
        let client = Qdrant::from_url(&settings.url)
            .api_key(settings.api_key.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("building Qdrant client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        self.client
            .collection_exists(collection)
            .await
            .with_context(|| format!("checking collection '{collection}'"))
    }

    async fn create_collection(&self, collection: &str, vector_size: u64) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .with_context(|| format!("creating collection '{collection}'"))?;
        info!(collection, vector_size, "created collection in Qdrant");
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let count = records.len();
        let points = records
            .into_iter()
            .map(to_point)
            .collect::<Result<Vec<PointStruct>>>()?;
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .with_context(|| format!("upserting {count} points into '{collection}'"))?;
        debug!(collection, count, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredChunk>> {
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .with_context(|| format!("searching '{collection}'"))?;
        Ok(response.result.into_iter().map(from_point).collect())
    }
}

fn to_point(record: VectorRecord) -> Result<PointStruct> {
    let payload: Payload = serde_json::to_value(&record.payload)?
        .try_into()
        .context("serializing chunk payload")?;
    Ok(PointStruct::new(
        record.id.to_string(),
        record.vector,
        payload,
    ))
}

fn from_point(point: ScoredPoint) -> ScoredChunk {
    ScoredChunk {
        score: point.score,
        payload: payload_to_chunk(&point.payload),
    }
}

// Points written by other tools may lack some keys; missing ones read as empty.
fn payload_to_chunk(payload: &HashMap<String, Value>) -> DocumentChunk {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .cloned()
            .unwrap_or_default()
    };
    let number = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_integer)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    };
    DocumentChunk {
        text: text("text"),
        filename: text("filename"),
        page: number("page"),
        chunk: number("chunk"),
    }
}
