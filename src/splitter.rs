use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, ChunkConfigError, TextSplitter};

/// A piece of extracted text and where it came from. Stored verbatim as the
/// payload of its vector record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    pub filename: String,
    /// 1-based page number.
    pub page: u32,
    /// 1-based position of the chunk within its page.
    pub chunk: u32,
}

/// Character-sized splitter with a fixed overlap between neighbouring chunks.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        let config = ChunkConfig::new(chunk_size).with_overlap(chunk_overlap)?;
        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter.chunks(text).map(|s| s.to_string()).collect()
    }

    /// Splits each page on its own so no chunk spans a page break.
    pub fn split_pages(&self, pages: &[String], filename: &str) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            for (chunk_index, text) in self.split(page).into_iter().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                chunks.push(DocumentChunk {
                    text,
                    filename: filename.to_string(),
                    page: page_index as u32 + 1,
                    chunk: chunk_index as u32 + 1,
                });
            }
        }
        chunks
    }
}
