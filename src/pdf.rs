use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not a readable PDF: {0}")]
    Unreadable(String),
}

/// Pulls plain text out of an uploaded document, one string per page.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractError::Unreadable("missing %PDF header".to_string()));
        }
        // pdf-extract panics on some malformed inputs instead of returning an error.
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| ExtractError::Unreadable("parser aborted".to_string()))?
            .map_err(|e| ExtractError::Unreadable(e.to_string()))?;
        debug!(pages = pages.len(), "extracted pdf text");
        Ok(pages)
    }
}
