use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionError(String),
    #[error("No text content found in PDF")]
    NoText,
}

/// Trait for PDF text extraction backends.
///
/// The orchestrator only ever sees the resulting string; page layout and
/// document structure stay inside the implementor.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of an in-memory PDF document.
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError>;
}
