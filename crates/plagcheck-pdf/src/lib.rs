use std::panic::{AssertUnwindSafe, catch_unwind};

use plagcheck_core::{BackendError, PdfBackend};

#[cfg(any(test, feature = "test-util"))]
mod sample;
#[cfg(any(test, feature = "test-util"))]
pub use sample::sample_pdf;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Pure-Rust implementation of [`PdfBackend`] on top of `pdf-extract`.
///
/// Text is extracted page by page; each page is trimmed, blank pages are
/// dropped, and the rest are joined with a blank line.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfExtractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for PdfExtractBackend {
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError> {
        if !data.starts_with(PDF_MAGIC) {
            return Err(BackendError::OpenError("not a PDF document".into()));
        }

        // pdf-extract panics on some malformed inputs.
        let pages = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(data)
        }))
        .map_err(|_| BackendError::ExtractionError("malformed PDF".into()))?
        .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let text = join_pages(&pages);
        tracing::debug!(
            bytes = data.len(),
            pages = pages.len(),
            chars = text.len(),
            "extracted PDF text"
        );

        if text.is_empty() {
            return Err(BackendError::NoText);
        }
        Ok(text)
    }
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
