//! services/api/src/adapters/pdf.rs
//!
//! Extracts plain text from an uploaded prescription PDF.

use medminder_core::ports::{PortError, PortResult};

/// Extracts the text of every page of `pdf_bytes` and concatenates it.
///
/// Fails with `InvalidInput` when the PDF is malformed. The extracted text
/// may still be empty (e.g. a pure image scan); the ingest step rejects that
/// case so an upload never produces a silently empty index.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> PortResult<String> {
    pdf_extract::extract_text_from_mem(pdf_bytes)
        .map_err(|e| PortError::InvalidInput(format!("Failed to parse PDF: {}", e)))
}
