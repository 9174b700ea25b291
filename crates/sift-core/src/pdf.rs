//! Statement PDF text extraction
//!
//! Uploads are text-extracted before anything touches the database, so a
//! rejected document never leaves a statement row behind.

use crate::error::{Error, Result};

/// Ceiling on extracted statement text, in characters.
/// Keeps extraction-service prompts bounded.
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Check the PDF magic bytes (`%PDF`).
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Extract text from an in-memory PDF and validate it for processing.
///
/// Errors: not a PDF or unparseable (`Document`), no extractable text
/// (`EmptyDocument`), over the character ceiling (`DocumentTooLarge`).
pub fn extract_statement_text(bytes: &[u8]) -> Result<String> {
    if !is_pdf(bytes) {
        return Err(Error::Document("Not a PDF document".into()));
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Document(format!("Failed to parse PDF: {}", e)))?;

    validate_statement_text(&text)?;
    Ok(text)
}

/// Validate already-extracted text (used for plain-text CLI imports too).
pub fn validate_statement_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument);
    }
    if text.len() > MAX_CONTENT_CHARS {
        return Err(Error::DocumentTooLarge {
            actual: text.len(),
            limit: MAX_CONTENT_CHARS,
        });
    }
    Ok(())
}
