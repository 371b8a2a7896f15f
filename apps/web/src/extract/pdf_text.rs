//! Plain-text extraction from an in-memory PDF.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";
/// Readers accept junk (BOM, blank lines, mail headers) before the header.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not a PDF document")]
    NotPdf,

    #[error("could not read PDF: {0}")]
    Parse(String),

    #[error("PDF parser failed on this document")]
    Panicked,
}

/// Offset of the `%PDF-` header within the first kilobyte, if any.
pub fn header_offset(bytes: &[u8]) -> Option<usize> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .position(|candidate| candidate == PDF_MAGIC)
}

/// Extracts the text of every page, in page order, concatenated as-is.
///
/// Either the whole document is read or an error is returned; there is no
/// partial-text fallback. The parser is isolated with `catch_unwind` because
/// malformed documents can make it panic.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // Byte offsets inside the file count from the header, not from the leading junk
    let offset = header_offset(bytes).ok_or(ExtractError::NotPdf)?;
    let bytes = &bytes[offset..];

    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::Panicked)?
    .map_err(|e| ExtractError::Parse(e.to_string()))?;

    Ok(pages.concat())
}
