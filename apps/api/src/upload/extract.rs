//! Text extraction from uploaded CV files.
//!
//! Dispatch is by declared extension; the format decoders are fallible black
//! boxes — a corrupt or encrypted document fails the whole file. Oversized
//! but valid text is truncated, never rejected.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

use crate::models::MAX_TEXT_LENGTH;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: .{0}")]
    Unsupported(String),

    #[error("file is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("failed to extract text from document: {0}")]
    Docx(String),

    #[error("no text could be extracted")]
    Empty,
}

/// Extracts plain text from `data` according to its declared extension
/// (lowercase, no dot) and truncates to [`MAX_TEXT_LENGTH`] characters.
pub fn extract_text(data: &[u8], extension: &str) -> Result<String, ExtractionError> {
    let text = match extension {
        "txt" => std::str::from_utf8(data)
            .map_err(|_| ExtractionError::InvalidUtf8)?
            .to_string(),
        "pdf" => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        // Legacy .doc has no decoder in this stack; files named .doc only
        // extract when they are actually DOCX containers.
        "docx" | "doc" => docx_text(data)?,
        other => return Err(ExtractionError::Unsupported(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }

    Ok(truncate_chars(text, MAX_TEXT_LENGTH))
}

/// Walks the DOCX document tree collecting run text, one line per paragraph.
fn docx_text(data: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(data).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for para_child in paragraph.children {
                if let ParagraphChild::Run(run) = para_child {
                    for run_child in run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(text)
}

/// Truncates on a character boundary; byte-indexed slicing would panic on
/// multi-byte input.
fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_extraction_is_direct_decode() {
        let text = extract_text("Plain CV text".as_bytes(), "txt").unwrap();
        assert_eq!(text, "Plain CV text");
    }

    #[test]
    fn test_txt_invalid_utf8_fails() {
        let err = extract_text(&[0xff, 0xfe, 0x00], "txt").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidUtf8));
    }

    #[test]
    fn test_blank_text_is_an_error() {
        let err = extract_text("   \n\t ".as_bytes(), "txt").unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[test]
    fn test_corrupt_pdf_fails_whole_file() {
        let err = extract_text(b"not a pdf at all", "pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_corrupt_docx_fails_whole_file() {
        let err = extract_text(b"not a zip container", "docx").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_legacy_doc_goes_through_docx_decoder() {
        let err = extract_text(b"\xd0\xcf\x11\xe0old word binary", "doc").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let err = extract_text(b"anything", "png").unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(_)));
    }

    #[test]
    fn test_oversized_text_truncates_instead_of_failing() {
        let long = "a".repeat(MAX_TEXT_LENGTH + 1000);
        let text = extract_text(long.as_bytes(), "txt").unwrap();
        assert_eq!(text.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(text, 3), "ééé");
    }
}
