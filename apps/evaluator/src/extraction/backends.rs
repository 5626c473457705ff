//! Format-specific text backends. The docx and pdf backends are cargo features; when a
//! feature is off its backend still exists but reports itself unavailable.

use std::path::Path;

use thiserror::Error;

use super::DocumentFormat;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("The {} backend is not available in this build", .0.label())]
    Unavailable(DocumentFormat),
}

pub trait DocumentBackend: Send + Sync {
    fn format(&self) -> DocumentFormat;

    fn is_available(&self) -> bool;

    /// Reads `path` and returns its visible text in source order.
    /// The file handle is released before returning.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Plain text
// ────────────────────────────────────────────────────────────────────────────

pub struct PlainTextBackend;

impl DocumentBackend for PlainTextBackend {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::PlainText
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| BackendError::Decode(format!("file is not valid UTF-8: {e}")))?;

        // Editors on Windows like to prepend a byte order mark.
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

pub struct DocxBackend;

impl DocumentBackend for DocxBackend {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "docx")
    }

    #[cfg(feature = "docx")]
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        use docx_rs::DocumentChild;

        let bytes = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&bytes)
            .map_err(|e| BackendError::Decode(format!("invalid docx document: {e}")))?;

        // Top-level paragraphs only; tables and other blocks are skipped.
        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
                _ => None,
            })
            .collect();

        Ok(paragraphs.join("\n"))
    }

    #[cfg(not(feature = "docx"))]
    fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(DocumentFormat::Docx))
    }
}

/// Paragraph → Run → Text. Runs belong to the same line, so they are joined without a separator.
/// Hyperlinks and tracked insertions wrap their own runs and are read in place.
#[cfg(feature = "docx")]
fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    push_paragraph_children(&paragraph.children, &mut text);
    text
}

#[cfg(feature = "docx")]
fn push_paragraph_children(children: &[docx_rs::ParagraphChild], text: &mut String) {
    use docx_rs::{InsertChild, ParagraphChild};

    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, text),
            ParagraphChild::Hyperlink(link) => push_paragraph_children(&link.children, text),
            ParagraphChild::Insert(insert) => {
                for insert_child in &insert.children {
                    if let InsertChild::Run(run) = insert_child {
                        push_run_text(run, text);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(feature = "docx")]
fn push_run_text(run: &docx_rs::Run, text: &mut String) {
    use docx_rs::RunChild;

    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) | RunChild::CarriageReturn(_) => text.push('\n'),
            _ => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

pub struct PdfBackend;

impl DocumentBackend for PdfBackend {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "pdf")
    }

    #[cfg(feature = "pdf")]
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path)?;

        // pdf-extract panics on some malformed documents instead of returning an error.
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(BackendError::Decode(format!("invalid pdf document: {e}"))),
            Err(_) => Err(BackendError::Decode(
                "pdf parser aborted on malformed input".to_string(),
            )),
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(DocumentFormat::Pdf))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test fixtures
// ────────────────────────────────────────────────────────────────────────────
