//! Content Extractor: turns a JD or resume file into plain text for the prompt.
//!
//! Extraction is best-effort: apart from a missing file, every failure is reported as an
//! `ExtractedText` whose `status` is not `Ok` and whose `text` explains what went wrong.
//! The evaluation still runs with that explanation in place of the document.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::EvaluationError;

pub mod backends;

pub use backends::{BackendError, DocumentBackend, DocxBackend, PdfBackend, PlainTextBackend};

// ────────────────────────────────────────────────────────────────────────────
// Document references
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Infers the format from the lowercase file extension.
    /// `.txt`, unknown and missing extensions are all read as plain text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("docx") => DocumentFormat::Docx,
            Some("pdf") => DocumentFormat::Pdf,
            _ => DocumentFormat::PlainText,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "plain text",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" | "text" | "plain_text" => Ok(DocumentFormat::PlainText),
            "docx" => Ok(DocumentFormat::Docx),
            "pdf" => Ok(DocumentFormat::Pdf),
            other => Err(format!("unknown document format '{other}'")),
        }
    }
}

/// A document to evaluate, as named by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    /// Declares the format explicitly instead of inferring it from the extension.
    pub fn with_format(path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_else(|| self.format.label().to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Ok,
    UnsupportedFormat,
    IoError,
    DecodeError,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub source: DocumentRef,
    /// Document text on `Ok`, otherwise a human-readable explanation.
    pub text: String,
    pub status: ExtractionStatus,
}

impl ExtractedText {
    fn new(source: &DocumentRef, text: String, status: ExtractionStatus) -> Self {
        Self {
            source: source.clone(),
            text,
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend registry
// ────────────────────────────────────────────────────────────────────────────

/// One backend per document format. Availability is known up front, so a missing
/// docx/pdf backend is reported at startup rather than discovered mid-extraction.
pub struct BackendRegistry {
    backends: Vec<Box<dyn DocumentBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: vec![
                Box::new(PlainTextBackend),
                Box::new(DocxBackend),
                Box::new(PdfBackend),
            ],
        }
    }

    /// Withholds the backend for `format`, as if it had not been compiled in.
    #[cfg(test)]
    pub fn without(mut self, format: DocumentFormat) -> Self {
        self.backends.retain(|b| b.format() != format);
        self
    }

    /// Returns the backend for `format` only if it can actually run.
    pub fn backend_for(&self, format: DocumentFormat) -> Option<&dyn DocumentBackend> {
        self.backends
            .iter()
            .find(|b| b.format() == format && b.is_available())
            .map(|b| b.as_ref())
    }

    pub fn availability(&self) -> Vec<(DocumentFormat, bool)> {
        [
            DocumentFormat::PlainText,
            DocumentFormat::Docx,
            DocumentFormat::Pdf,
        ]
        .into_iter()
        .map(|format| (format, self.backend_for(format).is_some()))
        .collect()
    }

    pub fn log_availability(&self) {
        for (format, available) in self.availability() {
            if available {
                info!("Document backend ready: {}", format.label());
            } else {
                warn!(
                    "Document backend unavailable: {} (such files will be replaced by a placeholder)",
                    format.label()
                );
            }
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the text of `doc`.
///
/// Fails only when the path does not exist. Every other problem is folded into the
/// returned `ExtractedText` so the pipeline can continue with degraded input.
pub fn extract(
    registry: &BackendRegistry,
    doc: &DocumentRef,
) -> Result<ExtractedText, EvaluationError> {
    if !doc.path.exists() {
        return Err(EvaluationError::DocumentNotFound(doc.path.clone()));
    }

    let Some(backend) = registry.backend_for(doc.format) else {
        return Ok(unsupported(doc));
    };

    let extracted = match backend.extract_text(&doc.path) {
        Ok(text) if text.trim().is_empty() => ExtractedText::new(
            doc,
            format!("No extractable text found in {}", doc.path.display()),
            ExtractionStatus::DecodeError,
        ),
        Ok(text) => ExtractedText::new(doc, text, ExtractionStatus::Ok),
        Err(BackendError::Io(e)) => ExtractedText::new(
            doc,
            format!("Error reading file {}: {e}", doc.path.display()),
            ExtractionStatus::IoError,
        ),
        Err(BackendError::Decode(msg)) => ExtractedText::new(
            doc,
            format!("Error decoding file {}: {msg}", doc.path.display()),
            ExtractionStatus::DecodeError,
        ),
        Err(BackendError::Unavailable(_)) => unsupported(doc),
    };

    debug!(
        path = %doc.path.display(),
        format = doc.format.label(),
        status = ?extracted.status,
        chars = extracted.text.chars().count(),
        "Extraction finished"
    );

    Ok(extracted)
}

fn unsupported(doc: &DocumentRef) -> ExtractedText {
    ExtractedText::new(
        doc,
        format!(
            "Cannot process {} file: the {} backend is not available in this build",
            doc.extension(),
            doc.format.label()
        ),
        ExtractionStatus::UnsupportedFormat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_inferred_from_lowercase_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("resume.DOCX")),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("jd.Pdf")),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("jd.txt")),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_unknown_and_missing_extensions_are_plain_text() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("resume.md")),
            DocumentFormat::PlainText
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("resume")),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_declared_format_overrides_extension() {
        let doc = DocumentRef::with_format("export.bin", DocumentFormat::Pdf);
        assert_eq!(doc.format, DocumentFormat::Pdf);
    }

    #[test]
    fn test_format_parses_from_declared_name() {
        assert_eq!("PDF".parse::<DocumentFormat>(), Ok(DocumentFormat::Pdf));
        assert_eq!(".docx".parse::<DocumentFormat>(), Ok(DocumentFormat::Docx));
        assert_eq!("text".parse::<DocumentFormat>(), Ok(DocumentFormat::PlainText));
        assert!("rtf".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn test_extract_txt_returns_content_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "jd.txt", "Java backend engineer\n3-5 years".as_bytes());

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::Ok);
        assert_eq!(extracted.text, "Java backend engineer\n3-5 years");
        assert_eq!(extracted.source.path, path);
    }

    #[test]
    fn test_extract_unknown_extension_reads_as_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.md", "# Python developer".as_bytes());

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert!(extracted.is_ok());
        assert_eq!(extracted.text, "# Python developer");
    }

    #[test]
    fn test_extract_preserves_non_ascii_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "jd.txt", "Java后端开发，3-5年经验".as_bytes());

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.text, "Java后端开发，3-5年经验");
    }

    #[test]
    fn test_extract_missing_file_is_not_found_for_every_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["missing.txt", "missing.docx", "missing.pdf", "missing.rtf"] {
            let doc = DocumentRef::new(dir.path().join(name));
            let err = extract(&BackendRegistry::new(), &doc).unwrap_err();
            assert!(
                matches!(err, EvaluationError::DocumentNotFound(ref p) if p == &doc.path),
                "Expected NotFound for {name}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_extract_invalid_utf8_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.txt", &[0xff, 0xfe, 0x00, 0xc3, 0x28]);

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::DecodeError);
        assert!(extracted.text.contains("UTF-8"), "{}", extracted.text);
    }

    #[test]
    fn test_extract_whitespace_only_file_is_not_ok() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.txt", b"  \n\t\n");

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::DecodeError);
        assert!(extracted.text.contains("No extractable text"));
    }

    #[test]
    fn test_extract_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("folder.txt");
        fs::create_dir(&sub).unwrap();

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&sub)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::IoError);
        assert!(extracted.text.starts_with("Error reading file"));
    }

    #[test]
    fn test_missing_docx_backend_is_unsupported_not_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.docx", b"not really a docx");
        let registry = BackendRegistry::new().without(DocumentFormat::Docx);

        let extracted = extract(&registry, &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::UnsupportedFormat);
        assert!(extracted.text.contains(".docx"), "{}", extracted.text);
    }

    #[test]
    fn test_missing_pdf_backend_is_unsupported_not_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "jd.PDF", b"%PDF-1.4");
        let registry = BackendRegistry::new().without(DocumentFormat::Pdf);

        let extracted = extract(&registry, &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::UnsupportedFormat);
        assert!(extracted.text.contains(".pdf"), "{}", extracted.text);
    }

    #[test]
    fn test_availability_reports_withheld_backends() {
        let registry = BackendRegistry::new().without(DocumentFormat::Pdf);
        let availability = registry.availability();
        assert!(availability.contains(&(DocumentFormat::PlainText, true)));
        assert!(availability.contains(&(DocumentFormat::Pdf, false)));
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_extract_docx_joins_paragraphs_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.docx");
        backends::test_fixtures::write_docx(&path, &["Python developer", "No Java experience"]);

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::Ok);
        assert_eq!(extracted.text, "Python developer\nNo Java experience");
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_extract_corrupt_docx_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.docx", b"this is not a zip archive");

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::DecodeError);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_extract_pdf_returns_page_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jd.pdf");
        backends::test_fixtures::write_pdf(&path, &["Java backend engineer"]);

        let extracted = extract(&BackendRegistry::new(), &DocumentRef::new(&path)).unwrap();
        assert_eq!(extracted.status, ExtractionStatus::Ok);
        assert!(extracted.text.contains("Java"), "{}", extracted.text);
        assert!(extracted.text.contains("backend"), "{}", extracted.text);
    }
}
