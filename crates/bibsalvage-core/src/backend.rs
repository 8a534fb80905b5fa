use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("document is encrypted")]
    Encrypted,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file packaged inside a PDF container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// True when `hint` names this attachment.
    ///
    /// A hint starting with `.` matches by extension, anything else by exact
    /// file name. Both comparisons ignore ASCII case.
    pub fn matches(&self, hint: &str) -> bool {
        attachment_name_matches(&self.name, hint)
    }
}

pub fn attachment_name_matches(name: &str, hint: &str) -> bool {
    let name = name.trim().to_lowercase();
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() {
        return false;
    }
    if hint.starts_with('.') {
        name.ends_with(&hint) && name.len() > hint.len()
    } else {
        name == hint
    }
}

/// An opened PDF document.
///
/// A handle is acquired from a [`PdfBackend`], borrowed by a single extraction
/// call and released when dropped. Implementations must not change observable
/// state through these methods.
pub trait PdfDocument {
    /// True when the document carries an encryption dictionary.
    fn is_encrypted(&self) -> bool;

    /// Text content of the first page. Empty for a document without pages.
    fn first_page_text(&self) -> Result<String, BackendError>;

    /// The first embedded file whose name matches `hint`.
    ///
    /// Returns `Ok(None)` when the document is encrypted or carries no
    /// matching attachment.
    fn find_attachment(&self, hint: &str) -> Result<Option<Attachment>, BackendError>;
}

/// Trait for PDF backends.
///
/// Implementors own the container format; the extraction strategies only see
/// [`PdfDocument`] handles.
pub trait PdfBackend: Send + Sync {
    /// Open a PDF file.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;

    /// Open a PDF held in memory.
    fn open_bytes(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_hint() {
        assert!(attachment_name_matches("references.bib", ".bib"));
        assert!(attachment_name_matches("REFS.BIB", ".bib"));
        assert!(!attachment_name_matches("references.bib.txt", ".bib"));
        assert!(!attachment_name_matches(".bib", ".bib"));
    }

    #[test]
    fn test_exact_name_hint() {
        let attachment = Attachment {
            name: "paper.bib".into(),
            data: vec![],
        };
        assert!(attachment.matches("Paper.bib"));
        assert!(!attachment.matches("other.bib"));
        assert!(!attachment.matches(""));
    }
}
