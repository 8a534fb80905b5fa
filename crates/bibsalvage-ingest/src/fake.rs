//! In-memory PDF handles for strategy and importer tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use bibsalvage_core::{Attachment, BackendError, PdfBackend, PdfDocument};

#[derive(Debug, Clone)]
pub(crate) struct FakeDocument {
    pub encrypted: bool,
    /// `None` makes text extraction fail, as a locked handle when `encrypted`.
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self {
            encrypted: false,
            text: Some(String::new()),
            attachments: Vec::new(),
        }
    }
}

impl FakeDocument {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_attachment(name: &str, data: &[u8]) -> Self {
        Self {
            attachments: vec![Attachment {
                name: name.to_string(),
                data: data.to_vec(),
            }],
            ..Self::default()
        }
    }
}

impl PdfDocument for FakeDocument {
    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn first_page_text(&self) -> Result<String, BackendError> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None if self.encrypted => Err(BackendError::Encrypted),
            None => Err(BackendError::ExtractionError("no text layer".into())),
        }
    }

    // Ignores `encrypted` so strategies are tested on their own checks.
    fn find_attachment(&self, hint: &str) -> Result<Option<Attachment>, BackendError> {
        Ok(self.attachments.iter().find(|a| a.matches(hint)).cloned())
    }
}

/// Hands out copies of one document and counts how often it was opened.
#[derive(Debug)]
pub(crate) struct FakeBackend {
    pub document: FakeDocument,
    pub opens: AtomicUsize,
}

impl FakeBackend {
    pub fn new(document: FakeDocument) -> Self {
        Self {
            document,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl PdfBackend for FakeBackend {
    fn open(&self, _path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        self.open_bytes(&[])
    }

    fn open_bytes(&self, _bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.document.clone()))
    }
}
