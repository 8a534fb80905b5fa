use thiserror::Error;

use bibsalvage_core::{BackendError, BibEntry, ParseError, PdfDocument};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF backend error: {0}")]
    Io(#[from] BackendError),
    #[error("BibTeX parse error: {0}")]
    Parse(#[from] ParseError),
}

/// A strategy for recovering bibliographic entries from an opened PDF.
///
/// Extractors only borrow the document; the caller owns the handle and drops
/// it after the call.
pub trait PdfBibExtractor: Send + Sync {
    /// Entries in order of discovery. Finding nothing is `Ok(vec![])`.
    fn extract(&self, doc: &dyn PdfDocument) -> Result<Vec<BibEntry>, ExtractError>;
}

impl<E: PdfBibExtractor + ?Sized> PdfBibExtractor for Box<E> {
    fn extract(&self, doc: &dyn PdfDocument) -> Result<Vec<BibEntry>, ExtractError> {
        (**self).extract(doc)
    }
}
