use bibsalvage_bib::BibtexParser;
use bibsalvage_core::{BackendError, BibEntry, BibTextParser, PdfDocument};

use crate::extractor::{ExtractError, PdfBibExtractor};

/// Reads BibTeX typed as literal text on the first page.
///
/// Prose around the entry is tolerated, and whatever the parser kept as the
/// entry's preceding comment is dropped. A locked encrypted document yields
/// no entries.
#[derive(Debug, Clone, Default)]
pub struct VerbatimBibExtractor<P = BibtexParser> {
    parser: P,
}

impl VerbatimBibExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: BibTextParser> VerbatimBibExtractor<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: BibTextParser> PdfBibExtractor for VerbatimBibExtractor<P> {
    fn extract(&self, doc: &dyn PdfDocument) -> Result<Vec<BibEntry>, ExtractError> {
        let text = match doc.first_page_text() {
            Ok(text) => text,
            Err(BackendError::Encrypted) => {
                tracing::debug!("first page of encrypted document is unreadable");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut entries = self.parser.parse_entries(&text)?;
        for entry in &mut entries {
            entry.clear_preceding_comment();
        }
        if entries.is_empty() {
            tracing::debug!("no BibTeX text on the first page");
        }
        Ok(entries)
    }
}
