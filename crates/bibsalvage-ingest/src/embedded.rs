use bibsalvage_bib::BibtexParser;
use bibsalvage_core::config_file::DEFAULT_ATTACHMENT_HINT;
use bibsalvage_core::{BibEntry, BibTextParser, PdfDocument};

use crate::extractor::{ExtractError, PdfBibExtractor};

/// Reads a bibliography file attached to the PDF container.
///
/// Encrypted documents and documents without a matching attachment yield no
/// entries. A matching attachment that fails to parse is an error.
#[derive(Debug, Clone)]
pub struct EmbeddedBibExtractor<P = BibtexParser> {
    parser: P,
    hint: String,
}

impl Default for EmbeddedBibExtractor {
    fn default() -> Self {
        Self::with_parser(BibtexParser)
    }
}

impl EmbeddedBibExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: BibTextParser> EmbeddedBibExtractor<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            hint: DEFAULT_ATTACHMENT_HINT.to_string(),
        }
    }

    /// Attachment name to look for; `.ext` matches by extension.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }
}

impl<P: BibTextParser> PdfBibExtractor for EmbeddedBibExtractor<P> {
    fn extract(&self, doc: &dyn PdfDocument) -> Result<Vec<BibEntry>, ExtractError> {
        if doc.is_encrypted() {
            tracing::debug!("skipping embedded lookup in encrypted document");
            return Ok(Vec::new());
        }
        let Some(attachment) = doc.find_attachment(&self.hint)? else {
            tracing::debug!(hint = %self.hint, "no matching attachment");
            return Ok(Vec::new());
        };
        tracing::debug!(name = %attachment.name, "parsing embedded bibliography");
        let text = decode_attachment(&attachment.data);
        Ok(self.parser.parse_entries(&text)?)
    }
}

fn decode_attachment(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.strip_prefix('\u{FEFF}').unwrap_or(&*text).to_string()
}
