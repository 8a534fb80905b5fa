use thiserror::Error;

use crate::entry::BibEntry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: entry `@{entry_type}` is never closed")]
    Unterminated { line: usize, entry_type: String },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl ParseError {
    /// 1-based line of the entry that failed.
    pub fn line(&self) -> usize {
        match self {
            ParseError::Unterminated { line, .. } | ParseError::Malformed { line, .. } => *line,
        }
    }
}

/// Text-mode bibliographic parser.
///
/// Implementations must tolerate prose around entries; only text that looks
/// like an entry but cannot be read as one is an error.
pub trait BibTextParser: Send + Sync {
    /// Parse every entry in `text`, in order of appearance.
    fn parse_entries(&self, text: &str) -> Result<Vec<BibEntry>, ParseError>;
}

impl<P: BibTextParser + ?Sized> BibTextParser for &P {
    fn parse_entries(&self, text: &str) -> Result<Vec<BibEntry>, ParseError> {
        (**self).parse_entries(text)
    }
}

impl<P: BibTextParser + ?Sized> BibTextParser for Box<P> {
    fn parse_entries(&self, text: &str) -> Result<Vec<BibEntry>, ParseError> {
        (**self).parse_entries(text)
    }
}

impl<P: BibTextParser + ?Sized> BibTextParser for std::sync::Arc<P> {
    fn parse_entries(&self, text: &str) -> Result<Vec<BibEntry>, ParseError> {
        (**self).parse_entries(text)
    }
}
