//! Entry model, change tracking and identifier grammars shared by the
//! bibsalvage crates.

pub mod backend;
pub mod change;
pub mod config_file;
pub mod entry;
pub mod field;
pub mod identifiers;
pub mod parser;

// Re-export for convenience
pub use backend::{Attachment, BackendError, PdfBackend, PdfDocument};
pub use change::{ChangeLog, FieldChange};
pub use config_file::{CleanupJobKind, ExtractorKind, Settings};
pub use entry::{BibEntry, EntryId, EntryType};
pub use field::Field;
pub use identifiers::{ArxivIdentifier, Doi, EPRINT_TYPE};
pub use parser::{BibTextParser, ParseError};
