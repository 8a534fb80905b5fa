use std::path::Path;

use thiserror::Error;

use bibsalvage_bib::BibFileError;
use bibsalvage_cleanup::CleanupWorker;
use bibsalvage_core::Settings;

pub mod embedded;
pub mod extractor;
pub mod importer;
pub mod verbatim;

#[cfg(test)]
mod fake;

pub use embedded::EmbeddedBibExtractor;
pub use extractor::{ExtractError, PdfBibExtractor};
pub use importer::{Candidate, Origin, PdfImporter};
pub use verbatim::VerbatimBibExtractor;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("PDF extraction error: {0}")]
    Pdf(#[from] ExtractError),
    #[error("BibTeX file error: {0}")]
    Bib(#[from] BibFileError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of bibsalvage-ingest)")]
    NoPdfSupport,
}

/// Recover entries from a PDF or BIB file.
///
/// Dispatches on file extension:
/// - `.bib` → BibTeX parser
/// - anything else → PDF importer (requires `pdf` feature / lopdf)
///
/// The cleanup jobs in `settings` run on every entry.
pub fn extract_entries(path: &Path, settings: &Settings) -> Result<Vec<Candidate>, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "bib" => {
            let worker = CleanupWorker::from_kinds(&settings.cleanup_jobs);
            let entries = bibsalvage_bib::parse_file(path)?;
            Ok(entries
                .into_iter()
                .map(|entry| Candidate::new(Origin::Bib, entry, &worker))
                .collect())
        }
        _ => extract_pdf(path, settings),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path, settings: &Settings) -> Result<Vec<Candidate>, IngestError> {
    let importer = PdfImporter::from_settings(bibsalvage_pdf_lopdf::LopdfBackend, settings);
    Ok(importer.import_path(path)?)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path, _settings: &Settings) -> Result<Vec<Candidate>, IngestError> {
    Err(IngestError::NoPdfSupport)
}
