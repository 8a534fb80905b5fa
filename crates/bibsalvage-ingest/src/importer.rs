use std::fmt;
use std::path::Path;

use serde::Serialize;

use bibsalvage_cleanup::{CleanupJob, CleanupWorker};
use bibsalvage_core::{
    BackendError, BibEntry, ExtractorKind, FieldChange, PdfBackend, PdfDocument, Settings,
};

use crate::embedded::EmbeddedBibExtractor;
use crate::extractor::{ExtractError, PdfBibExtractor};
use crate::verbatim::VerbatimBibExtractor;

/// Where a candidate entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A `.bib` file read directly.
    Bib,
    Verbatim,
    Embedded,
}

impl From<ExtractorKind> for Origin {
    fn from(kind: ExtractorKind) -> Self {
        match kind {
            ExtractorKind::Verbatim => Origin::Verbatim,
            ExtractorKind::Embedded => Origin::Embedded,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Bib => "bib",
            Origin::Verbatim => "verbatim",
            Origin::Embedded => "embedded",
        })
    }
}

/// An entry recovered from a source, with the changes cleanup made to it.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub origin: Origin,
    pub entry: BibEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl Candidate {
    /// Run `worker` over the entry and record what it changed.
    pub fn new(origin: Origin, mut entry: BibEntry, worker: &CleanupWorker) -> Self {
        let changes = worker.cleanup(&mut entry);
        Self {
            origin,
            entry,
            changes,
        }
    }
}

/// Runs the configured extraction strategies over one PDF.
///
/// Each strategy gets its own freshly opened document handle, dropped as soon
/// as the strategy returns. Candidates are returned in strategy order.
pub struct PdfImporter {
    backend: Box<dyn PdfBackend>,
    extractors: Vec<(ExtractorKind, Box<dyn PdfBibExtractor>)>,
    cleanup: CleanupWorker,
}

impl PdfImporter {
    /// Both strategies with the default parser and hint, no cleanup.
    pub fn new(backend: impl PdfBackend + 'static) -> Self {
        Self::from_settings(
            backend,
            &Settings {
                cleanup_jobs: Vec::new(),
                ..Settings::default()
            },
        )
    }

    pub fn from_settings(backend: impl PdfBackend + 'static, settings: &Settings) -> Self {
        let mut importer = Self {
            backend: Box::new(backend),
            extractors: Vec::new(),
            cleanup: CleanupWorker::from_kinds(&settings.cleanup_jobs),
        };
        for &kind in &settings.strategies {
            let extractor: Box<dyn PdfBibExtractor> = match kind {
                ExtractorKind::Verbatim => Box::new(VerbatimBibExtractor::new()),
                ExtractorKind::Embedded => Box::new(
                    EmbeddedBibExtractor::new().with_hint(settings.attachment_hint.clone()),
                ),
            };
            importer.extractors.push((kind, extractor));
        }
        importer
    }

    /// Replace the strategy registered for `kind`, or append it.
    pub fn with_extractor(
        mut self,
        kind: ExtractorKind,
        extractor: impl PdfBibExtractor + 'static,
    ) -> Self {
        let extractor: Box<dyn PdfBibExtractor> = Box::new(extractor);
        match self.extractors.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = extractor,
            None => self.extractors.push((kind, extractor)),
        }
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupWorker) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn strategies(&self) -> Vec<ExtractorKind> {
        self.extractors.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn import_path(&self, path: &Path) -> Result<Vec<Candidate>, ExtractError> {
        tracing::debug!(path = %path.display(), "importing PDF");
        self.import_with(|backend| backend.open(path))
    }

    pub fn import_bytes(&self, bytes: &[u8]) -> Result<Vec<Candidate>, ExtractError> {
        self.import_with(|backend| backend.open_bytes(bytes))
    }

    fn import_with(
        &self,
        open: impl Fn(&dyn PdfBackend) -> Result<Box<dyn PdfDocument>, BackendError>,
    ) -> Result<Vec<Candidate>, ExtractError> {
        let mut candidates = Vec::new();

        for (kind, extractor) in &self.extractors {
            let entries = {
                let doc = open(self.backend.as_ref())?;
                extractor.extract(doc.as_ref())?
            };
            tracing::debug!(strategy = %kind, entries = entries.len(), "strategy finished");

            let origin = Origin::from(*kind);
            candidates.extend(
                entries
                    .into_iter()
                    .map(|entry| Candidate::new(origin, entry, &self.cleanup)),
            );
        }

        tracing::info!(
            candidates = candidates.len(),
            strategies = self.extractors.len(),
            "PDF import finished"
        );
        Ok(candidates)
    }
}

impl fmt::Debug for PdfImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfImporter")
            .field("strategies", &self.strategies())
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBackend, FakeDocument};
    use bibsalvage_core::{Attachment, CleanupJobKind, Field};
    use std::sync::Arc;

    const PAGE: &str = "Title page.\n@misc{onpage, title = {On the page}, journal = {arXiv:2301.04567}}";
    const ATTACHED: &[u8] = b"@article{attached, title = {Attached}, comment = {From embedded bib}}";

    fn document() -> FakeDocument {
        FakeDocument {
            attachments: vec![Attachment {
                name: "paper.bib".into(),
                data: ATTACHED.to_vec(),
            }],
            ..FakeDocument::with_text(PAGE)
        }
    }

    // Lets a test keep a handle on the backend the importer owns.
    struct Shared(Arc<FakeBackend>);

    impl PdfBackend for Shared {
        fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
            self.0.open(path)
        }

        fn open_bytes(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError> {
            self.0.open_bytes(bytes)
        }
    }

    #[test]
    fn test_both_strategies_in_order() {
        let backend = Arc::new(FakeBackend::new(document()));
        let importer = PdfImporter::new(Shared(backend.clone()));

        let candidates = importer.import_bytes(b"%PDF").unwrap();
        assert_eq!(backend.opens(), 2);
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].origin, Origin::Verbatim);
        assert_eq!(candidates[0].entry.citation_key(), Some("onpage"));
        assert!(candidates[0].changes.is_empty());

        assert_eq!(candidates[1].origin, Origin::Embedded);
        assert_eq!(
            candidates[1].entry.field(Field::Comment),
            Some("From embedded bib")
        );
    }

    #[test]
    fn test_settings_select_strategies_and_cleanup() {
        let settings = Settings {
            strategies: vec![ExtractorKind::Verbatim],
            cleanup_jobs: vec![CleanupJobKind::Eprint],
            ..Settings::default()
        };
        let importer = PdfImporter::from_settings(FakeBackend::new(document()), &settings);
        assert_eq!(importer.strategies(), vec![ExtractorKind::Verbatim]);

        let candidates = importer.import_bytes(b"%PDF").unwrap();
        assert_eq!(candidates.len(), 1);
        let entry = &candidates[0].entry;
        assert_eq!(entry.field(Field::Eprint), Some("2301.04567"));
        assert!(!entry.has_field(Field::Journal));
        assert_eq!(candidates[0].changes.len(), 3);
    }

    #[test]
    fn test_encrypted_document_skips_embedded() {
        let doc = FakeDocument {
            encrypted: true,
            ..document()
        };
        let importer = PdfImporter::new(FakeBackend::new(doc));
        let candidates = importer.import_bytes(b"%PDF").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].origin, Origin::Verbatim);
    }

    #[test]
    fn test_strategy_error_aborts_import() {
        let doc = FakeDocument {
            text: Some("@misc{open, title={".into()),
            ..document()
        };
        let importer = PdfImporter::new(FakeBackend::new(doc));
        assert!(matches!(
            importer.import_bytes(b"%PDF"),
            Err(ExtractError::Parse(_))
        ));
    }

    #[test]
    fn test_with_extractor_replaces_strategy() {
        let importer = PdfImporter::new(FakeBackend::new(document())).with_extractor(
            ExtractorKind::Embedded,
            EmbeddedBibExtractor::new().with_hint("missing.bib"),
        );
        assert_eq!(
            importer.strategies(),
            vec![ExtractorKind::Verbatim, ExtractorKind::Embedded]
        );
        let candidates = importer.import_bytes(b"%PDF").unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_candidate_serializes_origin() {
        let importer = PdfImporter::new(FakeBackend::new(document()))
            .with_cleanup(CleanupWorker::from_kinds(&[CleanupJobKind::Eprint]));
        let candidates = importer.import_bytes(b"%PDF").unwrap();
        let json = serde_json::to_value(&candidates[0]).unwrap();
        assert_eq!(json["origin"], "verbatim");
        assert!(json["changes"].is_array());
        let json = serde_json::to_value(&candidates[1]).unwrap();
        assert!(json.get("changes").is_none());
    }
}
