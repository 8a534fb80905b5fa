use bibsalvage_core::{BibEntry, ChangeLog, Doi, Field, FieldChange};

use crate::CleanupJob;

/// Normalizes the `doi` field.
///
/// An existing DOI is stripped of `doi:` labels, resolver URLs and trailing
/// punctuation. When there is no DOI, a `note` or `url` consisting solely of a
/// DOI is moved into `doi` (a moved `url` also drops `urldate`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DoiCleanup;

impl CleanupJob for DoiCleanup {
    fn name(&self) -> &'static str {
        "doi"
    }

    fn cleanup(&self, entry: &mut BibEntry) -> Vec<FieldChange> {
        let mut changes = ChangeLog::new();

        if entry.has_field(Field::Doi) {
            if let Some(doi) = entry.field(Field::Doi).and_then(Doi::parse) {
                changes.record(entry.set_field(Field::Doi, doi.as_str()));
            }
            return changes.into_vec();
        }

        for source in [Field::Note, Field::Url] {
            let Some(doi) = entry.field(source).and_then(Doi::parse) else {
                continue;
            };
            changes.record(entry.set_field(Field::Doi, doi.as_str()));
            changes.record(entry.clear_field(source));
            if source == Field::Url {
                changes.record(entry.clear_field(Field::UrlDate));
            }
            break;
        }

        changes.into_vec()
    }
}
