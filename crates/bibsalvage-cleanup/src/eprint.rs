use bibsalvage_core::{ArxivIdentifier, BibEntry, ChangeLog, EPRINT_TYPE, Field, FieldChange};

use crate::CleanupJob;

/// Fields searched for an arXiv identifier, in scan order.
pub const CANDIDATE_FIELDS: [Field; 7] = [
    Field::Url,
    Field::Journal,
    Field::JournalTitle,
    Field::Note,
    Field::Version,
    Field::Institution,
    Field::Eid,
];

/// Moves arXiv identifiers found in free-text fields into
/// `eprint` / `eprinttype` / `eprintclass`.
///
/// Every candidate field is checked; when several hold an identifier the last
/// one in [`CANDIDATE_FIELDS`] order wins the eprint fields, and all matching
/// sources are cleared. `version` and `institution` are always removed
/// afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct EprintCleanup;

impl CleanupJob for EprintCleanup {
    fn name(&self) -> &'static str {
        "eprint"
    }

    fn cleanup(&self, entry: &mut BibEntry) -> Vec<FieldChange> {
        let mut changes = ChangeLog::new();

        for field in CANDIDATE_FIELDS {
            let Some(identifier) = entry.field(field).and_then(ArxivIdentifier::parse) else {
                continue;
            };

            changes.record(entry.set_field(Field::Eprint, identifier.normalized()));
            changes.record(entry.set_field(Field::EprintType, EPRINT_TYPE));
            if let Some(class) = identifier.classification() {
                changes.record(entry.set_field(Field::EprintClass, class));
            }
            changes.record(entry.clear_field(field));
            if field == Field::Url {
                changes.record(entry.clear_field(Field::UrlDate));
            }
        }

        changes.record(entry.clear_field(Field::Version));
        changes.record(entry.clear_field(Field::Institution));
        changes.into_vec()
    }
}
