use serde::Serialize;

use crate::entry::{BibEntry, EntryId};
use crate::field::Field;

/// One effective mutation of a field on a [`BibEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    entry: EntryId,
    field: Field,
    old_value: Option<String>,
    new_value: Option<String>,
}

impl FieldChange {
    pub fn new(
        entry: EntryId,
        field: Field,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            entry,
            field,
            old_value,
            new_value,
        }
    }

    pub fn entry(&self) -> EntryId {
        self.entry
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// True when the change removed the field.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Ordered record of the changes applied to entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeLog {
    changes: Vec<FieldChange>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the result of a mutation; `None` (a no-op) is dropped.
    pub fn record(&mut self, change: Option<FieldChange>) {
        if let Some(change) = change {
            tracing::trace!(
                field = %change.field,
                old = ?change.old_value,
                new = ?change.new_value,
                "field change"
            );
            self.changes.push(change);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.changes.iter()
    }

    pub fn into_vec(self) -> Vec<FieldChange> {
        self.changes
    }

    /// Undo every recorded change belonging to `entry`, newest first.
    ///
    /// Changes recorded for other entries are left alone. Returns the number of
    /// changes reverted.
    pub fn revert(&self, entry: &mut BibEntry) -> usize {
        let mut reverted = 0;
        for change in self.changes.iter().rev() {
            if change.entry != entry.id() {
                continue;
            }
            match &change.old_value {
                Some(old) => entry.set_field(change.field, old.clone()),
                None => entry.clear_field(change.field),
            };
            reverted += 1;
        }
        reverted
    }
}

impl From<Vec<FieldChange>> for ChangeLog {
    fn from(changes: Vec<FieldChange>) -> Self {
        Self { changes }
    }
}

impl IntoIterator for ChangeLog {
    type Item = FieldChange;
    type IntoIter = std::vec::IntoIter<FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    #[test]
    fn test_record_drops_noops() {
        let mut entry = BibEntry::new(EntryType::Misc);
        let mut log = ChangeLog::new();
        log.record(entry.set_field(Field::Note, "a"));
        log.record(entry.set_field(Field::Note, "a"));
        log.record(entry.clear_field(Field::Url));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_revert_restores_previous_state() {
        let mut entry = BibEntry::new(EntryType::Misc)
            .with_field(Field::Url, "https://arxiv.org/abs/2301.04567")
            .with_field(Field::Title, "Kept");
        let before = entry.clone();

        let mut log = ChangeLog::new();
        log.record(entry.set_field(Field::Eprint, "2301.04567"));
        log.record(entry.clear_field(Field::Url));
        log.record(entry.set_field(Field::Title, "Changed"));
        assert_ne!(entry, before);

        assert_eq!(log.revert(&mut entry), 3);
        assert_eq!(entry, before);
    }

    #[test]
    fn test_revert_ignores_other_entries() {
        let mut a = BibEntry::new(EntryType::Misc);
        let mut b = BibEntry::new(EntryType::Misc);
        let mut log = ChangeLog::new();
        log.record(a.set_field(Field::Note, "a"));
        log.record(b.set_field(Field::Note, "b"));

        assert_eq!(log.revert(&mut a), 1);
        assert_eq!(a.field(Field::Note), None);
        assert_eq!(b.field(Field::Note), Some("b"));
    }

    #[test]
    fn test_is_removal() {
        let mut entry = BibEntry::new(EntryType::Misc).with_field(Field::Version, "v2");
        let change = entry.clear_field(Field::Version).unwrap();
        assert!(change.is_removal());
        assert_eq!(change.old_value(), Some("v2"));
    }
}
