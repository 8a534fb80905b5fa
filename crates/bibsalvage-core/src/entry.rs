use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::change::FieldChange;
use crate::field::Field;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle identifying a [`BibEntry`].
///
/// [`FieldChange`] records carry this instead of a borrow of the entry, so a
/// change log can outlive the `&mut` used to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    fn next() -> Self {
        EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// BibTeX/BibLaTeX entry type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Article,
    Book,
    Booklet,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    Online,
    PhdThesis,
    Proceedings,
    Report,
    TechReport,
    Thesis,
    Unpublished,
    /// Any other `@type` the parser encountered, lowercased.
    Other(String),
}

impl EntryType {
    /// Parse an entry type name (case-insensitive).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "booklet" => Self::Booklet,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" | "conference" => Self::InProceedings,
            "manual" => Self::Manual,
            "mastersthesis" => Self::MastersThesis,
            "misc" => Self::Misc,
            "online" | "electronic" | "www" => Self::Online,
            "phdthesis" => Self::PhdThesis,
            "proceedings" => Self::Proceedings,
            "report" => Self::Report,
            "techreport" => Self::TechReport,
            "thesis" => Self::Thesis,
            "unpublished" => Self::Unpublished,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Booklet => "booklet",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Manual => "manual",
            Self::MastersThesis => "mastersthesis",
            Self::Misc => "misc",
            Self::Online => "online",
            Self::PhdThesis => "phdthesis",
            Self::Proceedings => "proceedings",
            Self::Report => "report",
            Self::TechReport => "techreport",
            Self::Thesis => "thesis",
            Self::Unpublished => "unpublished",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bibliographic entry.
///
/// Mutations go through [`BibEntry::set_field`] and [`BibEntry::clear_field`],
/// which report a [`FieldChange`] only when the stored value actually changes.
#[derive(Debug, Clone, Serialize)]
pub struct BibEntry {
    #[serde(skip)]
    id: EntryId,
    entry_type: EntryType,
    citation_key: Option<String>,
    fields: BTreeMap<Field, String>,
    /// Fields whose names are outside [`Field`]; never touched by cleanup.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    unknown_fields: BTreeMap<String, String>,
    /// Free text the parser found between the previous entry and this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    preceding_comment: Option<String>,
}

impl BibEntry {
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            id: EntryId::next(),
            entry_type,
            citation_key: None,
            fields: BTreeMap::new(),
            unknown_fields: BTreeMap::new(),
            preceding_comment: None,
        }
    }

    /// Builder-style helper, mostly for constructing expected entries in tests.
    pub fn with_citation_key(mut self, key: impl Into<String>) -> Self {
        self.set_citation_key(key);
        self
    }

    /// Builder-style helper; the produced change is discarded.
    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set_field(field, value);
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn entry_type(&self) -> &EntryType {
        &self.entry_type
    }

    pub fn citation_key(&self) -> Option<&str> {
        self.citation_key.as_deref()
    }

    pub fn set_citation_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.citation_key = if key.trim().is_empty() { None } else { Some(key) };
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// All recognized fields in [`Field`] order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Set `field` to `value`.
    ///
    /// An empty value clears the field. Returns `None` when the field already
    /// held exactly `value`.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Option<FieldChange> {
        let value = value.into();
        if value.is_empty() {
            return self.clear_field(field);
        }
        if self.fields.get(&field) == Some(&value) {
            return None;
        }
        let old_value = self.fields.insert(field, value.clone());
        Some(FieldChange::new(self.id, field, old_value, Some(value)))
    }

    /// Remove `field`. Returns `None` when it was not present.
    pub fn clear_field(&mut self, field: Field) -> Option<FieldChange> {
        let old_value = self.fields.remove(&field)?;
        Some(FieldChange::new(self.id, field, Some(old_value), None))
    }

    pub fn unknown_field(&self, name: &str) -> Option<&str> {
        self.unknown_fields
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    pub fn unknown_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unknown_fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Store a field whose name is not a [`Field`]. Names are lowercased.
    pub fn set_unknown_field(&mut self, name: &str, value: impl Into<String>) {
        self.unknown_fields.insert(name.to_lowercase(), value.into());
    }

    pub fn preceding_comment(&self) -> Option<&str> {
        self.preceding_comment.as_deref()
    }

    pub fn set_preceding_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        let trimmed = comment.trim();
        self.preceding_comment = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn clear_preceding_comment(&mut self) {
        self.preceding_comment = None;
    }
}

impl Default for BibEntry {
    fn default() -> Self {
        Self::new(EntryType::Misc)
    }
}

// Equality ignores `id`.
impl PartialEq for BibEntry {
    fn eq(&self, other: &Self) -> bool {
        self.entry_type == other.entry_type
            && self.citation_key == other.citation_key
            && self.fields == other.fields
            && self.unknown_fields == other.unknown_fields
            && self.preceding_comment == other.preceding_comment
    }
}

impl Eq for BibEntry {}
