use std::fmt;

use serde::{Deserialize, Serialize};

/// A recognized bibliographic field.
///
/// The set is closed so cleanup jobs can enumerate the fields they inspect.
/// Field names the parser does not recognize are kept on the entry as
/// unknown fields instead (see [`crate::BibEntry::unknown_fields`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Abstract,
    Address,
    Author,
    Booktitle,
    Chapter,
    Comment,
    Crossref,
    Date,
    Doi,
    Edition,
    Editor,
    Eid,
    Eprint,
    EprintClass,
    EprintType,
    File,
    HowPublished,
    Institution,
    Isbn,
    Issn,
    Issue,
    Journal,
    JournalTitle,
    Keywords,
    Language,
    Location,
    Month,
    Note,
    Number,
    Organization,
    Pages,
    Publisher,
    School,
    Series,
    Title,
    Type,
    Url,
    UrlDate,
    Version,
    Volume,
    Year,
}

impl Field {
    pub const ALL: [Field; 41] = [
        Field::Abstract,
        Field::Address,
        Field::Author,
        Field::Booktitle,
        Field::Chapter,
        Field::Comment,
        Field::Crossref,
        Field::Date,
        Field::Doi,
        Field::Edition,
        Field::Editor,
        Field::Eid,
        Field::Eprint,
        Field::EprintClass,
        Field::EprintType,
        Field::File,
        Field::HowPublished,
        Field::Institution,
        Field::Isbn,
        Field::Issn,
        Field::Issue,
        Field::Journal,
        Field::JournalTitle,
        Field::Keywords,
        Field::Language,
        Field::Location,
        Field::Month,
        Field::Note,
        Field::Number,
        Field::Organization,
        Field::Pages,
        Field::Publisher,
        Field::School,
        Field::Series,
        Field::Title,
        Field::Type,
        Field::Url,
        Field::UrlDate,
        Field::Version,
        Field::Volume,
        Field::Year,
    ];

    /// Lowercase BibTeX name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Abstract => "abstract",
            Field::Address => "address",
            Field::Author => "author",
            Field::Booktitle => "booktitle",
            Field::Chapter => "chapter",
            Field::Comment => "comment",
            Field::Crossref => "crossref",
            Field::Date => "date",
            Field::Doi => "doi",
            Field::Edition => "edition",
            Field::Editor => "editor",
            Field::Eid => "eid",
            Field::Eprint => "eprint",
            Field::EprintClass => "eprintclass",
            Field::EprintType => "eprinttype",
            Field::File => "file",
            Field::HowPublished => "howpublished",
            Field::Institution => "institution",
            Field::Isbn => "isbn",
            Field::Issn => "issn",
            Field::Issue => "issue",
            Field::Journal => "journal",
            Field::JournalTitle => "journaltitle",
            Field::Keywords => "keywords",
            Field::Language => "language",
            Field::Location => "location",
            Field::Month => "month",
            Field::Note => "note",
            Field::Number => "number",
            Field::Organization => "organization",
            Field::Pages => "pages",
            Field::Publisher => "publisher",
            Field::School => "school",
            Field::Series => "series",
            Field::Title => "title",
            Field::Type => "type",
            Field::Url => "url",
            Field::UrlDate => "urldate",
            Field::Version => "version",
            Field::Volume => "volume",
            Field::Year => "year",
        }
    }

    /// Look up a field by its BibTeX name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Field> {
        let lower = name.trim().to_lowercase();
        Field::ALL.iter().copied().find(|f| f.name() == lower)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_round_trips_through_its_name() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
    }

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(Field::from_name("URLDATE"), Some(Field::UrlDate));
        assert_eq!(Field::from_name("JournalTitle"), Some(Field::JournalTitle));
        assert_eq!(Field::from_name(" eprintclass "), Some(Field::EprintClass));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(Field::from_name("archiveprefix"), None);
        assert_eq!(Field::from_name(""), None);
    }
}
