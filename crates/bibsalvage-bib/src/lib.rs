//! BibTeX text parser that tolerates prose around entries.
//!
//! Entries are located by scanning for `@type{` / `@type(` and matching the
//! closing delimiter; each entry body is then handed to `biblatex` for field
//! parsing and LaTeX decoding. Text between entries is kept as the entry's
//! preceding comment.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use bibsalvage_core::{BibEntry, BibTextParser, EntryType, Field, ParseError};

static ENTRY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*([A-Za-z]+)\s*([{(])").unwrap());

/// BibLaTeX types without a dedicated [`EntryType`] variant.
const OTHER_ENTRY_TYPES: &[&str] = &[
    "artwork",
    "audio",
    "bibnote",
    "collection",
    "commentary",
    "dataset",
    "image",
    "inreference",
    "jurisdiction",
    "legal",
    "legislation",
    "letter",
    "movie",
    "music",
    "mvbook",
    "mvcollection",
    "mvproceedings",
    "mvreference",
    "patent",
    "performance",
    "periodical",
    "reference",
    "review",
    "set",
    "software",
    "standard",
    "suppbook",
    "suppcollection",
    "suppperiodical",
    "video",
    "xdata",
];

#[derive(Error, Debug)]
pub enum BibFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The default [`BibTextParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexParser;

impl BibtexParser {
    pub fn new() -> Self {
        Self
    }
}

impl BibTextParser for BibtexParser {
    fn parse_entries(&self, text: &str) -> Result<Vec<BibEntry>, ParseError> {
        let mut entries = Vec::new();
        // `@string` definitions seen so far, replayed in front of each entry.
        let mut strings = String::new();
        // Start of the text not yet consumed by an entry.
        let mut cursor = 0;
        let mut search_from = 0;

        while let Some(caps) = ENTRY_START.captures_at(text, search_from) {
            let (Some(start), Some(kind), Some(delim)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                break;
            };
            let line = line_of(text, start.start());
            let kind = kind.as_str();
            let lowered = kind.to_ascii_lowercase();

            let entry_type = EntryType::parse(kind);
            let known = matches!(lowered.as_str(), "comment" | "preamble" | "string")
                || !matches!(entry_type, EntryType::Other(_))
                || OTHER_ENTRY_TYPES.contains(&lowered.as_str());
            if !known {
                tracing::debug!(line, word = kind, "skipping `@` word that is not an entry type");
                search_from = start.end();
                continue;
            }

            let body_start = delim.end();
            let Some(body_len) = closing_delimiter(&text[body_start..], delim.as_str()) else {
                return Err(ParseError::Unterminated {
                    line,
                    entry_type: kind.to_lowercase(),
                });
            };
            let body = &text[body_start..body_start + body_len];
            let preceding = &text[cursor..start.start()];
            // Both delimiters are one byte.
            cursor = body_start + body_len + 1;
            search_from = cursor;

            match lowered.as_str() {
                "comment" | "preamble" => continue,
                "string" => {
                    strings.push_str(&format!("@string{{{body}}}\n"));
                    continue;
                }
                _ => {}
            }

            let source = format!("{strings}@{kind}{{{body}}}");
            let mut entry = convert_entry(&source, entry_type, line)?;
            entry.set_preceding_comment(preceding);
            tracing::trace!(line, entry_type = %entry.entry_type(), "parsed entry");
            entries.push(entry);
        }

        tracing::debug!(count = entries.len(), "parsed BibTeX text");
        Ok(entries)
    }
}

/// Parse a `.bib` file from disk.
pub fn parse_file(path: &Path) -> Result<Vec<BibEntry>, BibFileError> {
    let content = std::fs::read_to_string(path)?;
    Ok(BibtexParser.parse_entries(&content)?)
}

fn convert_entry(source: &str, entry_type: EntryType, line: usize) -> Result<BibEntry, ParseError> {
    let bibliography =
        biblatex::Bibliography::parse(source).map_err(|e| ParseError::Malformed {
            line,
            message: e.to_string(),
        })?;
    let Some(parsed) = bibliography.iter().next() else {
        return Err(ParseError::Malformed {
            line,
            message: "not a bibliographic entry".to_string(),
        });
    };

    let mut entry = BibEntry::new(entry_type).with_citation_key(parsed.key.as_str());
    for (name, chunks) in &parsed.fields {
        let value = chunks_to_string(chunks);
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match Field::from_name(name) {
            Some(field) => {
                entry.set_field(field, value);
            }
            None => entry.set_unknown_field(name, value),
        }
    }
    Ok(entry)
}

/// Convert biblatex chunks to a plain string.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Byte length of the entry body, up to but excluding its closing delimiter.
///
/// `text` starts right after the opening `{` or `(`. Escaped braces are
/// skipped; a `(`-delimited body closes at the first `)` outside braces.
fn closing_delimiter(text: &str, open: &str) -> Option<usize> {
    let paren = open == "(";
    let mut depth: usize = if paren { 0 } else { 1 };
    let mut chars = text.char_indices();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 && !paren {
                    return Some(i);
                }
            }
            ')' if paren && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<Vec<BibEntry>, ParseError> {
        BibtexParser.parse_entries(text)
    }

    #[test]
    fn test_entry_after_prose() {
        let text = "Some unrelated prose about beds.\nPage 1 of 3\n\
            @misc{jabreftext2021, author={Someone embedded}, title={I like beds}, doi={10.1002/9781118257517}}";
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 1);

        let e = &entries[0];
        assert_eq!(e.entry_type(), &EntryType::Misc);
        assert_eq!(e.citation_key(), Some("jabreftext2021"));
        assert_eq!(e.field(Field::Author), Some("Someone embedded"));
        assert_eq!(e.field(Field::Title), Some("I like beds"));
        assert_eq!(e.field(Field::Doi), Some("10.1002/9781118257517"));
        assert_eq!(e.field_count(), 3);
        assert_eq!(
            e.preceding_comment(),
            Some("Some unrelated prose about beds.\nPage 1 of 3")
        );
    }

    #[test]
    fn test_prose_only_is_empty() {
        let text = "Contact the authors at someone@example.org.\nNo citations here.";
        assert!(parse(text).unwrap().is_empty());
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_multiple_entries_and_unknown_fields() {
        let text = r#"
@Comment{jabref-meta: databaseType:bibtex;}

@article{first,
  title = {First Paper},
  journal = "Journal of Tests",
  archiveprefix = {arXiv},
  year = 2021
}

@InProceedings{second,
  title = {Second Paper},
  booktitle = {Proceedings of Something}
}
"#;
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].entry_type(), &EntryType::Article);
        assert_eq!(entries[0].field(Field::Journal), Some("Journal of Tests"));
        assert_eq!(entries[0].field(Field::Year), Some("2021"));
        assert_eq!(entries[0].unknown_field("archiveprefix"), Some("arXiv"));
        assert_eq!(entries[0].preceding_comment(), None);

        assert_eq!(entries[1].entry_type(), &EntryType::InProceedings);
        assert_eq!(entries[1].citation_key(), Some("second"));
        assert_eq!(
            entries[1].field(Field::Booktitle),
            Some("Proceedings of Something")
        );
    }

    #[test]
    fn test_handles_and_addresses_in_prose_are_skipped() {
        let text = "Follow us @jabref (on Twitter).\nMail team@lab{x} for data.\n\
            @misc{jabreftext2021, author={Someone embedded}, title={I like beds}, doi={10.1002/9781118257517}}";
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type(), &EntryType::Misc);
        assert_eq!(entries[0].citation_key(), Some("jabreftext2021"));
        assert_eq!(
            entries[0].preceding_comment(),
            Some("Follow us @jabref (on Twitter).\nMail team@lab{x} for data.")
        );
    }

    #[test]
    fn test_biblatex_only_type_is_parsed() {
        let entries = parse("@Dataset{d, title = {Measurements}}").unwrap();
        assert_eq!(entries[0].entry_type(), &EntryType::Other("dataset".into()));
        assert_eq!(entries[0].field(Field::Title), Some("Measurements"));
    }

    #[test]
    fn test_comment_field_is_kept() {
        let entries =
            parse("@article{embedded, title={Embedded}, comment={From embedded bib}}").unwrap();
        assert_eq!(entries[0].field(Field::Comment), Some("From embedded bib"));
    }

    #[test]
    fn test_string_abbreviations() {
        let text = r#"
@string{acm = {ACM Press}}
@book{k, title = {A Book}, publisher = acm}
"#;
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field(Field::Publisher), Some("ACM Press"));
    }

    #[test]
    fn test_parenthesized_entry() {
        let entries = parse("@misc(paren, title = {Parens})").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].citation_key(), Some("paren"));
        assert_eq!(entries[0].field(Field::Title), Some("Parens"));
    }

    #[test]
    fn test_unterminated_entry() {
        let err = parse("Intro text\n@article{open, title={Never closed}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unterminated {
                line: 2,
                entry_type: "article".into()
            }
        );
    }

    #[test]
    fn test_malformed_entry_reports_line() {
        let err = parse("\n\n@article{broken, title {no equals sign}}").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn test_closing_delimiter() {
        assert_eq!(closing_delimiter("a{b}c}", "{"), Some(5));
        assert_eq!(closing_delimiter(r"a\}b}", "{"), Some(4));
        assert_eq!(closing_delimiter("a{)}b)", "("), Some(5));
        assert_eq!(closing_delimiter("a{b", "{"), None);
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "@misc{{onfile, title = {{On Disk}}}}").unwrap();
        let entries = parse_file(file.path()).unwrap();
        assert_eq!(entries[0].field(Field::Title), Some("On Disk"));

        assert!(matches!(
            parse_file(Path::new("/nonexistent/refs.bib")),
            Err(BibFileError::Io(_))
        ));
    }
}
