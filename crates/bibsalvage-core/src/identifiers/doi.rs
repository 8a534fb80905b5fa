use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Whole-value DOI with an optional `doi:` label or resolver URL in front.
static DOI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?i:doi)\s*:?\s*|(?i:https?://)?(?i:(?:dx\.)?doi\.org)/)?(?P<doi>10\.\d{4,9}/\S+)$",
    )
    .unwrap()
});

/// A DOI stripped of resolver prefixes and trailing punctuation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Doi(String);

impl Doi {
    /// Recognize a DOI occupying the whole of `text`.
    ///
    /// Handles formats like:
    /// - `10.1234/example`
    /// - `doi:10.1234/example`
    /// - `https://doi.org/10.1234/example`
    /// - `http://dx.doi.org/10.1234/example`
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DOI_RE.captures(text.trim())?;
        let doi = clean_doi(caps.name("doi")?.as_str());
        if doi.contains('/') && !doi.ends_with('/') {
            Some(Doi(doi))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strip trailing punctuation and unbalanced closing brackets from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = &doi[..doi.len() - 1];
            doi = doi.trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_doi() {
        let doi = Doi::parse("10.1002/9781118257517").unwrap();
        assert_eq!(doi.as_str(), "10.1002/9781118257517");
    }

    #[test]
    fn test_prefixes_are_stripped() {
        for text in [
            "doi:10.1145/3442381.3450048",
            "DOI: 10.1145/3442381.3450048",
            "https://doi.org/10.1145/3442381.3450048",
            "http://dx.doi.org/10.1145/3442381.3450048",
            "doi.org/10.1145/3442381.3450048",
        ] {
            assert_eq!(
                Doi::parse(text).map(|d| d.0),
                Some("10.1145/3442381.3450048".to_string()),
                "{text}"
            );
        }
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(
            Doi::parse("10.1145/3442381.3450048.").unwrap().as_str(),
            "10.1145/3442381.3450048"
        );
        assert_eq!(
            Doi::parse("10.1016/0021-9681(87)90171-8)").unwrap().as_str(),
            "10.1016/0021-9681(87)90171-8"
        );
    }

    #[test]
    fn test_rejects_non_dois() {
        for text in [
            "",
            "see the appendix",
            "https://example.org/10.1000/x",
            "10.12/short",
            "2301.04567",
            "doi:10.1145/ with spaces",
        ] {
            assert!(Doi::parse(text).is_none(), "{text:?} should not match");
        }
    }
}
