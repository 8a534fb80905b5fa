use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Value written to `eprinttype` for arXiv identifiers.
pub const EPRINT_TYPE: &str = "arxiv";

/// Optional scheme label or URL in front of an identifier:
/// `arXiv:`, `arxiv `, `https://arxiv.org/abs/`, `arxiv.org/pdf/`, ...
const PREFIX: &str = r"(?:(?i:https?://)?(?i:www\.)?(?i:arxiv\.org)/(?i:abs|pdf)/|(?i:arxiv)\s*:?\s*)?";

// Legacy: archive[.SUB]/YYMMNNN, e.g. hep-th/9901001, math.GT/0309136
static LEGACY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{PREFIX}(?P<id>(?P<class>[a-z][a-z\-]*(?:\.[A-Za-z][A-Za-z\-]*)?)/\d{{7}})(?:v(?P<version>\d+))?(?i:\.pdf)?$"
    ))
    .unwrap()
});

// Modern: YYMM.NNNN(N), optional version, optional trailing [class] or (class)
static MODERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{PREFIX}(?P<id>\d{{4}}\.\d{{4,5}})(?:v(?P<version>\d+))?(?i:\.pdf)?(?:\s*[\[(]\s*(?P<class>[^\[\]()\s]+)\s*[\])])?$"
    ))
    .unwrap()
});

/// A normalized arXiv eprint identifier.
///
/// Construct one with [`ArxivIdentifier::parse`]; the parts are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArxivIdentifier {
    identifier: String,
    classification: Option<String>,
    version: Option<u32>,
}

impl ArxivIdentifier {
    /// Recognize an arXiv identifier occupying the whole of `text`.
    ///
    /// Handles formats like:
    /// - `2301.04567`, `2301.04567v2`, `arXiv:2301.04567`
    /// - `2301.04567v1 [cs.LG]`, `1501.00001 (hep-th)`
    /// - `https://arxiv.org/abs/2301.04567`, `arxiv.org/pdf/2301.04567v3.pdf`
    /// - `hep-th/9901001`, `arXiv:math.GT/0309136v2` (legacy)
    ///
    /// Legacy identifiers are tried first, then modern ones. Text that conforms
    /// to neither returns `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        LEGACY
            .captures(text)
            .or_else(|| MODERN.captures(text))
            .and_then(Self::from_captures)
    }

    fn from_captures(caps: regex::Captures<'_>) -> Option<Self> {
        let identifier = caps.name("id")?.as_str().to_string();
        let classification = caps.name("class").map(|c| c.as_str().to_string());
        let version = caps
            .name("version")
            .and_then(|v| v.as_str().parse::<u32>().ok());
        Some(Self {
            identifier,
            classification,
            version,
        })
    }

    /// The identifier without scheme prefix or version suffix.
    pub fn normalized(&self) -> &str {
        &self.identifier
    }

    /// Subject classification, either embedded (legacy) or appended (modern).
    pub fn classification(&self) -> Option<&str> {
        self.classification.as_deref()
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn normalized_with_version(&self) -> String {
        match self.version {
            Some(v) => format!("{}v{}", self.identifier, v),
            None => self.identifier.clone(),
        }
    }

    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ArxivIdentifier {
        ArxivIdentifier::parse(text).unwrap_or_else(|| panic!("expected a match for {text:?}"))
    }

    #[test]
    fn test_modern_bare() {
        let id = parse("2301.04567");
        assert_eq!(id.normalized(), "2301.04567");
        assert_eq!(id.classification(), None);
        assert_eq!(id.version(), None);
    }

    #[test]
    fn test_modern_four_digit_sequence() {
        assert_eq!(parse("0706.0001").normalized(), "0706.0001");
    }

    #[test]
    fn test_modern_version_is_stripped() {
        let id = parse("2301.04567v2");
        assert_eq!(id.normalized(), "2301.04567");
        assert_eq!(id.version(), Some(2));
        assert_eq!(id.normalized_with_version(), "2301.04567v2");
    }

    #[test]
    fn test_modern_with_bracketed_classification() {
        let id = parse("arXiv:1503.00001v1 [cs.LG]");
        assert_eq!(id.normalized(), "1503.00001");
        assert_eq!(id.classification(), Some("cs.LG"));
    }

    #[test]
    fn test_modern_with_parenthesized_classification() {
        let id = parse("1405.1234 (hep-th)");
        assert_eq!(id.normalized(), "1405.1234");
        assert_eq!(id.classification(), Some("hep-th"));
    }

    #[test]
    fn test_scheme_label_case_and_spacing() {
        for text in [
            "arXiv:2301.04567",
            "arxiv:2301.04567",
            "ARXIV:2301.04567",
            "arXiv: 2301.04567",
            "arXiv 2301.04567",
            "  arXiv:2301.04567v5  ",
        ] {
            assert_eq!(parse(text).normalized(), "2301.04567", "{text}");
        }
    }

    #[test]
    fn test_url_prefixes() {
        for text in [
            "https://arxiv.org/abs/2301.04567",
            "http://arxiv.org/abs/2301.04567v3",
            "https://www.arxiv.org/abs/2301.04567",
            "arxiv.org/abs/2301.04567",
            "https://arxiv.org/pdf/2301.04567v2.pdf",
            "HTTPS://ArXiv.org/abs/2301.04567",
        ] {
            assert_eq!(parse(text).normalized(), "2301.04567", "{text}");
        }
    }

    #[test]
    fn test_legacy_keeps_archive_prefix() {
        let id = parse("math.GT/0309136");
        assert_eq!(id.normalized(), "math.GT/0309136");
        assert_eq!(id.classification(), Some("math.GT"));
    }

    #[test]
    fn test_legacy_version_is_stripped() {
        let id = parse("hep-th/9901001v3");
        assert_eq!(id.normalized(), "hep-th/9901001");
        assert_eq!(id.classification(), Some("hep-th"));
        assert_eq!(id.version(), Some(3));
    }

    #[test]
    fn test_legacy_with_prefixes() {
        assert_eq!(parse("arXiv:cond-mat/0211034").normalized(), "cond-mat/0211034");
        assert_eq!(
            parse("https://arxiv.org/abs/cs.AI/0601001v1").normalized(),
            "cs.AI/0601001"
        );
    }

    #[test]
    fn test_abs_url() {
        assert_eq!(
            parse("arXiv:2301.04567v2").abs_url(),
            "https://arxiv.org/abs/2301.04567"
        );
    }

    #[test]
    fn test_rejects_non_identifiers() {
        for text in [
            "",
            "   ",
            "12345",
            "123.456",
            "2301.123",
            "2301.1234567",
            "Journal of Physics",
            "https://example.org/abs/2301.04567",
            "10.1002/9781118257517",
            "arXiv preprint arXiv:2301.04567",
            "hep-th/990100",
            "v2",
        ] {
            assert!(ArxivIdentifier::parse(text).is_none(), "{text:?} should not match");
        }
    }
}
