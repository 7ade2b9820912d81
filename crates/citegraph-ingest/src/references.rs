//! Reference-section splitting and bibliography entry parsing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use citegraph_core::{Error, ReferenceDetails};

static BRACKETED_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(ReferencePattern::BRACKETED_NUMBER).unwrap());
static NUMBERED_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(ReferencePattern::NUMBERED_LIST).unwrap());

/// `Authors. YEAR. Title. Venue, pages`
static REFERENCE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<authors>.+?).\s*(?P<year>\d{4})\.\s*(?P<title>.+?)\.\s*(?P<publish>[^,.]+)(?:[.,]*\s*(?P<page_or_volume>.*))?$",
    )
    .unwrap()
});

/// How entries are numbered in a reference section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePattern {
    /// `[12] Author. 2020. Title. ...`
    BracketedNumber,
    /// `12. Author. 2020. Title. ...` at the start of a line.
    NumberedList,
}

impl ReferencePattern {
    pub const BRACKETED_NUMBER: &'static str = r"\[(\d+)\]";
    pub const NUMBERED_LIST: &'static str = r"(?m)^[ \t]*(\d{1,3})\.\s+";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BracketedNumber => Self::BRACKETED_NUMBER,
            Self::NumberedList => Self::NUMBERED_LIST,
        }
    }

    /// Compiled marker regex; capture group 1 is the entry number.
    pub fn regex(self) -> &'static Regex {
        match self {
            Self::BracketedNumber => &BRACKETED_NUMBER,
            Self::NumberedList => &NUMBERED_LIST,
        }
    }
}

impl fmt::Display for ReferencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BracketedNumber => f.write_str("bracketed"),
            Self::NumberedList => f.write_str("numbered"),
        }
    }
}

impl FromStr for ReferencePattern {
    type Err = Error;

    fn from_str(s: &str) -> citegraph_core::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bracketed" | "bracketed_number" => Ok(Self::BracketedNumber),
            "numbered" | "numbered_list" => Ok(Self::NumberedList),
            other => Err(Error::Config(format!(
                "unknown reference pattern '{}' (expected bracketed or numbered)",
                other
            ))),
        }
    }
}

/// Splits reference-section text into numbered entries.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceExtractor {
    pattern: ReferencePattern,
}

impl ReferenceExtractor {
    pub fn new(pattern: ReferencePattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> ReferencePattern {
        self.pattern
    }

    /// Entry number to entry text. An entry runs from the end of its
    /// marker to the start of the next one. Empty entries are dropped and
    /// a repeated number keeps its last entry.
    pub fn extract(&self, text: &str) -> BTreeMap<u32, String> {
        let markers: Vec<(u32, usize, usize)> = self
            .pattern
            .regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let id = caps.get(1)?.as_str().parse().ok()?;
                Some((id, whole.start(), whole.end()))
            })
            .collect();

        let mut entries = BTreeMap::new();
        for (i, &(id, _, body_start)) in markers.iter().enumerate() {
            let body_end = markers.get(i + 1).map(|&(_, start, _)| start).unwrap_or(text.len());
            let body = text[body_start..body_end].trim();
            if !body.is_empty() {
                entries.insert(id, body.to_string());
            }
        }
        debug!("Split {} reference entries ({})", entries.len(), self.pattern);
        entries
    }
}

fn collapse_lines(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse one bibliography entry. Returns `None` when the text does not
/// follow the `Authors. YEAR. Title. Venue, pages` layout.
pub fn parse_reference(id: u32, text: &str) -> Option<ReferenceDetails> {
    let caps = REFERENCE_GRAMMAR.captures(text.trim())?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or("");

    let reference = ReferenceDetails::new(
        id,
        collapse_lines(group("authors")),
        group("year").trim(),
        collapse_lines(group("title")),
        collapse_lines(group("publish")),
        collapse_lines(group("page_or_volume")).trim_end_matches('.'),
    );
    reference.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRACKETED: &str = "References\n\
        [1] Antoine Bordes, Nicolas Usunier, Alberto Garcia-Duran, Jason Weston, and Oksana Yakhnenko. 2013. \
        Translating embeddings for modeling\nmulti-relational data. In Advances in Neural Information Processing Systems, 2787-2795.\n\
        [2] Zhiqing Sun, Zhi-Hong Deng, Jian-Yun Nie, and Jian Tang. 2019. RotatE: Knowledge graph embedding by relational \
        rotation in complex space. In International Conference on Learning Representations.\n\
        [3]\n";

    #[test]
    fn test_bracketed_split() {
        let entries = ReferenceExtractor::new(ReferencePattern::BracketedNumber).extract(BRACKETED);
        assert_eq!(entries.len(), 2);
        assert!(entries[&1].starts_with("Antoine Bordes"));
        assert!(entries[&1].ends_with("2787-2795."));
        assert!(entries[&2].starts_with("Zhiqing Sun"));
        assert!(!entries.contains_key(&3));
    }

    #[test]
    fn test_numbered_list_ignores_inline_numbers() {
        let text = "1. Alice Smith. 2020. First title. Venue A, 1-10.\n\
                    2. Bob Jones. 2021. Second title with 3. inline. Venue B.\n\
                    10. Carol White. 2019. Tenth title. Venue C, 5.\n";
        let entries = ReferenceExtractor::new(ReferencePattern::NumberedList).extract(text);
        assert_eq!(entries.keys().copied().collect::<Vec<_>>(), vec![1, 2, 10]);
        assert!(entries[&2].contains("3. inline"));
    }

    #[test]
    fn test_parse_reference_fields() {
        let entries = ReferenceExtractor::new(ReferencePattern::BracketedNumber).extract(BRACKETED);
        let r = parse_reference(1, &entries[&1]).unwrap();
        assert_eq!(r.id, 1);
        assert_eq!(
            r.authors,
            "Antoine Bordes, Nicolas Usunier, Alberto Garcia-Duran, Jason Weston, and Oksana Yakhnenko"
        );
        assert_eq!(r.year, "2013");
        assert_eq!(r.title, "Translating embeddings for modeling multi-relational data");
        assert_eq!(r.publish, "In Advances in Neural Information Processing Systems");
        assert_eq!(r.page_or_volume, "2787-2795");

        let r = parse_reference(2, &entries[&2]).unwrap();
        assert_eq!(r.publish, "In International Conference on Learning Representations");
        assert_eq!(r.page_or_volume, "");
    }

    #[test]
    fn test_parse_reference_rejects_other_layouts() {
        assert!(parse_reference(1, "Some text without a year or structure").is_none());
        assert!(parse_reference(2, "").is_none());
    }

    #[test]
    fn test_pattern_from_str() {
        assert_eq!("numbered".parse::<ReferencePattern>().unwrap(), ReferencePattern::NumberedList);
        assert_eq!(
            "Bracketed".parse::<ReferencePattern>().unwrap(),
            ReferencePattern::BracketedNumber
        );
        assert!("roman".parse::<ReferencePattern>().is_err());
    }
}
