//! Paper, author and venue records as returned by the bibliographic API,
//! plus parsed bibliography entries and the year filter.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A paper as returned by Semantic Scholar (camelCase JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub corpus_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub publication_venue: Option<VenueRecord>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reference_count: Option<i64>,
    #[serde(default)]
    pub citation_count: Option<i64>,
    #[serde(default)]
    pub influential_citation_count: Option<i64>,
    #[serde(default)]
    pub is_influential: Option<bool>,
    #[serde(default)]
    pub is_open_access: Option<bool>,
    #[serde(default)]
    pub publication_types: Option<Vec<String>>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub fields_of_study: Option<Vec<String>>,
    #[serde(default)]
    pub s2_fields_of_study: Option<Vec<FieldOfStudy>>,
    #[serde(default)]
    pub authors: Vec<AuthorRecord>,
    #[serde(default)]
    pub match_score: Option<f64>,
}

impl PaperRecord {
    /// Create a minimal record with an id and title.
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper_id: Some(paper_id.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// The paper id, or `InvalidRecord` if the API omitted it.
    pub fn require_id(&self) -> Result<&str> {
        match self.paper_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Error::InvalidRecord(format!(
                "paper without paperId: {}",
                self.display_title()
            ))),
        }
    }

    /// Title for log lines.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("<untitled>")
    }

    /// Union of `fieldsOfStudy` and `s2FieldsOfStudy` categories, deduplicated.
    pub fn fields_of_study(&self) -> BTreeSet<String> {
        let mut fields: BTreeSet<String> = self
            .fields_of_study
            .iter()
            .flatten()
            .cloned()
            .collect();
        for f in self.s2_fields_of_study.iter().flatten() {
            fields.insert(f.category.clone());
        }
        fields
    }

    /// Authors that carry both an id and a name, in byline order.
    pub fn valid_authors(&self) -> impl Iterator<Item = &AuthorRecord> {
        self.authors.iter().filter(|a| a.is_valid())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOfStudy {
    pub category: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// An author as embedded in a paper record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRecord {
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AuthorRecord {
    pub fn new(author_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            author_id: Some(author_id.into()),
            name: Some(name.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(&self.author_id, Some(id) if !id.is_empty())
            && matches!(&self.name, Some(n) if !n.is_empty())
    }
}

/// A publication venue (`publicationVenue` in the API).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub venue_type: Option<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One entry of a citations or references page.
///
/// Citation pages carry `citingPaper`, reference pages carry `citedPaper`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationItem {
    #[serde(default)]
    pub citing_paper: Option<PaperRecord>,
    #[serde(default)]
    pub cited_paper: Option<PaperRecord>,
    #[serde(default)]
    pub is_influential: Option<bool>,
}

impl CitationItem {
    pub fn citing(paper: PaperRecord) -> Self {
        Self {
            citing_paper: Some(paper),
            ..Default::default()
        }
    }

    pub fn cited(paper: PaperRecord) -> Self {
        Self {
            cited_paper: Some(paper),
            ..Default::default()
        }
    }
}

/// A page of results from a paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub next: Option<usize>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            offset: 0,
            next: None,
            data: Vec::new(),
        }
    }
}

/// A bibliography entry parsed from a paper's reference section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDetails {
    pub id: u32,
    pub authors: String,
    pub year: String,
    pub title: String,
    pub publish: String,
    #[serde(default)]
    pub page_or_volume: String,
}

impl ReferenceDetails {
    /// Build a reference; authors, year and title are required and the year must be numeric.
    pub fn new(
        id: u32,
        authors: impl Into<String>,
        year: impl Into<String>,
        title: impl Into<String>,
        publish: impl Into<String>,
        page_or_volume: impl Into<String>,
    ) -> Result<Self> {
        let reference = Self {
            id,
            authors: authors.into(),
            year: year.into(),
            title: title.into(),
            publish: publish.into(),
            page_or_volume: page_or_volume.into(),
        };
        if reference.authors.trim().is_empty()
            || reference.year.trim().is_empty()
            || reference.title.trim().is_empty()
        {
            return Err(Error::InvalidRecord(format!(
                "reference {}: authors, year and title are required",
                id
            )));
        }
        if !reference.year.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidRecord(format!(
                "reference {}: year '{}' is not numeric",
                id, reference.year
            )));
        }
        Ok(reference)
    }
}

/// Publication year filter in `start:end` form; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl FromStr for YearRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse_bound = |b: &str| -> Result<Option<i32>> {
            let b = b.trim();
            if b.is_empty() {
                return Ok(None);
            }
            if b.len() != 4 || !b.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::Config(format!("invalid year '{}' in filter '{}'", b, s)));
            }
            b.parse::<i32>()
                .map(Some)
                .map_err(|e| Error::Config(format!("invalid year filter '{}': {}", s, e)))
        };

        let range = match s.split_once(':') {
            Some((start, end)) => Self {
                start: parse_bound(start)?,
                end: parse_bound(end)?,
            },
            None => {
                let year = parse_bound(s)?;
                Self {
                    start: year,
                    end: year,
                }
            }
        };

        if range.start.is_none() && range.end.is_none() {
            return Err(Error::Config(format!("empty year filter '{}'", s)));
        }
        if let (Some(a), Some(b)) = (range.start, range.end) {
            if a > b {
                return Err(Error::Config(format!("year filter '{}' ends before it starts", s)));
            }
        }
        Ok(range)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(a), Some(b)) if a == b => write!(f, "{}", a),
            (Some(a), Some(b)) => write!(f, "{}:{}", a, b),
            (Some(a), None) => write!(f, "{}:", a),
            (None, Some(b)) => write!(f, ":{}", b),
            (None, None) => Ok(()),
        }
    }
}
