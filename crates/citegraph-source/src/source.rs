//! The external bibliographic source boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use citegraph_core::{CitationItem, Page, PaperRecord, Result, YearRange};

/// Default page size for citation and reference listings.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// One page of a citations or references listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
    /// Restrict listed papers to a publication year range.
    pub year: Option<YearRange>,
}

impl PageRequest {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            year: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_year(mut self, year: Option<YearRange>) -> Self {
        self.year = year;
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

/// Resolves papers and lists their citation neighborhood.
///
/// Missing papers are `Ok(None)` or an empty page. Transport and
/// protocol failures are `Error::Source`.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// Best title match, if any.
    async fn find_by_title(&self, title: &str) -> Result<Option<PaperRecord>>;

    async fn find_by_id(&self, paper_id: &str) -> Result<Option<PaperRecord>>;

    /// Papers that cite `paper_id`; items carry `citing_paper`.
    async fn list_citations(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>>;

    /// Papers that `paper_id` cites; items carry `cited_paper`.
    async fn list_references(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>>;
}
