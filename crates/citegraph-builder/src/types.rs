//! Options, statistics and failure records for graph builds.

use serde::{Deserialize, Serialize};

use citegraph_core::config::LimitsConfig;
use citegraph_core::config::DEFAULT_MAX_FAN_OUT;
use citegraph_core::{CitationItem, Error, ReferenceDetails, YearRange};

/// Bounds for a network build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkOptions {
    /// Stop resolving candidates after this many successes.
    pub max_papers: Option<usize>,
    /// Run the one-hop expansion over resolved papers.
    pub include_expansion: bool,
    /// Citing papers fetched per frontier paper.
    pub max_fan_out_per_paper: usize,
    /// Publication-year filter for listed papers.
    pub year: Option<YearRange>,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            max_papers: None,
            include_expansion: true,
            max_fan_out_per_paper: DEFAULT_MAX_FAN_OUT,
            year: None,
        }
    }
}

impl NetworkOptions {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            max_papers: limits.max_papers,
            include_expansion: true,
            max_fan_out_per_paper: limits.max_fan_out_per_paper,
            year: limits.year,
        }
    }

    pub(crate) fn expands(&self) -> bool {
        self.include_expansion && self.max_fan_out_per_paper > 0
    }

    pub(crate) fn reached(&self, successes: usize) -> bool {
        self.max_papers.is_some_and(|max| successes >= max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub seed_papers: usize,
    pub resolved_references: usize,
    pub expansion_added: usize,
    /// Paper upserts performed, seed included.
    pub total_papers: usize,
    /// CITES edges written.
    pub total_relationships: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Source,
    Store,
    InvalidRecord,
    /// Any failure outside the source, store and record checks.
    Other,
}

impl From<&Error> for FailureKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::NotFound(_) => Self::NotFound,
            Error::Source(_) => Self::Source,
            Error::Store(_) => Self::Store,
            Error::InvalidRecord(_) => Self::InvalidRecord,
            Error::Validation(_)
            | Error::Classification(_)
            | Error::Config(_)
            | Error::Pdf(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => Self::Other,
        }
    }
}

/// An item the build could not add. Never retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Reference title, paper id or other human-readable handle.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceDetails>,
    pub kind: FailureKind,
    pub reason: String,
}

impl FailedItem {
    pub fn new(label: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reference: None,
            kind,
            reason: reason.into(),
        }
    }

    pub fn from_error(label: impl Into<String>, e: &Error) -> Self {
        Self::new(label, FailureKind::from(e), e.to_string())
    }

    pub fn for_reference(reference: &ReferenceDetails, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.clone()),
            ..Self::new(reference.title.clone(), kind, reason)
        }
    }
}

/// Result of resolving a seed's parsed references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceOutcome {
    pub succeeded: Vec<ReferenceDetails>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub stats: BuildStats,
    pub failed: Vec<FailedItem>,
}

/// Which listing to pull candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateDirection {
    /// Papers citing the seed.
    Citations,
    /// Papers the seed cites.
    References,
}

/// Candidate papers for an API-driven build.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates {
    /// Items already fetched by the caller.
    Prefetched(Vec<CitationItem>),
    /// Fetch up to `limit` items for the seed, paged through the rate limiter.
    FetchOnDemand {
        direction: CandidateDirection,
        limit: usize,
    },
}
