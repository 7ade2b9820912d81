//! Row types, filters and semantic relation payloads.

use citegraph_core::{Confidence, RelationType};
use serde::{Deserialize, Serialize};

/// Provenance tag written on relations produced by the language model.
pub const PROVENANCE_LLM: &str = "llm";

/// A paper row from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPaper {
    pub paper_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub reference_count: i64,
    pub citation_count: i64,
    pub is_influential: bool,
    pub influential_citation_count: i64,
    pub is_open_access: bool,
    pub publication_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    pub fields_of_study: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An author row together with its byline position on a given paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuthor {
    pub author_id: String,
    pub name: String,
    pub author_order: u32,
}

/// A venue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVenue {
    pub venue_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_type: Option<String>,
    pub alternate_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Paper with its authors (byline order) and venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperDetails {
    pub paper: StoredPaper,
    pub authors: Vec<StoredAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<StoredVenue>,
}

/// A co-author and how many papers they share with the queried author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coauthor {
    pub author_id: String,
    pub name: String,
    pub papers_together: i64,
}

/// A citing → cited pair with both abstracts, ready for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationTriplet {
    pub citing_id: String,
    pub citing_title: String,
    pub citing_abstract: String,
    pub cited_id: String,
    pub cited_title: String,
    pub cited_abstract: String,
}

/// Selection thresholds for citation triplets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripletFilter {
    /// Minimum citation count of the cited paper.
    pub min_citation_count: i64,
    /// Minimum publication year of the cited paper.
    pub min_year_cited: Option<i32>,
    /// Minimum publication year of the citing paper.
    pub min_year_citing: Option<i32>,
    /// Also return pairs that already carry a semantic relation.
    pub include_classified: bool,
}

/// A typed semantic relation to persist between two papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRelation {
    pub relation: RelationType,
    pub confidence: Confidence,
    pub evidence: String,
    pub explanation: String,
    pub provenance: String,
}

/// A semantic relation row from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRelation {
    pub citing_id: String,
    pub cited_id: String,
    pub relation: RelationType,
    pub confidence: Confidence,
    pub evidence: String,
    pub explanation: String,
    pub provenance: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What to include when reading a snapshot for evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Include plain CITES edges alongside semantic edges.
    pub include_citations: bool,
    /// Upper bound on the number of edges read.
    pub limit: Option<usize>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub papers: i64,
    pub authors: i64,
    pub venues: i64,
    pub authorships: i64,
    pub publications: i64,
    pub citations: i64,
    pub semantic_relations: i64,
    pub db_path: String,
}
