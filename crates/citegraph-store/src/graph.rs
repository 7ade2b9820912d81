//! The graph-store boundary used by the builder and the extractor.

use citegraph_core::{AuthorRecord, GraphSnapshot, PaperRecord, Result, VenueRecord};

use crate::types::{CitationTriplet, SemanticRelation, SnapshotOptions, TripletFilter};

/// Property-graph store with MERGE semantics.
///
/// Every write converges: repeating it leaves exactly one node or edge
/// with the most recent attributes. Edge writes require both endpoints
/// to exist already.
pub trait GraphStore: Send + Sync {
    /// Create or overwrite a paper node. Returns its id.
    fn upsert_paper(&self, paper: &PaperRecord) -> Result<String>;

    /// Create an author node, or refresh `updated_at` on an existing one.
    fn upsert_author(&self, author: &AuthorRecord) -> Result<String>;

    /// Create or re-order an AUTHORED_BY edge.
    fn link_authorship(&self, paper_id: &str, author_id: &str, order: u32) -> Result<()>;

    /// Create or overwrite a venue node. Returns its id.
    fn upsert_venue(&self, venue: &VenueRecord) -> Result<String>;

    fn link_published_in(&self, paper_id: &str, venue_id: &str) -> Result<()>;

    /// Create a CITES edge from `citing_id` to `cited_id`.
    fn link_cites(&self, citing_id: &str, cited_id: &str) -> Result<()>;

    /// Citation pairs that pass `filter`, most-cited target first.
    fn fetch_unclassified_triplets(&self, filter: &TripletFilter) -> Result<Vec<CitationTriplet>>;

    /// Merge typed semantic edges for one pair. Returns the number written.
    fn save_semantic_relationships(
        &self,
        citing_id: &str,
        cited_id: &str,
        relations: &[SemanticRelation],
    ) -> Result<usize>;

    /// Paper nodes and paper-to-paper edges for evaluation.
    fn fetch_snapshot(&self, options: &SnapshotOptions) -> Result<GraphSnapshot>;

    /// Upsert a paper together with its valid authors (byline order) and venue.
    fn upsert_paper_record(&self, paper: &PaperRecord) -> Result<String> {
        let paper_id = self.upsert_paper(paper)?;

        for (i, author) in paper.valid_authors().enumerate() {
            let author_id = self.upsert_author(author)?;
            self.link_authorship(&paper_id, &author_id, i as u32 + 1)?;
        }

        if let Some(venue) = paper.publication_venue.as_ref().filter(|v| !v.id.is_empty()) {
            let venue_id = self.upsert_venue(venue)?;
            self.link_published_in(&paper_id, &venue_id)?;
        }

        Ok(paper_id)
    }
}
