//! Seed resolution, reference linking and one-hop frontier expansion.
//!
//! Every call to the bibliographic source is paced through the rate
//! limiter. Node upserts always precede the edges that reference them.
//! Per-item failures are collected and returned; only a seed that
//! cannot be resolved or stored aborts a build.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use citegraph_core::{CitationItem, Error, Page, PaperRecord, RateLimiter, ReferenceDetails, Result};
use citegraph_source::{ExternalSource, PageRequest};
use citegraph_store::GraphStore;

use crate::types::*;

pub struct GraphBuilder {
    store: Arc<dyn GraphStore>,
    source: Arc<dyn ExternalSource>,
    limiter: RateLimiter,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn GraphStore>, source: Arc<dyn ExternalSource>, limiter: RateLimiter) -> Self {
        Self {
            store,
            source,
            limiter,
        }
    }

    /// Resolve and store the seed, then resolve each reference by title and
    /// link `seed -> reference`. Stops after `max_papers` successes.
    pub async fn add_seed_with_references(
        &self,
        seed: &ReferenceDetails,
        references: &[ReferenceDetails],
        max_papers: Option<usize>,
    ) -> Result<ReferenceOutcome> {
        let seed_id = self.resolve_seed(seed).await?;
        let mut stats = BuildStats::default();
        let mut failed = Vec::new();
        let resolved = self
            .resolve_references(&seed_id, references, max_papers, &mut stats, &mut failed)
            .await;

        info!(
            "Seed '{}': {} references added, {} failed",
            seed.title,
            resolved.len(),
            failed.len()
        );
        Ok(ReferenceOutcome {
            succeeded: resolved.into_iter().map(|(reference, _)| reference).collect(),
            failed,
        })
    }

    /// As [`add_seed_with_references`](Self::add_seed_with_references), then
    /// expand one hop of citing papers over the seed and every resolved reference.
    pub async fn add_seed_with_network(
        &self,
        seed: &ReferenceDetails,
        references: &[ReferenceDetails],
        options: &NetworkOptions,
    ) -> Result<BuildReport> {
        let seed_id = self.resolve_seed(seed).await?;
        let mut stats = BuildStats {
            seed_papers: 1,
            total_papers: 1,
            ..Default::default()
        };
        let mut failed = Vec::new();

        let resolved = self
            .resolve_references(&seed_id, references, options.max_papers, &mut stats, &mut failed)
            .await;

        if options.expands() {
            let mut frontier = vec![seed_id];
            frontier.extend(resolved.into_iter().map(|(_, id)| id));
            self.expand_frontier(&frontier, options, &mut stats, &mut failed).await;
        }

        Ok(self.finish(stats, failed))
    }

    /// Build from a pre-fetched seed record. Candidates carrying
    /// `citingPaper` are linked `candidate -> seed`; candidates carrying
    /// `citedPaper` are linked `seed -> candidate`. Expansion runs over the
    /// stored candidates.
    pub async fn add_from_api_result(
        &self,
        seed: &PaperRecord,
        candidates: Candidates,
        options: &NetworkOptions,
    ) -> Result<BuildReport> {
        let seed_id = seed.require_id()?.to_string();
        self.store.upsert_paper_record(seed)?;
        info!("Added seed paper: {}", seed.display_title());

        let mut stats = BuildStats {
            seed_papers: 1,
            total_papers: 1,
            ..Default::default()
        };
        let mut failed = Vec::new();

        let items = match candidates {
            Candidates::Prefetched(items) => items,
            Candidates::FetchOnDemand { direction, limit } => {
                self.fetch_candidates(&seed_id, direction, limit, options, &mut failed)
                    .await
            }
        };
        info!("Processing {} candidates for {}", items.len(), seed_id);

        let mut frontier = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if options.reached(stats.resolved_references) {
                info!("Reached max papers ({}), stopping", stats.resolved_references);
                break;
            }
            match self.add_candidate(&seed_id, item) {
                Ok(candidate_id) => {
                    stats.resolved_references += 1;
                    stats.total_papers += 1;
                    stats.total_relationships += 1;
                    frontier.push(candidate_id);
                }
                Err(e) => {
                    let label = candidate_paper(item)
                        .map(|p| p.display_title().to_string())
                        .unwrap_or_else(|| format!("candidate #{}", i + 1));
                    warn!("Failed to add candidate {}: {}", label, e);
                    failed.push(FailedItem::from_error(label, &e));
                }
            }
        }

        if options.expands() {
            self.expand_frontier(&frontier, options, &mut stats, &mut failed).await;
        }

        Ok(self.finish(stats, failed))
    }

    async fn resolve_seed(&self, seed: &ReferenceDetails) -> Result<String> {
        info!("Adding seed paper: {}", seed.title);
        self.limiter.wait().await;
        let record = self
            .source
            .find_by_title(&seed.title)
            .await?
            .ok_or_else(|| Error::NotFound(format!("seed paper not found: {}", seed.title)))?;
        self.store.upsert_paper_record(&record)
    }

    /// Returns each resolved reference with its stored paper id.
    async fn resolve_references(
        &self,
        seed_id: &str,
        references: &[ReferenceDetails],
        max_papers: Option<usize>,
        stats: &mut BuildStats,
        failed: &mut Vec<FailedItem>,
    ) -> Vec<(ReferenceDetails, String)> {
        let mut resolved = Vec::new();
        for reference in references {
            if max_papers.is_some_and(|max| resolved.len() >= max) {
                info!("Reached max papers ({}), stopping", resolved.len());
                break;
            }

            match self.resolve_reference(seed_id, reference).await {
                Ok(paper_id) => {
                    stats.resolved_references += 1;
                    stats.total_papers += 1;
                    stats.total_relationships += 1;
                    resolved.push((reference.clone(), paper_id));
                }
                Err(e) => {
                    warn!("Reference [{}] '{}' not added: {}", reference.id, reference.title, e);
                    failed.push(FailedItem::for_reference(reference, FailureKind::from(&e), e.to_string()));
                }
            }
        }
        resolved
    }

    async fn resolve_reference(&self, seed_id: &str, reference: &ReferenceDetails) -> Result<String> {
        self.limiter.wait().await;
        let record = self
            .source
            .find_by_title(&reference.title)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no match for '{}'", reference.title)))?;
        let paper_id = self.store.upsert_paper_record(&record)?;
        self.store.link_cites(seed_id, &paper_id)?;
        Ok(paper_id)
    }

    fn add_candidate(&self, seed_id: &str, item: &CitationItem) -> Result<String> {
        if let Some(citing) = &item.citing_paper {
            let citing_id = self.store.upsert_paper_record(citing)?;
            self.store.link_cites(&citing_id, seed_id)?;
            Ok(citing_id)
        } else if let Some(cited) = &item.cited_paper {
            let cited_id = self.store.upsert_paper_record(cited)?;
            self.store.link_cites(seed_id, &cited_id)?;
            Ok(cited_id)
        } else {
            Err(Error::InvalidRecord(
                "candidate carries neither citingPaper nor citedPaper".into(),
            ))
        }
    }

    async fn fetch_candidates(
        &self,
        seed_id: &str,
        direction: CandidateDirection,
        limit: usize,
        options: &NetworkOptions,
        failed: &mut Vec<FailedItem>,
    ) -> Vec<CitationItem> {
        let result = self
            .fetch_paged(seed_id, limit, options, |request| match direction {
                CandidateDirection::Citations => self.source.list_citations(seed_id, request),
                CandidateDirection::References => self.source.list_references(seed_id, request),
            })
            .await;
        match result {
            Ok(items) => items,
            Err((items, e)) => {
                warn!("Fetching {:?} of {} failed after {} items: {}", direction, seed_id, items.len(), e);
                failed.push(FailedItem::from_error(seed_id, &e));
                items
            }
        }
    }

    /// One hop: store up to `max_fan_out_per_paper` citers of each frontier
    /// paper and link `citer -> paper`.
    async fn expand_frontier(
        &self,
        frontier: &[String],
        options: &NetworkOptions,
        stats: &mut BuildStats,
        failed: &mut Vec<FailedItem>,
    ) {
        let mut seen = HashSet::new();
        let frontier: Vec<&String> = frontier.iter().filter(|id| seen.insert(id.as_str())).collect();
        info!(
            "Expanding citation network of {} papers (fan-out {})",
            frontier.len(),
            options.max_fan_out_per_paper
        );

        for paper_id in frontier {
            let items = match self
                .fetch_paged(paper_id, options.max_fan_out_per_paper, options, |request| {
                    self.source.list_citations(paper_id, request)
                })
                .await
            {
                Ok(items) => items,
                Err((items, e)) => {
                    warn!("Citations of {} failed after {} items: {}", paper_id, items.len(), e);
                    failed.push(FailedItem::from_error(paper_id.as_str(), &e));
                    items
                }
            };

            for item in &items {
                let Some(citing) = &item.citing_paper else {
                    continue;
                };
                match self.link_citer(paper_id, citing) {
                    Ok(()) => {
                        stats.expansion_added += 1;
                        stats.total_papers += 1;
                        stats.total_relationships += 1;
                    }
                    Err(e) => {
                        warn!("Citer '{}' of {} not added: {}", citing.display_title(), paper_id, e);
                        failed.push(FailedItem::from_error(citing.display_title(), &e));
                    }
                }
            }
        }
    }

    fn link_citer(&self, cited_id: &str, citing: &PaperRecord) -> Result<()> {
        let citing_id = self.store.upsert_paper_record(citing)?;
        self.store.link_cites(&citing_id, cited_id)
    }

    /// Collect up to `limit` items across pages. On a failed page the items
    /// gathered so far are returned with the error.
    async fn fetch_paged<F, Fut>(
        &self,
        paper_id: &str,
        limit: usize,
        options: &NetworkOptions,
        fetch: F,
    ) -> std::result::Result<Vec<CitationItem>, (Vec<CitationItem>, Error)>
    where
        F: Fn(PageRequest) -> Fut,
        Fut: std::future::Future<Output = Result<Page<CitationItem>>>,
    {
        let mut items = Vec::new();
        let mut offset = 0;
        while items.len() < limit {
            let request = PageRequest::new(limit - items.len())
                .with_offset(offset)
                .with_year(options.year);
            self.limiter.wait().await;
            let page = match fetch(request).await {
                Ok(page) => page,
                Err(e) => return Err((items, e)),
            };

            let received = page.data.len();
            items.extend(page.data.into_iter().take(limit - items.len()));
            match page.next {
                Some(next) if received > 0 && next > offset => offset = next,
                _ => break,
            }
        }
        debug!("Fetched {} items for {}", items.len(), paper_id);
        Ok(items)
    }

    fn finish(&self, stats: BuildStats, failed: Vec<FailedItem>) -> BuildReport {
        info!(
            "Completed: {} papers, {} relationships ({} references, {} from expansion, {} failed)",
            stats.total_papers,
            stats.total_relationships,
            stats.resolved_references,
            stats.expansion_added,
            failed.len()
        );
        BuildReport { stats, failed }
    }
}

fn candidate_paper(item: &CitationItem) -> Option<&PaperRecord> {
    item.citing_paper.as_ref().or(item.cited_paper.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use citegraph_core::YearRange;
    use citegraph_store::SqliteGraphStore;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSource {
        by_title: HashMap<String, PaperRecord>,
        failing_titles: Vec<String>,
        citers: HashMap<String, Vec<PaperRecord>>,
        references: HashMap<String, Vec<PaperRecord>>,
        title_lookups: Mutex<Vec<String>>,
        page_requests: Mutex<Vec<(String, PageRequest)>>,
        /// Largest page served; 0 serves whatever is asked for.
        page_cap: usize,
    }

    impl FakeSource {
        fn with_paper(mut self, id: &str, title: &str) -> Self {
            self.by_title.insert(title.to_string(), paper(id, title));
            self
        }

        fn with_citers(mut self, id: &str, citers: &[&str]) -> Self {
            self.citers.insert(
                id.to_string(),
                citers.iter().map(|c| paper(c, &format!("Paper {}", c))).collect(),
            );
            self
        }

        fn page_of(
            &self,
            all: &[PaperRecord],
            request: PageRequest,
            wrap: fn(PaperRecord) -> CitationItem,
        ) -> Page<CitationItem> {
            let size = if self.page_cap > 0 {
                request.limit.min(self.page_cap)
            } else {
                request.limit
            };
            let data: Vec<CitationItem> = all
                .iter()
                .skip(request.offset)
                .take(size)
                .cloned()
                .map(wrap)
                .collect();
            let end = request.offset + data.len();
            Page {
                offset: request.offset,
                next: (end < all.len()).then_some(end),
                data,
            }
        }
    }

    #[async_trait]
    impl ExternalSource for FakeSource {
        async fn find_by_title(&self, title: &str) -> Result<Option<PaperRecord>> {
            self.title_lookups.lock().push(title.to_string());
            if self.failing_titles.iter().any(|t| t == title) {
                return Err(Error::Source("HTTP 500".into()));
            }
            Ok(self.by_title.get(title).cloned())
        }

        async fn find_by_id(&self, paper_id: &str) -> Result<Option<PaperRecord>> {
            Ok(self
                .by_title
                .values()
                .find(|p| p.paper_id.as_deref() == Some(paper_id))
                .cloned())
        }

        async fn list_citations(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>> {
            self.page_requests.lock().push((paper_id.to_string(), page));
            if paper_id == "broken" {
                return Err(Error::Source("HTTP 503".into()));
            }
            let all = self.citers.get(paper_id).cloned().unwrap_or_default();
            Ok(self.page_of(&all, page, CitationItem::citing))
        }

        async fn list_references(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>> {
            self.page_requests.lock().push((paper_id.to_string(), page));
            let all = self.references.get(paper_id).cloned().unwrap_or_default();
            Ok(self.page_of(&all, page, CitationItem::cited))
        }
    }

    fn paper(id: &str, title: &str) -> PaperRecord {
        PaperRecord::new(id, title)
    }

    fn reference(id: u32, title: &str) -> ReferenceDetails {
        ReferenceDetails::new(id, "A. Author", "2020", title, "Venue", "").unwrap()
    }

    fn seed() -> ReferenceDetails {
        reference(0, "Seed Survey")
    }

    fn test_store() -> (Arc<SqliteGraphStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();
        (Arc::new(store), dir)
    }

    fn builder(store: &Arc<SqliteGraphStore>, source: &Arc<FakeSource>) -> GraphBuilder {
        GraphBuilder::new(store.clone(), source.clone(), RateLimiter::unpaced())
    }

    fn base_source() -> FakeSource {
        FakeSource::default()
            .with_paper("S", "Seed Survey")
            .with_paper("R1", "TransE")
            .with_paper("R2", "RotatE")
    }

    #[tokio::test]
    async fn test_three_references_two_resolve() {
        let (store, _dir) = test_store();
        let source = Arc::new(base_source());
        let refs = vec![reference(1, "TransE"), reference(2, "Unknown Paper"), reference(3, "RotatE")];

        let outcome = builder(&store, &source)
            .add_seed_with_references(&seed(), &refs, None)
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].label, "Unknown Paper");
        assert_eq!(outcome.failed[0].kind, FailureKind::NotFound);
        assert_eq!(outcome.failed[0].reference.as_ref().map(|r| r.id), Some(2));
        assert_eq!(store.citations_from("S").unwrap(), vec!["R1".to_string(), "R2".to_string()]);
        assert_eq!(store.stats().unwrap().citations, 2);
    }

    #[tokio::test]
    async fn test_missing_seed_is_fatal() {
        let (store, _dir) = test_store();
        let source = Arc::new(FakeSource::default().with_paper("R1", "TransE"));

        let err = builder(&store, &source)
            .add_seed_with_references(&seed(), &[reference(1, "TransE")], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "not_found");
        assert_eq!(source.title_lookups.lock().len(), 1);
        assert_eq!(store.stats().unwrap().papers, 0);
    }

    #[tokio::test]
    async fn test_max_papers_stops_early() {
        let (store, _dir) = test_store();
        let source = Arc::new(base_source().with_paper("R3", "ComplEx"));
        let refs = vec![reference(1, "TransE"), reference(2, "RotatE"), reference(3, "ComplEx")];

        let outcome = builder(&store, &source)
            .add_seed_with_references(&seed(), &refs, Some(2))
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert!(outcome.failed.is_empty());
        // seed + two references; the third title is never looked up
        assert_eq!(source.title_lookups.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_source_error_is_recorded_and_run_continues() {
        let (store, _dir) = test_store();
        let mut fake = base_source();
        fake.failing_titles.push("TransE".into());
        let source = Arc::new(fake);
        let refs = vec![reference(1, "TransE"), reference(2, "RotatE")];

        let outcome = builder(&store, &source)
            .add_seed_with_references(&seed(), &refs, None)
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(outcome.failed[0].kind, FailureKind::Source);
        assert_eq!(store.citations_from("S").unwrap(), vec!["R2".to_string()]);
    }

    #[tokio::test]
    async fn test_network_expansion_is_paged_and_bounded() {
        let (store, _dir) = test_store();
        let mut fake = base_source()
            .with_citers("S", &["C1"])
            .with_citers("R1", &["C2", "C3", "C4", "C5", "C6"]);
        fake.page_cap = 2;
        let source = Arc::new(fake);
        let options = NetworkOptions {
            max_fan_out_per_paper: 3,
            year: Some("2022:2023".parse::<YearRange>().unwrap()),
            ..Default::default()
        };

        let report = builder(&store, &source)
            .add_seed_with_network(&seed(), &[reference(1, "TransE"), reference(2, "RotatE")], &options)
            .await
            .unwrap();

        assert_eq!(
            report.stats,
            BuildStats {
                seed_papers: 1,
                resolved_references: 2,
                expansion_added: 4,
                total_papers: 7,
                total_relationships: 6,
            }
        );
        assert!(report.failed.is_empty());
        assert_eq!(store.citations_from("C4").unwrap(), vec!["R1".to_string()]);
        assert!(store.get_paper("C5").unwrap().is_none());

        let requests = source.page_requests.lock();
        assert!(requests.iter().all(|(_, r)| r.year == options.year && r.limit <= 3));
        let r1: Vec<&PageRequest> = requests.iter().filter(|(id, _)| id == "R1").map(|(_, r)| r).collect();
        assert_eq!(r1.len(), 2);
        assert_eq!((r1[1].offset, r1[1].limit), (2, 1));
    }

    #[tokio::test]
    async fn test_network_without_expansion() {
        let (store, _dir) = test_store();
        let source = Arc::new(base_source().with_citers("S", &["C1"]));
        let options = NetworkOptions {
            include_expansion: false,
            ..Default::default()
        };

        let report = builder(&store, &source)
            .add_seed_with_network(&seed(), &[reference(1, "TransE")], &options)
            .await
            .unwrap();

        assert_eq!(report.stats.expansion_added, 0);
        assert_eq!(report.stats.total_papers, 2);
        assert!(source.page_requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_api_result_edge_directions() {
        let (store, _dir) = test_store();
        let source = Arc::new(FakeSource::default());
        let candidates = Candidates::Prefetched(vec![
            CitationItem::citing(paper("A", "Citer")),
            CitationItem::cited(paper("B", "Cited")),
            CitationItem::citing(PaperRecord {
                paper_id: None,
                ..paper("", "No id")
            }),
            CitationItem::default(),
        ]);
        let options = NetworkOptions {
            include_expansion: false,
            ..Default::default()
        };

        let report = builder(&store, &source)
            .add_from_api_result(&paper("S", "Seed"), candidates, &options)
            .await
            .unwrap();

        assert_eq!(report.stats.resolved_references, 2);
        assert_eq!(report.stats.total_relationships, 2);
        assert_eq!(store.citations_from("A").unwrap(), vec!["S".to_string()]);
        assert_eq!(store.citations_from("S").unwrap(), vec!["B".to_string()]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].kind, FailureKind::InvalidRecord);
        assert_eq!(report.failed[0].label, "No id");
        assert_eq!(report.failed[1].label, "candidate #4");
    }

    #[tokio::test]
    async fn test_api_result_fetch_on_demand_with_expansion() {
        let (store, _dir) = test_store();
        let mut fake = FakeSource::default().with_citers("B", &["X"]);
        fake.references.insert(
            "S".into(),
            vec![paper("B", "Cited"), paper("broken", "Flaky"), paper("D", "Third")],
        );
        let source = Arc::new(fake);
        let options = NetworkOptions {
            max_papers: Some(2),
            ..Default::default()
        };

        let report = builder(&store, &source)
            .add_from_api_result(
                &paper("S", "Seed"),
                Candidates::FetchOnDemand {
                    direction: CandidateDirection::References,
                    limit: 10,
                },
                &options,
            )
            .await
            .unwrap();

        assert_eq!(report.stats.resolved_references, 2);
        assert_eq!(report.stats.expansion_added, 1);
        assert_eq!(store.citations_from("S").unwrap(), vec!["B".to_string(), "broken".to_string()]);
        assert_eq!(store.citations_from("X").unwrap(), vec!["B".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].label, "broken");
        assert_eq!(report.failed[0].kind, FailureKind::Source);
    }

    #[tokio::test]
    async fn test_seed_record_without_id_is_fatal() {
        let (store, _dir) = test_store();
        let source = Arc::new(FakeSource::default());
        let seed = PaperRecord {
            paper_id: None,
            ..paper("", "Seed")
        };

        let err = builder(&store, &source)
            .add_from_api_result(&seed, Candidates::Prefetched(vec![]), &NetworkOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_record");
    }

    #[tokio::test]
    async fn test_rebuild_converges() {
        let (store, _dir) = test_store();
        let source = Arc::new(base_source().with_citers("R1", &["C1"]));
        let refs = vec![reference(1, "TransE"), reference(2, "RotatE")];
        let b = builder(&store, &source);

        b.add_seed_with_network(&seed(), &refs, &NetworkOptions::default()).await.unwrap();
        let first = store.stats().unwrap();
        b.add_seed_with_network(&seed(), &refs, &NetworkOptions::default()).await.unwrap();
        let second = store.stats().unwrap();

        assert_eq!(first.papers, second.papers);
        assert_eq!(first.citations, second.citations);
        assert_eq!(second.citations, 3);
    }
}
