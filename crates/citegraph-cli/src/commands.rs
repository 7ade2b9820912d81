//! Subcommand handlers. Each prints a JSON summary on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use citegraph_builder::{CandidateDirection, Candidates, GraphBuilder, NetworkOptions};
use citegraph_core::{CitegraphConfig, RateLimiter, ReferenceDetails, YearRange};
use citegraph_eval::QualityEvaluator;
use citegraph_ingest::{extract_references, LopdfReader, ReferencePattern};
use citegraph_llm::{LlmClient, LlmConfig, StructuredClientFactory};
use citegraph_relate::{LlmRelationClassifier, RelationExtractor};
use citegraph_source::{ExternalSource, SemanticScholarClient};
use citegraph_store::{GraphStore, SnapshotOptions, SqliteGraphStore, TripletFilter};

pub struct BuildArgs {
    pub pdf: PathBuf,
    pub pages: Vec<u32>,
    pub pattern: ReferencePattern,
    pub max_papers: Option<usize>,
    pub expand: bool,
    pub fan_out: Option<usize>,
}

pub struct BuildApiArgs {
    pub title: String,
    pub direction: CandidateDirection,
    pub limit: usize,
    pub max_papers: Option<usize>,
    pub fan_out: Option<usize>,
    pub expand: bool,
    pub year: Option<YearRange>,
}

fn open_store(config: &CitegraphConfig) -> anyhow::Result<Arc<SqliteGraphStore>> {
    let store = SqliteGraphStore::open(&config.store.db_path)
        .with_context(|| format!("failed to open graph store at {}", config.store.db_path.display()))?;
    Ok(Arc::new(store))
}

fn source(config: &CitegraphConfig) -> anyhow::Result<Arc<SemanticScholarClient>> {
    Ok(Arc::new(SemanticScholarClient::new(&config.source)?))
}

fn limiter(config: &CitegraphConfig) -> RateLimiter {
    RateLimiter::new(config.pacing.rate_limit_delay())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn build(config: &CitegraphConfig, seed: ReferenceDetails, args: BuildArgs) -> anyhow::Result<()> {
    let references = extract_references(&LopdfReader::new(), args.pattern, &args.pdf, &args.pages)
        .with_context(|| format!("failed to read references from {}", args.pdf.display()))?;
    info!("Parsed {} references from {}", references.len(), args.pdf.display());

    let builder = GraphBuilder::new(open_store(config)?, source(config)?, limiter(config));

    if args.expand {
        let options = NetworkOptions {
            max_papers: args.max_papers,
            include_expansion: true,
            max_fan_out_per_paper: args.fan_out.unwrap_or(config.limits.max_fan_out_per_paper),
            year: config.limits.year,
        };
        let report = builder.add_seed_with_network(&seed, &references, &options).await?;
        print_json(&json!({
            "seed": seed.title,
            "references_parsed": references.len(),
            "stats": report.stats,
            "failed": report.failed,
        }))
    } else {
        let outcome = builder
            .add_seed_with_references(&seed, &references, args.max_papers)
            .await?;
        print_json(&json!({
            "seed": seed.title,
            "references_parsed": references.len(),
            "succeeded": outcome.succeeded.len(),
            "failed": outcome.failed,
        }))
    }
}

pub async fn build_api(config: &CitegraphConfig, args: BuildApiArgs) -> anyhow::Result<()> {
    let source = source(config)?;
    let limiter = limiter(config);

    limiter.wait().await;
    let seed = source
        .find_by_title(&args.title)
        .await?
        .with_context(|| format!("seed paper not found: {}", args.title))?;

    let builder = GraphBuilder::new(open_store(config)?, source, limiter);
    let options = NetworkOptions {
        max_papers: args.max_papers,
        include_expansion: args.expand,
        max_fan_out_per_paper: args.fan_out.unwrap_or(config.limits.max_fan_out_per_paper),
        year: args.year,
    };
    let candidates = Candidates::FetchOnDemand {
        direction: args.direction,
        limit: args.limit,
    };
    let report = builder.add_from_api_result(&seed, candidates, &options).await?;

    print_json(&json!({
        "seed": seed.paper_id,
        "title": seed.title,
        "stats": report.stats,
        "failed": report.failed,
    }))
}

pub async fn relate(config: &CitegraphConfig, filter: TripletFilter, max_retries: Option<u32>) -> anyhow::Result<()> {
    let llm_config = LlmConfig::from_env()?;
    let llm = Arc::new(LlmClient::from_config(&llm_config)?);
    info!("Classifying with {} ({})", llm.provider(), llm.model());

    let factory = StructuredClientFactory::new(llm);
    let classifier = Arc::new(LlmRelationClassifier::new(&factory));
    let mut extractor = RelationExtractor::new(
        open_store(config)?,
        classifier,
        RateLimiter::new(config.pacing.classify_delay()),
    );
    if let Some(n) = max_retries {
        extractor = extractor.with_max_retries(n);
    }

    let report = extractor.process_all(&filter).await?;
    print_json(&report)
}

pub fn evaluate(config: &CitegraphConfig, options: &SnapshotOptions) -> anyhow::Result<()> {
    let snapshot = open_store(config)?.fetch_snapshot(options)?;
    let report = QualityEvaluator::new(snapshot).evaluate_all();
    print_json(&report)
}

pub fn stats(config: &CitegraphConfig) -> anyhow::Result<()> {
    print_json(&open_store(config)?.stats()?)
}
