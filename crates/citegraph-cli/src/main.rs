//! CiteGraph — build a citation graph from a paper's references, annotate
//! it with semantic relations and score its quality.

mod args;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use citegraph_core::{CitegraphConfig, YearRange};
use citegraph_ingest::ReferencePattern;

use args::{parse_delay, parse_pages, DirectionArg, PageList};

#[derive(Parser, Debug)]
#[command(name = "citegraph", version, about, long_about = None)]
struct Cli {
    /// Graph database file (overrides CITEGRAPH_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Seconds between bibliographic API calls (overrides CITEGRAPH_RATE_LIMIT_SECS)
    #[arg(long, global = true, value_parser = parse_delay)]
    rate_limit: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the graph from the reference section of a PDF
    Build {
        /// The seed paper's PDF
        pdf: PathBuf,
        /// Title of the seed paper
        #[arg(long)]
        title: String,
        #[arg(long)]
        authors: String,
        #[arg(long)]
        year: String,
        /// Publication venue of the seed paper
        #[arg(long)]
        venue: String,
        /// Reference pages, e.g. `32-42` or `32,33,34` (all pages if omitted)
        #[arg(long, value_parser = parse_pages)]
        pages: Option<PageList>,
        /// Reference numbering: bracketed (`[12]`) or numbered (`12.`)
        #[arg(long, default_value = "bracketed")]
        pattern: ReferencePattern,
        #[arg(long)]
        max_papers: Option<usize>,
        /// Also add one hop of papers citing the seed and its references
        #[arg(long)]
        expand: bool,
        /// Citing papers fetched per paper during expansion
        #[arg(long)]
        fan_out: Option<usize>,
    },
    /// Build the graph from Semantic Scholar listings around a seed title
    BuildApi {
        #[arg(long)]
        title: String,
        #[arg(long, value_enum, default_value_t = DirectionArg::Citations)]
        direction: DirectionArg,
        /// Candidates fetched for the seed
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long)]
        max_papers: Option<usize>,
        #[arg(long)]
        fan_out: Option<usize>,
        /// Skip the one-hop expansion over candidates
        #[arg(long)]
        no_expand: bool,
        /// Publication year filter, e.g. `2022:2023`
        #[arg(long)]
        year: Option<YearRange>,
    },
    /// Classify unannotated citation pairs with the language model
    Relate {
        /// Minimum citation count of the cited paper
        #[arg(long, default_value_t = 0)]
        min_citations: i64,
        #[arg(long)]
        min_year_cited: Option<i32>,
        #[arg(long)]
        min_year_citing: Option<i32>,
        /// Include pairs that already carry a semantic relation
        #[arg(long)]
        all: bool,
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Compute quality metrics over the stored graph
    Evaluate {
        /// Include plain CITES edges in the snapshot
        #[arg(long)]
        with_citations: bool,
        /// Maximum number of edges read
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CitegraphConfig::from_env()?;
    if let Some(db) = cli.db {
        config.store.db_path = db;
    }
    if let Some(secs) = cli.rate_limit {
        config.pacing.rate_limit_delay_secs = secs;
    }
    info!("Graph database: {}", config.store.db_path.display());

    match cli.command {
        Command::Build {
            pdf,
            title,
            authors,
            year,
            venue,
            pages,
            pattern,
            max_papers,
            expand,
            fan_out,
        } => {
            let seed = citegraph_core::ReferenceDetails::new(0, authors, year, title, venue, "")?;
            let build = commands::BuildArgs {
                pdf,
                pages: pages.map(|p| p.0).unwrap_or_default(),
                pattern,
                max_papers: max_papers.or(config.limits.max_papers),
                expand,
                fan_out,
            };
            commands::build(&config, seed, build).await
        }
        Command::BuildApi {
            title,
            direction,
            limit,
            max_papers,
            fan_out,
            no_expand,
            year,
        } => {
            let build = commands::BuildApiArgs {
                title,
                direction: direction.into(),
                limit,
                max_papers: max_papers.or(config.limits.max_papers),
                fan_out,
                expand: !no_expand,
                year: year.or(config.limits.year),
            };
            commands::build_api(&config, build).await
        }
        Command::Relate {
            min_citations,
            min_year_cited,
            min_year_citing,
            all,
            max_retries,
        } => {
            let filter = citegraph_store::TripletFilter {
                min_citation_count: min_citations,
                min_year_cited,
                min_year_citing,
                include_classified: all,
            };
            commands::relate(&config, filter, max_retries).await
        }
        Command::Evaluate { with_citations, limit } => {
            let options = citegraph_store::SnapshotOptions {
                include_citations: with_citations,
                limit,
            };
            commands::evaluate(&config, &options)
        }
        Command::Stats => commands::stats(&config),
    }
}
