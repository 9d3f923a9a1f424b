//! Credence CLI
//!
//! Inspect and update the source reliability ledger, and evaluate content
//! by crawling outward from it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use credence_core::{
    canonicalize_domain, curated_with, ContentKind, DomainRegistry, Membership, ReliabilityEvent,
};
use credence_engine::{HttpFetcher, PageFetcher};
use credence_runtime::{
    build_registry, save_snapshot, ContentItem, CredenceConfig, ValidationPipeline,
};

#[derive(Parser)]
#[command(name = "credence")]
#[command(author, version, about = "Credence: source reliability and knowledge validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, env = "CREDENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger snapshot file (overrides the config)
    #[arg(long, env = "CREDENCE_LEDGER")]
    ledger: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the curated reliable and unreliable sources
    Seeds,

    /// Show the reliability score of one or more URLs
    Score {
        /// URLs or domains to score
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Record an outcome for a URL's domain
    Report {
        /// URL or domain the outcome applies to
        url: String,

        /// The fetch or validation succeeded
        #[arg(long, conflicts_with = "failure", required_unless_present = "failure")]
        success: bool,

        /// The fetch or validation failed
        #[arg(long)]
        failure: bool,

        /// Record on the validation channel instead of the fetch channel
        #[arg(long)]
        validation: bool,
    },

    /// Evaluate content: crawl its links and synthesize a confidence
    Crawl {
        /// URL of the content item
        url: String,

        /// Read the content from a file instead of fetching the URL
        #[arg(long)]
        content: Option<PathBuf>,

        /// Maximum URLs processed, seed included
        #[arg(long)]
        max_links: Option<usize>,

        /// Kind of content (web-page, video, social-post)
        #[arg(long, default_value = "web-page")]
        kind: String,

        /// Write the full conclusion as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => CredenceConfig::load(path)?,
        None => CredenceConfig::default(),
    };
    if let Some(ledger) = cli.ledger {
        config.registry.snapshot_path = Some(ledger);
    }

    match cli.command {
        Commands::Seeds => list_seeds(),
        Commands::Score { urls } => {
            let registry = build_registry(&config)?;
            for url in &urls {
                print_score(&registry, url);
            }
        }
        Commands::Report {
            url,
            success,
            failure: _,
            validation,
        } => {
            report(&config, &url, success, validation)?;
        }
        Commands::Crawl {
            url,
            content,
            max_links,
            kind,
            output,
        } => {
            if let Some(max) = max_links {
                config.crawler.max_processed = max;
            }
            crawl(&config, &url, content.as_deref(), parse_kind(&kind)?, output).await?;
        }
    }

    Ok(())
}

fn list_seeds() {
    let registry = DomainRegistry::with_curated_seeds();
    for membership in [Membership::Reliable, Membership::Unreliable] {
        println!("{}:", membership);
        for source in curated_with(membership) {
            println!("  {:<28} score {:.2}", source.domain, registry.score(source.domain));
        }
    }
}

fn print_score(registry: &DomainRegistry, url: &str) {
    let domain = canonicalize_domain(url);
    match registry.record(url) {
        Some(record) => println!(
            "{:<28} {:<12} weight {:.2}  accuracy {}/{}  score {:.2}",
            domain,
            record.membership,
            record.weight,
            record.accuracy.correct,
            record.accuracy.total,
            record.score()
        ),
        None => println!(
            "{:<28} {:<12} (no history)  score {:.2}",
            domain,
            Membership::Neutral,
            registry.score(url)
        ),
    }
}

fn report(config: &CredenceConfig, url: &str, success: bool, validation: bool) -> Result<()> {
    let registry = build_registry(config)?;
    let mut events = registry.subscribe();

    if validation {
        registry.report_validation(url, success);
    } else {
        registry.report_fetch(url, success);
    }

    print_events(&mut events);
    print_score(&registry, url);
    persist(config, &registry)
}

async fn crawl(
    config: &CredenceConfig,
    url: &str,
    content_file: Option<&Path>,
    kind: ContentKind,
    output: Option<PathBuf>,
) -> Result<()> {
    let pipeline = ValidationPipeline::from_config(config)?;
    let mut events = pipeline.subscribe();

    let content = match content_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading content from {}", path.display()))?,
        None => {
            if pipeline.registry().is_red_flagged(url) {
                anyhow::bail!("{} is red-flagged; supply --content to evaluate it anyway", canonicalize_domain(url));
            }
            let fetcher = HttpFetcher::new(config.http.clone())?;
            match fetcher.fetch(url).await {
                Ok(content) => {
                    pipeline.registry().report_fetch(url, true);
                    content
                }
                Err(e) => {
                    pipeline.registry().report_fetch(url, false);
                    persist(config, pipeline.registry())?;
                    anyhow::bail!("failed to fetch {}: {}", url, e);
                }
            }
        }
    };

    let item = ContentItem::new(url, &content, kind);
    let conclusion = pipeline.evaluate(&item).await;

    println!("Subject:    {}", conclusion.subject_url);
    println!("Confidence: {:.2}", conclusion.confidence);
    println!(
        "Sources:    {} reliable, {} neutral, {} unreliable ({} total)",
        conclusion.breakdown.reliable,
        conclusion.breakdown.neutral,
        conclusion.breakdown.unreliable,
        conclusion.breakdown.total
    );
    println!("Insights:   {}", conclusion.insights.len());
    println!("Crawled:    {} pages ({:?})", conclusion.crawled.len(), conclusion.stop_reason);
    for link in &conclusion.crawled {
        println!(
            "  {:.2}  {}  ({} insights)",
            link.source_reliability,
            link.url,
            link.insights.len()
        );
    }
    print_events(&mut events);

    if let Some(path) = output {
        fs::write(&path, serde_json::to_string_pretty(&conclusion)?)?;
        println!("Conclusion saved to: {}", path.display());
    }

    persist(config, pipeline.registry())
}

fn print_events(events: &mut tokio::sync::broadcast::Receiver<ReliabilityEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            ReliabilityEvent::SourceRedFlagged {
                domain,
                consecutive_failures,
                total_usage,
                success_rate,
                ..
            } => println!(
                "RED FLAG  {} ({} consecutive failures, {} uses, {:.0}% success)",
                domain,
                consecutive_failures,
                total_usage,
                success_rate * 100.0
            ),
            ReliabilityEvent::SourceRecovered {
                domain,
                consecutive_successes,
                ..
            } => println!(
                "RECOVERED {} after {} consecutive successes",
                domain, consecutive_successes
            ),
        }
    }
}

fn persist(config: &CredenceConfig, registry: &DomainRegistry) -> Result<()> {
    match &config.registry.snapshot_path {
        Some(path) => save_snapshot(registry, path)?,
        None => warn!("No ledger configured; reliability changes were not saved (use --ledger)"),
    }
    Ok(())
}

fn parse_kind(kind: &str) -> Result<ContentKind> {
    match kind {
        "web-page" | "web" => Ok(ContentKind::WebPage),
        "video" => Ok(ContentKind::Video),
        "social-post" | "social" => Ok(ContentKind::SocialPost),
        other => anyhow::bail!("unknown content kind: {}", other),
    }
}
