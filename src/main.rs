// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (progress goes to stderr, results to stdout)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the jobs and a run summary
// 5. Exit with proper code (0 = crawl completed, 1 = crawl ended on a failed
//    fetch, 2 = error)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod fetch;
mod proxy;
mod record;
mod sites;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, CrawlArgs};
use config::ApiKeys;
use crawl::{CrawlOutcome, CrawlReport};
use fetch::HttpFetcher;
use record::JobRecord;
use sites::SiteKind;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "job_harvest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => handle_crawl(&args).await,
        Commands::Sites => {
            print_sites();
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: &CrawlArgs) -> Result<i32> {
    let site = args.site.extractor();
    let defaults = site.defaults();
    let provider = args.provider(&defaults);
    let settings = args.settings(&defaults, Local::now().date_naive());

    let seed = site
        .seed_url(&args.query, &args.location)
        .with_context(|| format!("could not build search URL for {}", site.name()))?;

    let keys = ApiKeys::from_env();
    let fetcher = HttpFetcher::new(
        provider,
        keys.key_for(provider),
        Duration::from_secs(args.timeout_secs),
    )
    .context("failed to create HTTP client")?;

    println!("🔍 Crawling {} via {}: {}", site.name(), provider.name(), seed);
    println!("📡 API call budget: {}", settings.max_calls);

    let report = crawl::crawl_site(site.as_ref(), &fetcher, &settings, seed).await;

    print_results(&report.records, args.json)?;
    print_summary(&report);

    if report.failed() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the records either as a table or JSON
fn print_results(records: &[JobRecord], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(records)?;
        println!("{}", json_output);
    } else {
        print_table(records);
    }
    Ok(())
}

fn print_table(records: &[JobRecord]) {
    println!();
    println!(
        "{:<40} {:<25} {:<20} {:<22} {:<12}",
        "TITLE", "COMPANY", "LOCATION", "SALARY", "POSTED"
    );
    println!("{}", "=".repeat(123));

    for record in records {
        println!(
            "{:<40} {:<25} {:<20} {:<22} {:<12}",
            truncate(&record.title, 39),
            truncate(&record.company, 24),
            truncate(&record.location, 19),
            truncate(&record.salary, 21),
            truncate(&record.posted, 12),
        );
        println!("    {}", record.url);
    }

    println!();
}

// Cuts on a char boundary so multi-byte titles don't panic
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_summary(report: &CrawlReport) {
    println!("📊 Summary ({}):", report.site);
    println!("   🧾 API calls used: {}/{}", report.calls_used, report.max_calls);
    println!("   📄 Pages fetched: {}", report.pages_fetched);
    println!("   ✅ Unique jobs: {}", report.records.len());
    if report.skipped_cards > 0 {
        println!("   ⚠️  Cards skipped: {}", report.skipped_cards);
    }
    println!("   🏁 Stopped: {}", describe_outcome(&report.outcome));
}

fn describe_outcome(outcome: &CrawlOutcome) -> String {
    match outcome {
        CrawlOutcome::NoNextPage => "no further pages".to_string(),
        CrawlOutcome::BudgetExhausted => "API call budget exhausted".to_string(),
        CrawlOutcome::AlreadyVisited(url) => format!("next page already visited ({})", url),
        CrawlOutcome::FetchFailed(e) => format!("❌ fetch failed: {}", e),
    }
}

// Handles the 'sites' subcommand
fn print_sites() {
    println!(
        "{:<16} {:<12} {:<8} {:<10} {:<8}",
        "SITE", "PROVIDER", "RENDER", "MAX CALLS", "RETRIES"
    );
    println!("{}", "=".repeat(58));

    for kind in SiteKind::ALL {
        let site = kind.extractor();
        let defaults = site.defaults();
        println!(
            "{:<16} {:<12} {:<8} {:<10} {:<8}",
            site.name(),
            defaults.provider.name(),
            if defaults.options.render { "yes" } else { "no" },
            defaults.max_calls,
            defaults.identity_retries,
        );
    }
}
