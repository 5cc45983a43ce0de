// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl one job site through a scraping proxy
// - sites: list the supported sites and how they are crawled by default
//
// Every crawl flag is optional: a site's own defaults (provider, rendering,
// call budget, retries) apply unless overridden here.
// =============================================================================

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::crawl::CrawlSettings;
use crate::proxy::{ProxyProvider, RenderWait};
use crate::record::{PostedFilter, StalePolicy, NOT_DISCLOSED};
use crate::sites::{SiteDefaults, SiteKind};

#[derive(Parser, Debug)]
#[command(
    name = "job-harvest",
    version = "0.1.0",
    about = "Crawl job-listing sites through scraping proxy APIs under a fixed call budget",
    long_about = "job-harvest fetches search results from Indeed, ZipRecruiter, RemoteOK, Remote.co \
                  and WeWorkRemotely through ScraperAPI, ScrapingBee or ZenRows. Each run spends at \
                  most --max-calls API calls and never emits the same job twice."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one site and print the jobs found
    ///
    /// Example: job-harvest crawl remote-co --query "salesforce developer" --max-calls 3
    Crawl(CrawlArgs),

    /// List supported sites and their default crawl settings
    Sites,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Site to crawl
    #[arg(value_enum)]
    pub site: SiteKind,

    /// Search keywords
    #[arg(long, default_value = "Python Developer")]
    pub query: String,

    /// Search location (ignored by remote-only boards)
    #[arg(long, default_value = "New York, NY")]
    pub location: String,

    /// Maximum number of API calls for this run, retries included
    #[arg(long, env = "JOB_HARVEST_MAX_CALLS")]
    pub max_calls: Option<u32>,

    /// Retries with a rotated user agent after a blocked or 5xx answer
    #[arg(long)]
    pub retries: Option<u32>,

    /// Proxy provider to route requests through
    #[arg(long, value_enum)]
    pub provider: Option<ProxyProvider>,

    /// Ask the provider to execute JavaScript before returning the page
    #[arg(long, conflicts_with = "no_render")]
    pub render: bool,

    /// Fetch raw HTML without JavaScript rendering
    #[arg(long)]
    pub no_render: bool,

    /// Geo hint for the provider (e.g. "us")
    #[arg(long)]
    pub country: Option<String>,

    /// Do not let the provider answer from its cache
    #[arg(long)]
    pub no_cache: bool,

    /// Provider-side retry count
    #[arg(long)]
    pub provider_retries: Option<u32>,

    /// Let a rendered page settle this many milliseconds before capture
    #[arg(long)]
    pub wait_ms: Option<u32>,

    /// Milliseconds to wait between page fetches
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request timeout in seconds (rendering is slow)
    #[arg(long, default_value_t = 70)]
    pub timeout_secs: u64,

    /// Mark (or with --drop-stale, remove) jobs posted longer ago than this
    #[arg(long)]
    pub posted_within_hours: Option<u32>,

    /// Drop jobs outside --posted-within-hours instead of annotating them
    #[arg(long, requires = "posted_within_hours")]
    pub drop_stale: bool,

    /// Salary text for listings that show no pay
    #[arg(long, default_value = NOT_DISCLOSED)]
    pub not_disclosed: String,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    pub fn provider(&self, defaults: &SiteDefaults) -> ProxyProvider {
        self.provider.unwrap_or(defaults.provider)
    }

    // Site defaults with every flag the user passed layered on top
    pub fn settings(&self, defaults: &SiteDefaults, today: NaiveDate) -> CrawlSettings {
        let mut settings = CrawlSettings::from_defaults(defaults, today);

        if let Some(max_calls) = self.max_calls {
            settings.max_calls = max_calls;
        }
        if let Some(retries) = self.retries {
            settings.identity_retries = retries;
        }
        if self.render {
            settings.options.render = true;
        }
        if self.no_render {
            settings.options.render = false;
        }
        if let Some(country) = &self.country {
            settings.options.country = Some(country.clone());
        }
        if self.no_cache {
            settings.options.cache = false;
        }
        if let Some(retries) = self.provider_retries {
            settings.options.num_retries = Some(retries);
        }
        if let Some(ms) = self.wait_ms {
            settings.options.wait = Some(RenderWait::Millis(ms));
        }
        if let Some(hours) = self.posted_within_hours {
            let policy = if self.drop_stale {
                StalePolicy::Drop
            } else {
                StalePolicy::Annotate
            };
            settings.posted_filter = PostedFilter::within_hours(hours, policy);
        }

        settings.politeness_delay = Duration::from_millis(self.delay_ms);
        settings.not_disclosed = self.not_disclosed.clone();
        settings
    }
}
