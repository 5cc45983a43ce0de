// src/sites/mod.rs
// =============================================================================
// This module contains the per-site extraction logic.
//
// Submodules:
// - select: ordered selector fallbacks shared by every site
// - indeed, ziprecruiter, remoteok, remote_co, weworkremotely: one extractor
//   per job board
//
// Each site implements `SiteExtractor`: given a fetched page, produce zero or
// more candidate cards and maybe a "next page" URL. The crawl loop does the
// rest (budget, dedup, defaults), so a site never touches crawl state.
// =============================================================================

pub mod select;

mod indeed;
mod remote_co;
mod remoteok;
mod weworkremotely;
mod ziprecruiter;

pub use indeed::Indeed;
pub use remote_co::RemoteCo;
pub use remoteok::RemoteOk;
pub use weworkremotely::WeWorkRemotely;
pub use ziprecruiter::ZipRecruiter;

use clap::ValueEnum;
use thiserror::Error;
use url::Url;

use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider};

// A job card as found on the page, before defaults and dedup
//
// Fields are empty when the site did not show them. `href` is raw: it may be
// relative, and a card without one never becomes a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCard {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub posted: String,
    pub href: Option<String>,
    pub job_type: Option<String>,
}

/// Why a single card was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// Embedded listing data could not be read
    #[error("malformed listing payload: {0}")]
    Payload(String),
    /// Sponsored listing that redirects through an ad tracker
    #[error("sponsored listing skipped: {0}")]
    Sponsored(String),
}

// How a site is crawled unless the user says otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDefaults {
    pub provider: ProxyProvider,
    pub options: FetchOptions,
    pub max_calls: u32,
    pub identity_retries: u32,
    pub max_cards_per_page: Option<usize>,
}

pub trait SiteExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    // First search-results page for a query
    fn seed_url(&self, query: &str, location: &str) -> Result<Url, url::ParseError>;

    fn defaults(&self) -> SiteDefaults;

    // Cards in page order. One bad card is an Err entry, not a failed page.
    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>>;

    // Sites that only expose a single results page keep the default
    fn next_page(&self, _page: &Page) -> Option<Url> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SiteKind {
    Indeed,
    #[value(name = "ziprecruiter")]
    ZipRecruiter,
    #[value(name = "remoteok")]
    RemoteOk,
    #[value(name = "remote-co")]
    RemoteCo,
    #[value(name = "weworkremotely")]
    WeWorkRemotely,
}

impl SiteKind {
    pub const ALL: [SiteKind; 5] = [
        SiteKind::Indeed,
        SiteKind::ZipRecruiter,
        SiteKind::RemoteOk,
        SiteKind::RemoteCo,
        SiteKind::WeWorkRemotely,
    ];

    pub fn extractor(&self) -> Box<dyn SiteExtractor> {
        match self {
            SiteKind::Indeed => Box::new(Indeed),
            SiteKind::ZipRecruiter => Box::new(ZipRecruiter),
            SiteKind::RemoteOk => Box::new(RemoteOk),
            SiteKind::RemoteCo => Box::new(RemoteCo),
            SiteKind::WeWorkRemotely => Box::new(WeWorkRemotely),
        }
    }
}

// Shared by the tests of every site module
#[cfg(test)]
pub(crate) fn fixture_page(url: &str, body: &str) -> Page {
    Page {
        url: Url::parse(url).unwrap(),
        status: 200,
        body: body.to_string(),
    }
}
