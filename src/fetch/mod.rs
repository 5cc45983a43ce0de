// src/fetch/mod.rs
// =============================================================================
// This module fetches listing pages.
//
// Submodules:
// - http: reqwest-backed fetcher that goes through a scraping proxy
// - identity: the pool of user agents we rotate through on retries
//
// The crawl loop only talks to the `PageFetcher` trait, so tests can swap in
// a scripted fetcher and never touch the network.
// =============================================================================

mod http;
mod identity;

pub use http::HttpFetcher;
pub use identity::Identity;

use async_trait::async_trait;
use scraper::Html;
use thiserror::Error;
use url::Url;

use crate::proxy::FetchOptions;

// One outbound fetch: which page, with which provider options, as whom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub target: Url,
    pub options: FetchOptions,
    pub identity: Identity,
}

// A fetched listing page
//
// `url` is the listing site's URL, never the proxy URL, so relative links on
// the page resolve against the site.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Why a fetch did not produce a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request timed out (rendering proxies can be slow)
    #[error("request timed out")]
    Timeout,
    /// Could not connect to the provider
    #[error("connection failed: {message}")]
    Connect { message: String },
    /// Provider or site answered 403/429: blocked or out of quota
    #[error("blocked (HTTP {code})")]
    Blocked { code: u16 },
    /// Any other non-success status
    #[error("HTTP {code}")]
    Status { code: u16 },
    /// Response arrived but the body could not be read
    #[error("failed to read response body: {message}")]
    Body { message: String },
    /// Could not build or send the request
    #[error("request failed: {message}")]
    Request { message: String },
}

impl FetchError {
    // Only status-level refusals are worth another attempt with a different
    // identity. Network failures end the branch.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Blocked { .. } => true,
            FetchError::Status { code } => matches!(code, 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Page, FetchError>;
}
