// src/crawl/mod.rs
// =============================================================================
// This module drives a crawl of one job site.
//
// Features:
// - Hard cap on outbound API calls (every proxy call costs quota)
// - Job URL deduplication within a run
// - Follows "next page" links while budget remains, never revisiting a page
// - Bounded user-agent rotation on blocked/5xx answers, still metered
// - Polite delay between fetches
//
// Rust concepts:
// - Enums as state machines: CrawlState
// - Trait objects: the loop works with any SiteExtractor and PageFetcher
// =============================================================================

mod bounded;
mod budget;
mod seen;

pub use bounded::{crawl_site, CrawlOutcome, CrawlReport, CrawlSettings};
