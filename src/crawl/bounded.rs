// src/crawl/bounded.rs
// =============================================================================
// The bounded crawl loop.
//
// How it works:
// 1. Fetch the seed page (one API call, counted against the budget)
// 2. Extract job cards with the site's selectors
// 3. Turn cards into records, dropping any we've already seen
// 4. If the page links to a next page, we still have budget, and we haven't
//    visited that page yet, go back to 1 with the next page
// 5. Otherwise stop and report calls used and unique records
//
// States: Idle -> Fetching -> Extracting -> (Continuing -> Fetching | Done)
//
// Everything the loop mutates lives in a CrawlContext owned by one call of
// `crawl_site`. Nothing survives between runs.
// =============================================================================

use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use super::budget::CrawlBudget;
use super::seen::SeenSet;
use crate::fetch::{FetchError, FetchRequest, Identity, Page, PageFetcher};
use crate::proxy::FetchOptions;
use crate::record::{JobRecord, PostedFilter, NOT_DISCLOSED};
use crate::sites::select::{normalize_whitespace, resolve_url};
use crate::sites::{JobCard, SiteDefaults, SiteExtractor};

// Knobs for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Hard cap on outbound API calls, retries included
    pub max_calls: u32,
    /// Extra attempts with a rotated user agent after a blocked/5xx answer
    pub identity_retries: u32,
    pub options: FetchOptions,
    /// Pause between consecutive fetches
    pub politeness_delay: Duration,
    pub max_cards_per_page: Option<usize>,
    pub posted_filter: PostedFilter,
    /// Salary text for cards that show no pay
    pub not_disclosed: String,
    /// Used for cards without a posted marker and for recency checks
    pub today: NaiveDate,
}

impl CrawlSettings {
    pub fn from_defaults(defaults: &SiteDefaults, today: NaiveDate) -> Self {
        Self {
            max_calls: defaults.max_calls,
            identity_retries: defaults.identity_retries,
            options: defaults.options.clone(),
            politeness_delay: Duration::from_millis(1000),
            max_cards_per_page: defaults.max_cards_per_page,
            posted_filter: PostedFilter::default(),
            not_disclosed: NOT_DISCLOSED.to_string(),
            today,
        }
    }
}

// Why the crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Last page had no next link
    NoNextPage,
    /// All API calls were used
    BudgetExhausted,
    /// Next link pointed at a page we already fetched
    AlreadyVisited(String),
    /// The last fetch failed and was not (or could no longer be) retried
    FetchFailed(FetchError),
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub site: &'static str,
    pub records: Vec<JobRecord>,
    pub calls_used: u32,
    pub max_calls: u32,
    pub pages_fetched: usize,
    pub skipped_cards: usize,
    pub outcome: CrawlOutcome,
}

impl CrawlReport {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::FetchFailed(_))
    }
}

// Per-run mutable state
struct CrawlContext {
    budget: CrawlBudget,
    seen: SeenSet,
    records: Vec<JobRecord>,
    pages_fetched: usize,
    skipped_cards: usize,
}

enum CrawlState {
    Idle(Url),
    Fetching(Url),
    Extracting(Page),
    Continuing(Url),
    Done(CrawlOutcome),
}

// Crawls `site` starting from `seed`
//
// Never returns an error: budget exhaustion and fetch failures are outcomes,
// reported together with whatever records were collected before them.
pub async fn crawl_site(
    site: &dyn SiteExtractor,
    fetcher: &dyn PageFetcher,
    settings: &CrawlSettings,
    seed: Url,
) -> CrawlReport {
    let mut ctx = CrawlContext {
        budget: CrawlBudget::new(settings.max_calls),
        seen: SeenSet::new(),
        records: Vec::new(),
        pages_fetched: 0,
        skipped_cards: 0,
    };

    let mut state = CrawlState::Idle(seed);

    let outcome = loop {
        state = match state {
            CrawlState::Idle(seed) => {
                info!(site = site.name(), max_calls = settings.max_calls, url = %seed, "starting crawl");
                ctx.seen.insert(seed.as_str());
                CrawlState::Fetching(seed)
            }
            CrawlState::Fetching(url) => match fetch_page(&mut ctx, fetcher, settings, &url).await {
                Ok(page) => CrawlState::Extracting(page),
                Err(outcome) => CrawlState::Done(outcome),
            },
            CrawlState::Extracting(page) => {
                ctx.pages_fetched += 1;
                info!(page = ctx.pages_fetched, status = page.status, url = %page.url, "page fetched");
                harvest_page(&mut ctx, site, settings, &page);

                match site.next_page(&page) {
                    None => CrawlState::Done(CrawlOutcome::NoNextPage),
                    Some(_) if !ctx.budget.has_remaining() => {
                        CrawlState::Done(CrawlOutcome::BudgetExhausted)
                    }
                    Some(next) if ctx.seen.contains(next.as_str()) => {
                        info!(url = %next, "next page already visited, stopping");
                        CrawlState::Done(CrawlOutcome::AlreadyVisited(next.to_string()))
                    }
                    Some(next) => {
                        ctx.seen.insert(next.as_str());
                        CrawlState::Continuing(next)
                    }
                }
            }
            CrawlState::Continuing(next) => {
                if !settings.politeness_delay.is_zero() {
                    tokio::time::sleep(settings.politeness_delay).await;
                }
                CrawlState::Fetching(next)
            }
            CrawlState::Done(outcome) => break outcome,
        };
    };

    info!(
        site = site.name(),
        calls = ctx.budget.used(),
        max_calls = ctx.budget.max(),
        unique_jobs = ctx.records.len(),
        seen_urls = ctx.seen.len(),
        outcome = ?outcome,
        "crawl finished"
    );

    CrawlReport {
        site: site.name(),
        records: ctx.records,
        calls_used: ctx.budget.used(),
        max_calls: ctx.budget.max(),
        pages_fetched: ctx.pages_fetched,
        skipped_cards: ctx.skipped_cards,
        outcome,
    }
}

// Fetches one page, charging the budget for every attempt
//
// Blocked and 5xx answers are retried up to `identity_retries` times with a
// different user agent, as long as budget remains. Anything else ends the
// crawl with FetchFailed.
async fn fetch_page(
    ctx: &mut CrawlContext,
    fetcher: &dyn PageFetcher,
    settings: &CrawlSettings,
    url: &Url,
) -> Result<Page, CrawlOutcome> {
    let mut identity = Identity::default();
    let mut retries = 0;

    loop {
        let call = match ctx.budget.charge() {
            Ok(call) => call,
            Err(exceeded) => {
                info!(%exceeded, "stopping crawl");
                return Err(CrawlOutcome::BudgetExhausted);
            }
        };
        info!(call, max_calls = ctx.budget.max(), url = %url, "API call");

        let request = FetchRequest {
            target: url.clone(),
            options: settings.options.clone(),
            identity,
        };

        match fetcher.fetch(&request).await {
            Ok(page) => return Ok(page),
            Err(err)
                if err.is_retryable()
                    && retries < settings.identity_retries
                    && ctx.budget.has_remaining() =>
            {
                retries += 1;
                identity = identity.rotate();
                warn!(
                    error = %err,
                    url = %url,
                    retry = retries,
                    max_retries = settings.identity_retries,
                    "retrying with rotated user agent"
                );
            }
            Err(err) => {
                error!(error = %err, url = %url, "request failed");
                return Err(CrawlOutcome::FetchFailed(err));
            }
        }
    }
}

// Extracts, normalizes, dedupes and filters the records on one page
fn harvest_page(ctx: &mut CrawlContext, site: &dyn SiteExtractor, settings: &CrawlSettings, page: &Page) {
    let cards = site.extract_cards(page);
    if cards.is_empty() {
        warn!(url = %page.url, "no job cards found; markup may have changed or the page was blocked");
        return;
    }

    let limit = settings.max_cards_per_page.unwrap_or(usize::MAX);
    let mut emitted = 0;

    for card in cards.into_iter().take(limit) {
        let card = match card {
            Ok(card) => card,
            Err(e) => {
                debug!(error = %e, "skipping card");
                ctx.skipped_cards += 1;
                continue;
            }
        };

        let Some(mut record) = into_record(card, &page.url, settings) else {
            debug!("skipping card without a usable link");
            ctx.skipped_cards += 1;
            continue;
        };

        if !ctx.seen.insert(&record.url) {
            debug!(url = %record.url, "duplicate job");
            continue;
        }

        if !settings.posted_filter.apply(&mut record, settings.today) {
            debug!(url = %record.url, posted = %record.posted, "outside posted window");
            continue;
        }

        ctx.records.push(record);
        emitted += 1;
    }

    info!(page = ctx.pages_fetched, emitted, total = ctx.records.len(), "jobs yielded from page");
}

// Applies field defaults; None when the card has no resolvable link
fn into_record(card: JobCard, page_url: &Url, settings: &CrawlSettings) -> Option<JobRecord> {
    let url = resolve_url(page_url, card.href.as_deref()?)?;

    let salary = normalize_whitespace(&card.salary);
    let salary = if salary.is_empty() {
        settings.not_disclosed.clone()
    } else {
        salary
    };

    let posted = normalize_whitespace(&card.posted);
    let posted = if posted.is_empty() {
        settings.today.format("%Y-%m-%d").to_string()
    } else {
        posted
    };

    Some(JobRecord {
        title: normalize_whitespace(&card.title),
        company: normalize_whitespace(&card.company),
        location: normalize_whitespace(&card.location),
        salary,
        posted,
        url: url.to_string(),
        job_type: card.job_type,
        fresh: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StalePolicy;
    use crate::sites::select::{first_attr, first_text, select_all};
    use crate::sites::CardError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;

    // Answers fetches from a per-URL script and records every request
    #[derive(Default)]
    struct ScriptedFetcher {
        script: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl ScriptedFetcher {
        fn page(self, url: &str, body: &str) -> Self {
            self.push(url, Ok(body.to_string()))
        }

        fn fail(self, url: &str, err: FetchError) -> Self {
            self.push(url, Err(err))
        }

        fn push(self, url: &str, answer: Result<String, FetchError>) -> Self {
            self.script
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(answer);
            self
        }

        fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<Page, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            let answer = self
                .script
                .lock()
                .unwrap()
                .get_mut(request.target.as_str())
                .and_then(|answers| answers.pop_front());

            match answer {
                Some(Ok(body)) => Ok(Page {
                    url: request.target.clone(),
                    status: 200,
                    body,
                }),
                Some(Err(err)) => Err(err),
                None => Err(FetchError::Status { code: 404 }),
            }
        }
    }

    // Minimal board: <li class="job"> cards and an optional a.next link
    struct TestBoard;

    impl SiteExtractor for TestBoard {
        fn name(&self) -> &'static str {
            "test-board"
        }

        fn seed_url(&self, _query: &str, _location: &str) -> Result<Url, url::ParseError> {
            Url::parse("https://jobs.test/search")
        }

        fn defaults(&self) -> SiteDefaults {
            SiteDefaults {
                provider: crate::proxy::ProxyProvider::Direct,
                options: FetchOptions::default(),
                max_calls: 3,
                identity_retries: 0,
                max_cards_per_page: None,
            }
        }

        fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
            let document = page.document();
            select_all(&document, "li.job")
                .into_iter()
                .map(|card| {
                    if card.value().attr("data-broken").is_some() {
                        return Err(CardError::Payload("broken card".to_string()));
                    }
                    Ok(JobCard {
                        title: first_text(card, &["span.title"]),
                        company: first_text(card, &["span.company"]),
                        salary: first_text(card, &["span.salary"]),
                        posted: first_text(card, &["span.posted"]),
                        href: first_attr(card, &["a"], "href"),
                        ..JobCard::default()
                    })
                })
                .collect()
        }

        fn next_page(&self, page: &Page) -> Option<Url> {
            let document = page.document();
            let href = first_attr(document.root_element(), &["a.next"], "href")?;
            resolve_url(&page.url, &href)
        }
    }

    const SEED: &str = "https://jobs.test/search";
    const PAGE_2: &str = "https://jobs.test/search?page=2";

    fn job(slug: &str) -> String {
        format!(
            r#"<li class="job"><span class="title">{slug}</span><span class="company">Acme</span>
               <span class="salary">$100k</span><span class="posted">2024-05-09</span>
               <a href="/jobs/{slug}">view</a></li>"#
        )
    }

    fn listing(jobs: &[String], next: Option<&str>) -> String {
        let next = next
            .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
            .unwrap_or_default();
        format!("<html><body><ul>{}</ul>{next}</body></html>", jobs.concat())
    }

    fn settings(max_calls: u32) -> CrawlSettings {
        let mut settings = CrawlSettings::from_defaults(
            &TestBoard.defaults(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        );
        settings.max_calls = max_calls;
        settings.politeness_delay = Duration::ZERO;
        settings
    }

    async fn run(fetcher: &ScriptedFetcher, settings: &CrawlSettings) -> CrawlReport {
        crawl_site(&TestBoard, fetcher, settings, Url::parse(SEED).unwrap()).await
    }

    fn urls(report: &CrawlReport) -> Vec<&str> {
        report.records.iter().map(|r| r.url.as_str()).collect()
    }

    #[tokio::test]
    async fn test_two_pages_with_a_duplicate() {
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a"), job("b")], Some("/search?page=2")))
            .page(PAGE_2, &listing(&[job("c"), job("a")], None));

        let report = run(&fetcher, &settings(3)).await;

        assert_eq!(
            urls(&report),
            vec![
                "https://jobs.test/jobs/a",
                "https://jobs.test/jobs/b",
                "https://jobs.test/jobs/c"
            ]
        );
        assert_eq!(report.calls_used, 2);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.outcome, CrawlOutcome::NoNextPage);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_retry() {
        let fetcher = ScriptedFetcher::default().fail(SEED, FetchError::Status { code: 500 });

        let report = run(&fetcher, &settings(3)).await;

        assert!(report.records.is_empty());
        assert_eq!(report.calls_used, 1);
        assert!(report.failed());
        assert_eq!(
            report.outcome,
            CrawlOutcome::FetchFailed(FetchError::Status { code: 500 })
        );
    }

    #[tokio::test]
    async fn test_empty_salary_gets_sentinel() {
        let card = r#"<li class="job"><span class="title">Rust Dev</span>
            <span class="company">Ferrous</span><span class="salary">  </span>
            <a href="/jobs/rust">view</a></li>"#;
        let fetcher = ScriptedFetcher::default().page(SEED, &listing(&[card.to_string()], None));

        let report = run(&fetcher, &settings(3)).await;

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.title, "Rust Dev");
        assert_eq!(record.company, "Ferrous");
        assert_eq!(record.salary, NOT_DISCLOSED);
        // No posted marker: stamped with today's date
        assert_eq!(record.posted, "2024-05-10");
    }

    #[tokio::test]
    async fn test_budget_caps_endless_pagination() {
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a")], Some("/search?page=2")))
            .page(PAGE_2, &listing(&[job("b")], Some("/search?page=3")))
            .page(
                "https://jobs.test/search?page=3",
                &listing(&[job("c")], Some("/search?page=4")),
            );

        let report = run(&fetcher, &settings(2)).await;

        assert_eq!(fetcher.requests().len(), 2);
        assert_eq!(report.calls_used, 2);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.outcome, CrawlOutcome::BudgetExhausted);
    }

    #[tokio::test]
    async fn test_cyclic_pagination_stops() {
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a")], Some("/search?page=2")))
            .page(PAGE_2, &listing(&[job("b")], Some("/search")));

        let report = run(&fetcher, &settings(5)).await;

        assert_eq!(report.calls_used, 2);
        assert_eq!(
            report.outcome,
            CrawlOutcome::AlreadyVisited(SEED.to_string())
        );
    }

    #[tokio::test]
    async fn test_zero_budget_fetches_nothing() {
        let fetcher = ScriptedFetcher::default().page(SEED, &listing(&[job("a")], None));

        let report = run(&fetcher, &settings(0)).await;

        assert!(fetcher.requests().is_empty());
        assert_eq!(report.calls_used, 0);
        assert_eq!(report.outcome, CrawlOutcome::BudgetExhausted);
    }

    #[tokio::test]
    async fn test_cards_without_links_or_broken_are_skipped() {
        let no_link = r#"<li class="job"><span class="title">Ghost</span></li>"#.to_string();
        let broken = r#"<li class="job" data-broken="1"><a href="/jobs/x">x</a></li>"#.to_string();
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a"), no_link, broken, job("b")], None));

        let report = run(&fetcher, &settings(1)).await;

        assert_eq!(
            urls(&report),
            vec!["https://jobs.test/jobs/a", "https://jobs.test/jobs/b"]
        );
        assert_eq!(report.skipped_cards, 2);
    }

    #[tokio::test]
    async fn test_seen_jobs_are_not_emitted_again() {
        // Page 2 repeats M = 2 of its N = 4 cards from page 1
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a"), job("b")], Some("/search?page=2")))
            .page(
                PAGE_2,
                &listing(&[job("a"), job("c"), job("b"), job("d")], None),
            );

        let report = run(&fetcher, &settings(2)).await;

        assert_eq!(report.records.len(), 2 + (4 - 2));
        let unique: HashSet<_> = urls(&report).into_iter().collect();
        assert_eq!(unique.len(), report.records.len());
    }

    #[tokio::test]
    async fn test_blocked_fetch_retries_with_new_identity() {
        let fetcher = ScriptedFetcher::default()
            .fail(SEED, FetchError::Blocked { code: 403 })
            .page(SEED, &listing(&[job("a")], None));
        let mut settings = settings(3);
        settings.identity_retries = 1;

        let report = run(&fetcher, &settings).await;

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(
            requests[0].identity.user_agent(),
            requests[1].identity.user_agent()
        );
        assert_eq!(report.calls_used, 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.outcome, CrawlOutcome::NoNextPage);
    }

    #[tokio::test]
    async fn test_retries_are_metered_by_the_budget() {
        let fetcher = ScriptedFetcher::default()
            .fail(SEED, FetchError::Status { code: 503 })
            .fail(SEED, FetchError::Status { code: 503 })
            .fail(SEED, FetchError::Status { code: 503 });
        let mut settings = settings(2);
        settings.identity_retries = 5;

        let report = run(&fetcher, &settings).await;

        assert_eq!(fetcher.requests().len(), 2);
        assert_eq!(report.calls_used, 2);
        assert!(report.failed());
    }

    #[tokio::test]
    async fn test_timeouts_are_not_retried() {
        let fetcher = ScriptedFetcher::default().fail(SEED, FetchError::Timeout);
        let mut settings = settings(3);
        settings.identity_retries = 2;

        let report = run(&fetcher, &settings).await;

        assert_eq!(report.calls_used, 1);
        assert_eq!(report.outcome, CrawlOutcome::FetchFailed(FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_card_cap_per_page() {
        let fetcher = ScriptedFetcher::default()
            .page(SEED, &listing(&[job("a"), job("b"), job("c")], None));
        let mut settings = settings(1);
        settings.max_cards_per_page = Some(2);

        let report = run(&fetcher, &settings).await;

        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_postings_dropped_when_configured() {
        let old = r#"<li class="job"><span class="posted">30+ days ago</span>
            <a href="/jobs/old">old</a></li>"#
            .to_string();
        let fetcher = ScriptedFetcher::default().page(SEED, &listing(&[job("a"), old], None));
        let mut settings = settings(1);
        settings.posted_filter = PostedFilter::within_hours(48, StalePolicy::Drop);

        let report = run(&fetcher, &settings).await;

        assert_eq!(urls(&report), vec!["https://jobs.test/jobs/a"]);
    }
}
