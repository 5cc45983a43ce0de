// src/sites/indeed.rs
// Indeed search results. Needs JS rendering and the premium pool, so the
// default provider is ZenRows.

use url::Url;

use super::select::{
    first_attr, first_text, joined_text, resolve_url, salary_like_text, select_all,
};
use super::{CardError, JobCard, SiteDefaults, SiteExtractor};
use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider, RenderWait};

const CARDS: &str = "div.job_seen_beacon, a.tapItem";

const TITLE: &[&str] = &["h2.jobTitle span", "h2 span"];
const COMPANY: &[&str] = &["span.companyName", "span[data-testid='company-name']"];
const LOCATION: &[&str] = &["div.companyLocation", "div[data-testid='text-location']"];
const SALARY: &[&str] = &[
    "div#salaryInfoAndJobType span",
    "div[data-testid='attribute_snippet_text']",
    "div[data-testid='jobsearch-OtherJobDetailsContainer'] span",
    "div[data-testid='salary-snippet-container'] span",
    "span[data-testid='attribute_snippet_text']",
];
const POSTED: &[&str] = &["span[data-testid='myJobsStateDate']", "span.date"];
const LINK: &[&str] = &["h2.jobTitle a", "a.jcs-JobTitle", "a"];
const NEXT: &[&str] = &["a[data-testid='pagination-page-next']", "a[aria-label='Next Page']"];

// Sponsored cards link through this click tracker instead of the job
const AD_PREFIX: &str = "/pagead/clk";

pub struct Indeed;

impl SiteExtractor for Indeed {
    fn name(&self) -> &'static str {
        "indeed"
    }

    fn seed_url(&self, query: &str, location: &str) -> Result<Url, url::ParseError> {
        // fromage=1: posted in the last day
        Url::parse_with_params(
            "https://www.indeed.com/jobs",
            &[("q", query), ("l", location), ("fromage", "1")],
        )
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            provider: ProxyProvider::ZenRows,
            options: FetchOptions {
                render: true,
                premium: true,
                wait: Some(RenderWait::NetworkIdle),
                ..FetchOptions::default()
            },
            max_calls: 5,
            identity_retries: 0,
            max_cards_per_page: None,
        }
    }

    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
        let document = page.document();

        select_all(&document, CARDS)
            .into_iter()
            .map(|card| {
                // `a.tapItem` cards are themselves the link
                let href = card
                    .value()
                    .attr("href")
                    .map(str::to_string)
                    .or_else(|| first_attr(card, LINK, "href"));

                if let Some(href) = href.as_deref() {
                    if href.starts_with(AD_PREFIX) {
                        return Err(CardError::Sponsored(href.to_string()));
                    }
                }

                let mut title = first_text(card, TITLE);
                if title.is_empty() {
                    title = first_attr(card, &["a[aria-label]"], "aria-label").unwrap_or_default();
                }

                let mut salary = joined_text(card, SALARY);
                if salary.is_empty() {
                    salary = salary_like_text(card).unwrap_or_default();
                }

                Ok(JobCard {
                    title,
                    company: first_text(card, COMPANY),
                    location: joined_text(card, LOCATION),
                    salary,
                    posted: first_text(card, POSTED),
                    href,
                    job_type: None,
                })
            })
            .collect()
    }

    fn next_page(&self, page: &Page) -> Option<Url> {
        let document = page.document();
        let root = document.root_element();
        let href = first_attr(root, NEXT, "href")?;
        resolve_url(&page.url, &href)
    }
}
