// src/sites/ziprecruiter.rs
// ZipRecruiter candidate search. The results sit behind a bot wall, so we
// render through ScraperAPI and allow a few identity-rotating retries.
// Only the first results page is crawled.

use url::Url;

use super::select::{first_attr, first_text, joined_text, salary_like_text, select_all};
use super::{CardError, JobCard, SiteDefaults, SiteExtractor};
use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider};

const CARDS: &str =
    "article.job_result, div.job_result, div.job_content, div[data-testid='job_card']";

const TITLE: &[&str] = &["a.job_link", "a[data-testid='job_link']", "h2", "a"];
const COMPANY: &[&str] = &[
    "a.t_org_link",
    "div.job_org",
    "[data-testid='job-card-company-name']",
    "span.company_name",
];
const LOCATION: &[&str] = &[
    "span.job_location",
    "div.job_location",
    "[data-testid='job-card-location']",
];
const SALARY: &[&str] = &[
    "span.job_salary",
    "div.job_salary",
    "[data-testid='job-card-salary']",
];
const LINK: &[&str] = &["a.job_link", "a[data-testid='job_link']", "a"];

pub struct ZipRecruiter;

impl SiteExtractor for ZipRecruiter {
    fn name(&self) -> &'static str {
        "ziprecruiter"
    }

    fn seed_url(&self, query: &str, location: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            "https://www.ziprecruiter.com/candidate/search",
            &[("search", query), ("location", location)],
        )
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            provider: ProxyProvider::ScraperApi,
            options: FetchOptions {
                render: true,
                cache: false,
                num_retries: None,
                ..FetchOptions::default()
            },
            max_calls: 5,
            identity_retries: 3,
            max_cards_per_page: None,
        }
    }

    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
        let document = page.document();

        select_all(&document, CARDS)
            .into_iter()
            .map(|card| {
                let mut salary = joined_text(card, SALARY);
                if salary.is_empty() {
                    salary = salary_like_text(card).unwrap_or_default();
                }

                // No posted marker on the cards; the crawl stamps today's date
                Ok(JobCard {
                    title: first_text(card, TITLE),
                    company: first_text(card, COMPANY),
                    location: joined_text(card, LOCATION),
                    salary,
                    posted: String::new(),
                    href: first_attr(card, LINK, "href"),
                    job_type: None,
                })
            })
            .collect()
    }
}
