// src/sites/remote_co.rs
// Remote.co search. Mostly static HTML, so no rendering is needed and the
// crawl can afford to follow its pagination.

use url::Url;

use super::select::{first_attr, first_text, resolve_url, select_all};
use super::{CardError, JobCard, SiteDefaults, SiteExtractor};
use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider};

const CARDS: &str = "div.card";
const LINK: &[&str] = &["a.card__job-link"];
const TITLE: &[&str] = &["span.card__job-title"];
const COMPANY: &[&str] = &["span.card__company"];
const LOCATION: &[&str] = &["span.card__location"];
const JOB_TYPE: &[&str] = &["span.card__job-type"];
const NEXT: &[&str] = &["a.next.page-numbers"];

// Cards without a job-type badge
const TYPE_NOT_SPECIFIED: &str = "Not specified";

pub struct RemoteCo;

impl SiteExtractor for RemoteCo {
    fn name(&self) -> &'static str {
        "remote-co"
    }

    fn seed_url(&self, query: &str, _location: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            "https://remote.co/remote-jobs/search/",
            &[("search_keywords", query)],
        )
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            provider: ProxyProvider::ScraperApi,
            options: FetchOptions::default(),
            max_calls: 3,
            identity_retries: 0,
            max_cards_per_page: Some(30),
        }
    }

    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
        let document = page.document();

        select_all(&document, CARDS)
            .into_iter()
            .map(|card| {
                let mut job_type = first_text(card, JOB_TYPE);
                if job_type.is_empty() {
                    job_type = TYPE_NOT_SPECIFIED.to_string();
                }

                // Remote.co does not publish pay on its cards
                Ok(JobCard {
                    title: first_text(card, TITLE),
                    company: first_text(card, COMPANY),
                    location: first_text(card, LOCATION),
                    salary: String::new(),
                    posted: first_attr(card, &["time"], "datetime").unwrap_or_default(),
                    href: first_attr(card, LINK, "href"),
                    job_type: Some(job_type),
                })
            })
            .collect()
    }

    fn next_page(&self, page: &Page) -> Option<Url> {
        let document = page.document();
        let href = first_attr(document.root_element(), NEXT, "href")?;
        resolve_url(&page.url, &href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::fixture_page;

    const RESULTS: &str = r#"
        <html><body>
        <div class="card">
            <a class="card__job-link" href="/job-details/salesforce-developer-abc">
                <span class="card__job-title">Salesforce Developer</span>
            </a>
            <span class="card__company">Cloudy Co</span>
            <span class="card__location">US only</span>
            <span class="card__job-type">Full-time</span>
            <time datetime="2024-05-09">1 day ago</time>
        </div>
        <div class="card">
            <span class="card__job-title">Featured banner</span>
        </div>
        <a class="next page-numbers" href="/remote-jobs/search/page/2/?search_keywords=salesforce">Next</a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_cards() {
        let page = fixture_page(
            "https://remote.co/remote-jobs/search/?search_keywords=salesforce",
            RESULTS,
        );
        let cards = RemoteCo.extract_cards(&page);
        assert_eq!(cards.len(), 2);

        let first = cards[0].as_ref().unwrap();
        assert_eq!(first.title, "Salesforce Developer");
        assert_eq!(first.company, "Cloudy Co");
        assert_eq!(first.location, "US only");
        assert_eq!(first.posted, "2024-05-09");
        assert_eq!(first.job_type.as_deref(), Some("Full-time"));
        assert_eq!(first.href.as_deref(), Some("/job-details/salesforce-developer-abc"));
        assert!(first.salary.is_empty());

        let banner = cards[1].as_ref().unwrap();
        assert_eq!(banner.href, None);
        assert_eq!(banner.job_type.as_deref(), Some(TYPE_NOT_SPECIFIED));
    }

    #[test]
    fn test_next_page() {
        let page = fixture_page("https://remote.co/remote-jobs/search/", RESULTS);
        assert_eq!(
            RemoteCo.next_page(&page).unwrap().as_str(),
            "https://remote.co/remote-jobs/search/page/2/?search_keywords=salesforce"
        );
    }

    #[test]
    fn test_seed_url_encodes_query() {
        let seed = RemoteCo.seed_url("salesforce developer", "").unwrap();
        assert_eq!(
            seed.as_str(),
            "https://remote.co/remote-jobs/search/?search_keywords=salesforce+developer"
        );
    }
}
