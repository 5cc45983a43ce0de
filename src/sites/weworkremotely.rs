// src/sites/weworkremotely.rs
// WeWorkRemotely search, sorted to the last 24 hours. Static HTML, paginated
// with rel="next". Pay shows up (if at all) as one of the category chips.

use url::Url;

use super::select::{all_texts, first_attr, first_text, resolve_url, select_all};
use super::{CardError, JobCard, SiteDefaults, SiteExtractor};
use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider};

// Featured ad slots share the listing class, hence the :not()
const CARDS: &str = "li.new-listing-container:not(.feature--ad)";
const LINK: &[&str] = &["a[href^='/remote-jobs/']"];
const TITLE: &[&str] = &["h3.new-listing__header__title", "span.title"];
const COMPANY: &[&str] = &["p.new-listing__company-name", "span.company"];
const LOCATION: &[&str] = &["p.new-listing__company-headquarters", "span.region"];
const POSTED: &[&str] = &["p.new-listing__header__icons__date", "time"];
const CATEGORIES: &str = "div.new-listing__categories p";
const NEXT: &[&str] = &["a[rel='next']"];

pub struct WeWorkRemotely;

impl SiteExtractor for WeWorkRemotely {
    fn name(&self) -> &'static str {
        "weworkremotely"
    }

    fn seed_url(&self, query: &str, _location: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            "https://weworkremotely.com/remote-jobs/search",
            &[("term", query), ("sort", "Past 24 Hours")],
        )
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            provider: ProxyProvider::ScraperApi,
            options: FetchOptions::default(),
            max_calls: 5,
            identity_retries: 0,
            max_cards_per_page: Some(30),
        }
    }

    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
        let document = page.document();

        select_all(&document, CARDS)
            .into_iter()
            .map(|card| {
                let salary = all_texts(card, CATEGORIES)
                    .into_iter()
                    .find(|chip| chip.contains('$'))
                    .unwrap_or_default();

                Ok(JobCard {
                    title: first_text(card, TITLE),
                    company: first_text(card, COMPANY),
                    location: first_text(card, LOCATION),
                    salary,
                    posted: first_text(card, POSTED),
                    href: first_attr(card, LINK, "href"),
                    job_type: None,
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
        <html><body><ul>
        <li class="new-listing-container">
            <a href="/remote-jobs/basecamp-senior-rails-programmer">
                <h3 class="new-listing__header__title">Senior Rails Programmer</h3>
                <p class="new-listing__header__icons__date">2d</p>
                <p class="new-listing__company-name">Basecamp</p>
                <p class="new-listing__company-headquarters">Chicago, IL</p>
                <div class="new-listing__categories">
                    <p>Full-Time</p><p>$100,000 or more USD</p>
                </div>
            </a>
        </li>
        <li class="new-listing-container feature--ad">
            <a href="/remote-jobs/ad-slot"><h3 class="new-listing__header__title">Ad</h3></a>
        </li>
        <li class="new-listing-container">
            <a href="/remote-jobs/gumroad-rails-dev">
                <h3 class="new-listing__header__title">Rails Dev</h3>
                <div class="new-listing__categories"><p>Contract</p></div>
            </a>
        </li>
        </ul>
        <a rel="next" href="/remote-jobs/search?page=2&amp;term=rails">Next</a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_cards_without_ads() {
        let page = fixture_page("https://weworkremotely.com/remote-jobs/search?term=rails", RESULTS);
        let cards: Vec<JobCard> = WeWorkRemotely
            .extract_cards(&page)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].title, "Senior Rails Programmer");
        assert_eq!(cards[0].company, "Basecamp");
        assert_eq!(cards[0].location, "Chicago, IL");
        assert_eq!(cards[0].posted, "2d");
        assert_eq!(cards[0].salary, "$100,000 or more USD");
        assert_eq!(
            cards[0].href.as_deref(),
            Some("/remote-jobs/basecamp-senior-rails-programmer")
        );

        assert_eq!(cards[1].title, "Rails Dev");
        assert_eq!(cards[1].salary, "");
    }

    #[test]
    fn test_next_page() {
        let page = fixture_page("https://weworkremotely.com/remote-jobs/search?term=rails", RESULTS);
        assert_eq!(
            WeWorkRemotely.next_page(&page).unwrap().as_str(),
            "https://weworkremotely.com/remote-jobs/search?page=2&term=rails"
        );
    }
}
