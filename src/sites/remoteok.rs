// src/sites/remoteok.rs
// =============================================================================
// RemoteOK listings.
//
// RemoteOK renders its job table client-side, but the rendered page also
// embeds the full listing data as a Next.js payload:
//
//   <script id="__NEXT_DATA__">{"props":{"pageProps":{"jobs":[...]}}}</script>
//
// Reading that JSON is far more stable than chasing table markup, so this is
// the one site that does not use selector fallbacks for its fields.
// =============================================================================

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use super::select::select_all;
use super::{CardError, JobCard, SiteDefaults, SiteExtractor};
use crate::fetch::Page;
use crate::proxy::{FetchOptions, ProxyProvider};

const PAYLOAD: &str = "script#__NEXT_DATA__";

// Tags that describe the kind of contract
const JOB_TYPES: [&str; 4] = ["Full-Time", "Part-Time", "Contract", "Freelance"];

#[derive(Debug, Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    jobs: Vec<Value>,
}

// One entry of the jobs array. Everything is optional: RemoteOK leaves out
// whatever a poster did not fill in.
#[derive(Debug, Default, Deserialize)]
struct RemoteOkJob {
    position: Option<String>,
    company: Option<String>,
    location: Option<String>,
    salary: Option<Value>,
    salary_min: Option<u64>,
    salary_max: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    date: Option<String>,
    epoch: Option<i64>,
    url: Option<String>,
}

impl RemoteOkJob {
    fn salary_text(&self) -> String {
        match &self.salary {
            Some(Value::String(text)) if !text.trim().is_empty() => return text.trim().to_string(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }

        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) if min > 0 && max > 0 => format!("${min} - ${max}"),
            (Some(min), _) if min > 0 => format!("${min}+"),
            _ => String::new(),
        }
    }

    fn into_card(self) -> JobCard {
        let salary = self.salary_text();
        let job_type = self
            .tags
            .iter()
            .find(|tag| JOB_TYPES.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .cloned();
        let posted = self
            .date
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.epoch.map(|e| e.to_string()))
            .unwrap_or_default();

        JobCard {
            title: self.position.unwrap_or_default().trim().to_string(),
            company: self.company.unwrap_or_default().trim().to_string(),
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Remote".to_string()),
            salary,
            posted,
            href: self.url.filter(|u| !u.trim().is_empty()),
            job_type,
        }
    }
}

pub struct RemoteOk;

impl SiteExtractor for RemoteOk {
    fn name(&self) -> &'static str {
        "remoteok"
    }

    // RemoteOK search is a path: "rust developer" -> /remote-rust-developer-jobs
    fn seed_url(&self, query: &str, _location: &str) -> Result<Url, url::ParseError> {
        let slug = query
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join("-");
        let base = Url::parse("https://remoteok.com/")?;
        base.join(&format!("remote-{slug}-jobs"))
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            provider: ProxyProvider::ScraperApi,
            options: FetchOptions {
                render: true,
                ..FetchOptions::default()
            },
            max_calls: 3,
            identity_retries: 0,
            max_cards_per_page: None,
        }
    }

    fn extract_cards(&self, page: &Page) -> Vec<Result<JobCard, CardError>> {
        let document = page.document();

        let Some(script) = select_all(&document, PAYLOAD).into_iter().next() else {
            warn!(url = %page.url, "no __NEXT_DATA__ payload found in page");
            return Vec::new();
        };
        let json: String = script.text().collect();

        let data: NextData = match serde_json::from_str(&json) {
            Ok(data) => data,
            Err(e) => return vec![Err(CardError::Payload(e.to_string()))],
        };

        data.props
            .page_props
            .jobs
            .into_iter()
            .map(|job| {
                serde_json::from_value::<RemoteOkJob>(job)
                    .map(RemoteOkJob::into_card)
                    .map_err(|e| CardError::Payload(e.to_string()))
            })
            .collect()
    }
}
