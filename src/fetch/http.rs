// src/fetch/http.rs
// =============================================================================
// Fetches listing pages over HTTP through a scraping proxy.
//
// Key functionality:
// - Rewrites the target URL into the provider's API URL
// - Sends our rotating user agent plus browser-like headers
// - Sorts failures into FetchError variants (timeout, blocked, status, ...)
//
// One fetch here is one metered API call; the crawl loop does the counting.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{FetchError, FetchRequest, Page, PageFetcher};
use crate::proxy::ProxyProvider;

pub struct HttpFetcher {
    client: Client,
    provider: ProxyProvider,
    api_key: String,
}

impl HttpFetcher {
    // Creates a fetcher for one provider
    //
    // The timeout is generous on purpose: rendering providers run the page's
    // JavaScript before answering.
    pub fn new(provider: ProxyProvider, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            provider,
            api_key,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Page, FetchError> {
        let proxied = self
            .provider
            .proxy_url(&self.api_key, &request.target, &request.options, &request.identity)
            .map_err(|e| FetchError::Request {
                message: e.to_string(),
            })?;

        debug!(provider = self.provider.name(), target = %request.target, "sending request");

        let response = self
            .client
            .get(proxied)
            .header(header::USER_AGENT, request.identity.user_agent())
            .send()
            .await
            .map_err(categorize_error)?;

        analyze_response(request.target.clone(), response).await
    }
}

// Turns a provider response into a Page, or a FetchError for non-2xx
//
// 403 and 429 are how the providers (and the sites behind them) say
// "blocked" or "out of credits", so they get their own variant.
async fn analyze_response(target: Url, response: reqwest::Response) -> Result<Page, FetchError> {
    let status = response.status();

    if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
        return Err(FetchError::Blocked {
            code: status.as_u16(),
        });
    }

    if !status.is_success() {
        return Err(FetchError::Status {
            code: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| FetchError::Body {
        message: e.to_string(),
    })?;

    Ok(Page {
        url: target,
        status: status.as_u16(),
        body,
    })
}

// Categorizes transport errors from reqwest
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect {
            message: error.to_string(),
        }
    } else {
        FetchError::Request {
            message: error.to_string(),
        }
    }
}
