// src/proxy.rs
// =============================================================================
// Builds the request URL for each scraping proxy provider.
//
// The providers are treated as opaque URL rewriters: we put the target page
// and our options into query parameters and the provider fetches the page
// for us (optionally running its JavaScript first).
//
// Supported:
// - ScraperAPI   https://api.scraperapi.com/
// - ScrapingBee  https://app.scrapingbee.com/api/v1/
// - ZenRows      https://api.zenrows.com/v1/
// - Direct       no proxy, the target URL is fetched as-is
// =============================================================================

use clap::ValueEnum;
use url::Url;

use crate::fetch::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProxyProvider {
    #[value(name = "scraperapi")]
    ScraperApi,
    #[value(name = "scrapingbee")]
    ScrapingBee,
    #[value(name = "zenrows")]
    ZenRows,
    Direct,
}

// How long a rendering provider lets the page settle before snapshotting it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWait {
    /// Until the network has gone quiet
    NetworkIdle,
    /// A fixed pause in milliseconds
    Millis(u32),
}

// Per-fetch knobs the providers understand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Run client-side JavaScript before returning the HTML
    pub render: bool,
    /// Geo hint, e.g. "us"
    pub country: Option<String>,
    /// Allow the provider to serve a cached copy
    pub cache: bool,
    /// Provider-side retry count
    pub num_retries: Option<u32>,
    /// Residential / premium proxy pool
    pub premium: bool,
    /// Settle time after rendering; ignored unless `render` is on
    pub wait: Option<RenderWait>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            render: false,
            country: Some("us".to_string()),
            cache: true,
            num_retries: Some(1),
            premium: false,
            wait: None,
        }
    }
}

impl ProxyProvider {
    pub fn name(&self) -> &'static str {
        match self {
            ProxyProvider::ScraperApi => "scraperapi",
            ProxyProvider::ScrapingBee => "scrapingbee",
            ProxyProvider::ZenRows => "zenrows",
            ProxyProvider::Direct => "direct",
        }
    }

    // Environment variable holding this provider's API key
    pub fn key_env_var(&self) -> Option<&'static str> {
        match self {
            ProxyProvider::ScraperApi => Some("SCRAPER_API_KEY"),
            ProxyProvider::ScrapingBee => Some("SCRAPINGBEE_API_KEY"),
            ProxyProvider::ZenRows => Some("ZENROWS_API_KEY"),
            ProxyProvider::Direct => None,
        }
    }

    // Rewrites `target` into the URL we actually request
    //
    // The user agent itself travels as a request header; here we only tell
    // the provider to forward it (and, for ScraperAPI, which device to mimic).
    pub fn proxy_url(
        &self,
        api_key: &str,
        target: &Url,
        options: &FetchOptions,
        identity: &Identity,
    ) -> Result<Url, url::ParseError> {
        let flag = |on: bool| String::from(if on { "true" } else { "false" });

        let mut params: Vec<(&str, String)> = Vec::new();

        let endpoint = match self {
            ProxyProvider::Direct => return Ok(target.clone()),
            ProxyProvider::ScraperApi => {
                params.push(("api_key", api_key.to_string()));
                params.push(("url", target.to_string()));
                params.push(("render", flag(options.render)));
                if let Some(country) = &options.country {
                    params.push(("country_code", country.clone()));
                }
                params.push(("premium", flag(options.premium)));
                if let Some(retries) = options.num_retries {
                    params.push(("num_retries", retries.to_string()));
                }
                params.push(("cache", flag(options.cache)));
                params.push(("keep_headers", flag(true)));
                let device = if identity.is_mobile() { "mobile" } else { "desktop" };
                params.push(("device_type", device.to_string()));
                "https://api.scraperapi.com/"
            }
            ProxyProvider::ScrapingBee => {
                params.push(("api_key", api_key.to_string()));
                params.push(("url", target.to_string()));
                params.push(("render_js", flag(options.render)));
                if options.render {
                    match options.wait {
                        Some(RenderWait::Millis(ms)) => params.push(("wait", ms.to_string())),
                        Some(RenderWait::NetworkIdle) => {
                            params.push(("wait_browser", "networkidle2".to_string()))
                        }
                        None => {}
                    }
                }
                if options.premium {
                    params.push(("premium_proxy", flag(true)));
                }
                if let Some(country) = &options.country {
                    params.push(("country_code", country.clone()));
                }
                params.push(("forward_headers", flag(true)));
                "https://app.scrapingbee.com/api/v1/"
            }
            ProxyProvider::ZenRows => {
                params.push(("apikey", api_key.to_string()));
                params.push(("url", target.to_string()));
                if options.render {
                    params.push(("js_render", flag(true)));
                    match options.wait {
                        Some(RenderWait::Millis(ms)) => params.push(("wait", ms.to_string())),
                        Some(RenderWait::NetworkIdle) => {
                            params.push(("wait_until", "networkidle".to_string()))
                        }
                        None => {}
                    }
                }
                if options.premium {
                    params.push(("premium_proxy", flag(true)));
                    params.push(("antibot", flag(true)));
                    // ZenRows only honours a country on the premium pool
                    if let Some(country) = &options.country {
                        params.push(("proxy_country", country.clone()));
                    }
                }
                params.push(("custom_headers", flag(true)));
                "https://api.zenrows.com/v1/"
            }
        };

        Url::parse_with_params(endpoint, &params)
    }
}
