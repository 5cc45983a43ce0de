// src/config.rs
// =============================================================================
// Provider API keys, read from the environment.
//
// A `.env` file in the working directory is loaded first (handy during
// development). A missing key is not an error here: we fall back to a
// placeholder and let the provider reject it, so a dry `sites` listing or a
// `--provider direct` crawl works without any keys configured.
// =============================================================================

use dotenvy::dotenv;
use std::env;
use tracing::warn;

use crate::proxy::ProxyProvider;

pub const PLACEHOLDER_API_KEY: &str = "your_fallback_api_key";

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub scraper_api: Option<String>,
    pub scrapingbee: Option<String>,
    pub zenrows: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let _ = dotenv();

        Self {
            scraper_api: read_key(ProxyProvider::ScraperApi),
            scrapingbee: read_key(ProxyProvider::ScrapingBee),
            zenrows: read_key(ProxyProvider::ZenRows),
        }
    }

    // Key for `provider`, or the placeholder if none is configured
    pub fn key_for(&self, provider: ProxyProvider) -> String {
        let key = match provider {
            ProxyProvider::ScraperApi => &self.scraper_api,
            ProxyProvider::ScrapingBee => &self.scrapingbee,
            ProxyProvider::ZenRows => &self.zenrows,
            ProxyProvider::Direct => return String::new(),
        };

        match key {
            Some(key) => key.clone(),
            None => {
                warn!(
                    provider = provider.name(),
                    env = provider.key_env_var().unwrap_or_default(),
                    "API key not set, using placeholder; the provider will reject requests"
                );
                PLACEHOLDER_API_KEY.to_string()
            }
        }
    }
}

fn read_key(provider: ProxyProvider) -> Option<String> {
    let var = provider.key_env_var()?;
    env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_key_is_used() {
        let keys = ApiKeys {
            zenrows: Some("zen-123".to_string()),
            ..ApiKeys::default()
        };
        assert_eq!(keys.key_for(ProxyProvider::ZenRows), "zen-123");
    }

    #[test]
    fn test_missing_key_falls_back_to_placeholder() {
        let keys = ApiKeys::default();
        assert_eq!(keys.key_for(ProxyProvider::ScraperApi), PLACEHOLDER_API_KEY);
    }

    #[test]
    fn test_direct_needs_no_key() {
        assert_eq!(ApiKeys::default().key_for(ProxyProvider::Direct), "");
    }
}
