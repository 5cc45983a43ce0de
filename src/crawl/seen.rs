// src/crawl/seen.rs
// URLs already emitted as records or already queued as pages in this run.
//
// Keys are canonicalised (parsed, fragment dropped) so cosmetic differences
// in how a site writes the same link do not produce duplicates.

use std::collections::HashSet;
use url::Url;

#[derive(Debug, Default)]
pub struct SeenSet {
    urls: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds `url`; false if it was already there
    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(canonical(url))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(&canonical(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

fn canonical(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}
