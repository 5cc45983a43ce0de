// src/sites/select.rs
// =============================================================================
// Selector helpers shared by the site extractors.
//
// Job sites change their markup all the time, so every field is described by
// an ordered list of CSS selectors. We try them in order and keep the first
// one that yields a non-empty value. Nothing found = empty value, never an
// error.
//
// We use the `scraper` crate for CSS selection and `url` to turn the hrefs
// we find into absolute, fragment-free URLs.
// =============================================================================

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::warn;
use url::Url;

// Parses a CSS selector, logging (not panicking) if it is invalid
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(css, error = %e, "invalid selector skipped");
            None
        }
    }
}

// All elements in the document matching `css`, in document order
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

// Text of the first element (under `scope`) with non-empty text, trying
// each selector in turn
pub fn first_text(scope: ElementRef, queries: &[&str]) -> String {
    for query in queries {
        let Some(selector) = selector(query) else {
            continue;
        };
        for element in scope.select(&selector) {
            let text = element_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

// Text of every element the first productive selector matches, joined
// with spaces. Used for fields split across several spans.
pub fn joined_text(scope: ElementRef, queries: &[&str]) -> String {
    for query in queries {
        let Some(selector) = selector(query) else {
            continue;
        };
        let parts: Vec<String> = scope
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }
    String::new()
}

// Non-empty texts of every element matching `css`
pub fn all_texts(scope: ElementRef, css: &str) -> Vec<String> {
    match selector(css) {
        Some(selector) => scope
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

// First non-empty `attr` value, trying each selector in turn
pub fn first_attr(scope: ElementRef, queries: &[&str], attr: &str) -> Option<String> {
    for query in queries {
        let Some(selector) = selector(query) else {
            continue;
        };
        let found = scope
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty());
        if let Some(value) = found {
            return Some(value.to_string());
        }
    }
    None
}

// First text node under `scope` that looks like pay information
//
// Last-resort salary lookup for cards where none of the known salary
// containers are present.
pub fn salary_like_text(scope: ElementRef) -> Option<String> {
    scope
        .text()
        .map(normalize_whitespace)
        .find(|text| salary_pattern().is_match(text))
}

// Collapses runs of whitespace and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Resolves a possibly-relative href against the page URL
//
// Returns None for anchors, non-HTTP schemes and unparseable hrefs. The
// fragment is dropped so "/job/1#apply" and "/job/1" are the same job.
//
// Examples:
//   base = "https://remote.co/remote-jobs/search/"
//   href = "/job/42"            -> Some("https://remote.co/job/42")
//   href = "mailto:a@b.com"     -> None
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn salary_pattern() -> &'static Regex {
    static SALARY: OnceLock<Regex> = OnceLock::new();
    SALARY.get_or_init(|| {
        Regex::new(r"(?i)\$\s?\d|\b(an?|per)\s+(hour|year|month)\b|/\s?(hr|hour|yr|year)\b")
            .expect("salary pattern is valid")
    })
}
