// src/record.rs
// =============================================================================
// The job record we emit, plus the "how old is this posting?" logic.
//
// Every site hands us a posted marker in its own shape:
// - ISO dates ("2024-05-01" or "2024-05-01T12:00:00+00:00")
// - Unix epochs (RemoteOK)
// - Relative text ("Just posted", "Active 3 days ago", "30+ days ago", "5h")
//
// The posted filter turns those into an age and either annotates the record
// with `fresh` or drops postings older than the configured window.
// =============================================================================

use chrono::{DateTime, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Salary text used when a listing does not show any pay information
pub const NOT_DISCLOSED: &str = "Not disclosed";

/// One normalized job listing
///
/// `url` is the identity of the record: it is absolute, has no fragment and
/// is unique within one crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub posted: String,
    pub url: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    /// Set by the posted filter when it runs in annotate mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
}

// What to do with postings that fall outside the recency window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    #[default]
    Annotate,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostedFilter {
    pub window: Option<Duration>,
    pub policy: StalePolicy,
}

impl PostedFilter {
    pub fn within_hours(hours: u32, policy: StalePolicy) -> Self {
        Self {
            window: Some(Duration::hours(i64::from(hours))),
            policy,
        }
    }

    // Returns false when the record should not be emitted.
    //
    // Records whose age cannot be worked out are always kept: a missing or
    // unreadable marker is not evidence that the posting is old.
    pub fn apply(&self, record: &mut JobRecord, today: NaiveDate) -> bool {
        let Some(window) = self.window else {
            return true;
        };

        let Some(age) = posted_age(&record.posted, today) else {
            return true;
        };

        let fresh = age <= window;
        match self.policy {
            StalePolicy::Annotate => {
                record.fresh = Some(fresh);
                true
            }
            StalePolicy::Drop => fresh,
        }
    }
}

// Works out how long ago a listing was posted, relative to `today`.
//
// Returns None for markers we do not recognise.
pub fn posted_age(posted: &str, today: NaiveDate) -> Option<Duration> {
    let marker = posted.trim().to_lowercase();
    if marker.is_empty() {
        return None;
    }

    if matches!(marker.as_str(), "just posted" | "today" | "new" | "posted today") {
        return Some(Duration::zero());
    }
    if marker == "yesterday" {
        return Some(Duration::days(1));
    }

    // Unix epoch seconds (RemoteOK's `epoch` field)
    if marker.len() >= 9 && marker.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = marker.parse().ok()?;
        let date = DateTime::from_timestamp(secs, 0)?.date_naive();
        return Some(days_between(date, today));
    }

    // ISO date, possibly with a time part after it
    if let Some(prefix) = marker.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(days_between(date, today));
        }
    }

    let caps = relative_marker().captures(&marker)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = &caps[2];

    // Out-of-range amounts count as an unknown age
    if unit.starts_with("mi") {
        Duration::try_minutes(amount)
    } else if unit.starts_with('h') {
        Duration::try_hours(amount)
    } else if unit.starts_with('d') {
        Duration::try_days(amount)
    } else if unit.starts_with('w') {
        Duration::try_weeks(amount)
    } else {
        // "mo" / "month(s)"
        Duration::try_days(amount.checked_mul(30)?)
    }
}

fn days_between(date: NaiveDate, today: NaiveDate) -> Duration {
    let age = today.signed_duration_since(date);
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

fn relative_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(\d+)\+?\s*(minutes?|mins?|hours?|hrs?|h|days?|d|weeks?|wks?|w|months?|mo)\b")
            .expect("relative marker pattern is valid")
    })
}
