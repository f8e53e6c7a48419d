//! Core data types for expiration lookups.
//!
//! This module defines the report emitted for a domain, the tagged values
//! lookup strategies hand back, and the lookup configuration.

use crate::error::ExpiryCheckError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::time::Duration;

/// Default `User-Agent` sent to the lookup website.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default base URL of the WHOIS lookup website. The domain is appended as a path segment.
pub const DEFAULT_WEB_URL: &str = "https://www.whois.com/whois";

/// Result of a successful expiration lookup.
///
/// Field order matches the JSON printed by the CLI.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExpiryReport {
    /// The domain name that was looked up (e.g., "example.com")
    pub domain: String,

    /// Expiration date, serialized as `YYYY-MM-DD`
    pub expiration_date: NaiveDate,

    /// Whole days from today until expiration; negative once expired
    pub days_left: i64,

    /// Which strategy produced the date
    pub source: LookupSource,
}

impl ExpiryReport {
    /// Build a report, deriving `days_left` from `today`.
    pub fn new<D: Into<String>>(
        domain: D,
        expiration_date: NaiveDate,
        source: LookupSource,
        today: NaiveDate,
    ) -> Self {
        Self {
            domain: domain.into(),
            expiration_date,
            days_left: crate::normalize::days_until(expiration_date, today),
            source,
        }
    }

    /// True once the expiration date is in the past.
    pub fn is_expired(&self) -> bool {
        self.days_left < 0
    }
}

/// Error object printed on stderr when a lookup fails.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorReport {
    pub error: String,

    /// The unparsed value, present only for date format errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl ErrorReport {
    pub fn new<M: Into<String>>(error: M) -> Self {
        Self {
            error: error.into(),
            raw_data: None,
        }
    }
}

impl From<&ExpiryCheckError> for ErrorReport {
    fn from(err: &ExpiryCheckError) -> Self {
        Self {
            error: err.to_string(),
            raw_data: err.raw_data().map(str::to_string),
        }
    }
}

/// Strategy that produced an expiration date.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum LookupSource {
    /// WHOIS protocol query on port 43
    #[serde(rename = "whois")]
    Whois,

    /// Scraped from the whois.com lookup page
    #[serde(rename = "whois.com")]
    WhoisCom,
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupSource::Whois => write!(f, "whois"),
            LookupSource::WhoisCom => write!(f, "whois.com"),
        }
    }
}

/// Raw expiration value as a strategy found it, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpiryValue {
    /// Calendar date
    Date(NaiveDate),

    /// Date with a time-of-day component
    DateTime(NaiveDateTime),

    /// Several values; some registries report more than one
    List(Vec<ExpiryValue>),

    /// Free text, e.g. `2025-08-01 00:00:00` scraped from a page
    Text(String),
}

/// What a single strategy produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(ExpiryValue),
    Absent,
}

impl From<Option<ExpiryValue>> for LookupOutcome {
    fn from(value: Option<ExpiryValue>) -> Self {
        match value {
            Some(value) => LookupOutcome::Found(value),
            None => LookupOutcome::Absent,
        }
    }
}

/// Configuration for a lookup run.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Query the WHOIS protocol first
    /// Default: true
    pub enable_whois: bool,

    /// Fall back to scraping the lookup website
    /// Default: true
    pub enable_web: bool,

    /// Timeout for the WHOIS round-trip
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// Timeout for the HTTP request to the lookup website
    /// Default: 15 seconds
    pub web_timeout: Duration,

    /// `User-Agent` header for the lookup website
    pub user_agent: String,

    /// Base URL of the lookup website
    pub web_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enable_whois: true,
            enable_web: true,
            whois_timeout: Duration::from_secs(10),
            web_timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

impl LookupConfig {
    /// Enable or disable the WHOIS protocol strategy.
    pub fn with_whois(mut self, enabled: bool) -> Self {
        self.enable_whois = enabled;
        self
    }

    /// Enable or disable the web scraping fallback.
    pub fn with_web(mut self, enabled: bool) -> Self {
        self.enable_web = enabled;
        self
    }

    /// Set the same timeout for both strategies.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self.web_timeout = timeout;
        self
    }

    /// Point the web fallback at a different base URL.
    pub fn with_web_url<U: Into<String>>(mut self, url: U) -> Self {
        self.web_url = url.into();
        self
    }

    /// Override the `User-Agent` sent by the web fallback.
    pub fn with_user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
