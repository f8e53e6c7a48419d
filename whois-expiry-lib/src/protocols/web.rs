//! whois.com lookup page scraping.
//!
//! Fallback when the WHOIS protocol gives nothing. The lookup page lays
//! registration data out as `df-label` / `df-value` div pairs; the value
//! following an expiration label is returned verbatim for the normalizer.

use crate::error::ExpiryCheckError;
use crate::protocols::ExpiryLookup;
use crate::types::{ExpiryValue, LookupConfig, LookupOutcome, LookupSource};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Labels searched for, in priority order.
pub const EXPIRY_LABELS: &[&str] = &[
    "Expires On",
    "Registry Expiry Date",
    "Expiration Date",
    "Expiry Date",
];

const LABEL_CLASS: &str = "df-label";
const VALUE_CLASS: &str = "df-value";

lazy_static::lazy_static! {
    static ref DIV: Selector = Selector::parse("div").expect("div selector is valid");
}

/// Client for the WHOIS lookup website.
#[derive(Clone)]
pub struct WebLookup {
    /// HTTP client carrying the timeout and `User-Agent`
    http_client: reqwest::Client,
    /// Base URL the domain is appended to
    base_url: String,
    /// Request timeout, kept for error reporting
    timeout: Duration,
}

impl WebLookup {
    /// Create a web lookup against whois.com with default settings.
    pub fn new() -> Result<Self, ExpiryCheckError> {
        Self::with_config(&LookupConfig::default())
    }

    /// Create a web lookup using the timeout, `User-Agent` and base URL from `config`.
    pub fn with_config(config: &LookupConfig) -> Result<Self, ExpiryCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.web_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ExpiryCheckError::network_with_source(
                    "Failed to create HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: config.web_url.clone(),
            timeout: config.web_timeout,
        })
    }

    /// Lookup page URL for a domain.
    ///
    /// The domain goes into the path as given, without escaping.
    pub fn lookup_url(&self, domain: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), domain)
    }

    /// Fetch the lookup page for a domain.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryCheckError` on transport failures, timeouts and
    /// non-2xx responses.
    pub async fn fetch(&self, domain: &str) -> Result<String, ExpiryCheckError> {
        let url = self.lookup_url(domain);
        tracing::debug!(%url, "Fetching lookup page");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpiryCheckError::http_status(url, status.as_u16()));
        }

        response.text().await.map_err(|e| self.request_error(e))
    }

    fn request_error(&self, err: reqwest::Error) -> ExpiryCheckError {
        if err.is_timeout() {
            ExpiryCheckError::timeout("whois.com request", self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl ExpiryLookup for WebLookup {
    fn source(&self) -> LookupSource {
        LookupSource::WhoisCom
    }

    async fn lookup(&self, domain: &str) -> LookupOutcome {
        match self.fetch(domain).await {
            Ok(body) => {
                let value = find_expiry_in_html(&body);
                if value.is_none() {
                    tracing::debug!(domain, "No expiration label on lookup page");
                }
                value.map(ExpiryValue::Text).into()
            }
            Err(e) => {
                tracing::warn!(domain, error = %e, "whois.com lookup failed");
                LookupOutcome::Absent
            }
        }
    }
}

/// Find the expiration value on a lookup page.
///
/// For each label in [`EXPIRY_LABELS`] order, the first div whose text is the
/// label (a trailing colon is ignored) is located, and the first `df-value`
/// div after it in document order supplies the value. If no label matches,
/// any `df-label` div mentioning "expir" is tried instead.
pub fn find_expiry_in_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let divs: Vec<ElementRef> = document.select(&DIV).collect();

    for label in EXPIRY_LABELS {
        let position = divs.iter().position(|div| label_text(div) == *label);
        if let Some(value) = position.and_then(|pos| value_after(&divs, pos)) {
            return Some(value);
        }
    }

    divs.iter()
        .enumerate()
        .filter(|(_, div)| has_class(div, LABEL_CLASS))
        .filter(|(_, div)| full_text(div).to_lowercase().contains("expir"))
        .find_map(|(pos, _)| value_after(&divs, pos))
}

/// Text of the first `df-value` div after `pos`, if it is not blank.
fn value_after(divs: &[ElementRef], pos: usize) -> Option<String> {
    divs[pos + 1..]
        .iter()
        .find(|div| has_class(div, VALUE_CLASS))
        .map(stripped_text)
        .filter(|text| !text.is_empty())
}

fn has_class(div: &ElementRef, class: &str) -> bool {
    div.value().classes().any(|c| c == class)
}

fn full_text(div: &ElementRef) -> String {
    div.text().collect()
}

fn label_text(div: &ElementRef) -> String {
    full_text(div).trim().trim_end_matches(':').trim_end().to_string()
}

/// Each text node trimmed, then concatenated.
fn stripped_text(div: &ElementRef) -> String {
    div.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, value: &str) -> String {
        format!(
            r#"<div class="df-row"><div class="df-label">{}</div><div class="df-value">{}</div></div>"#,
            label, value
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><div class="df-block">{}</div></body></html>"#,
            rows.join("")
        )
    }

    #[test]
    fn test_expires_on_label() {
        let html = page(&[
            row("Registered On", "1995-08-14"),
            row("Expires On", "2025-08-01 00:00:00"),
        ]);
        assert_eq!(
            find_expiry_in_html(&html),
            Some("2025-08-01 00:00:00".to_string())
        );
    }

    #[test]
    fn test_label_with_trailing_colon() {
        let html = page(&[row("Expires On:", "2026-08-13")]);
        assert_eq!(find_expiry_in_html(&html), Some("2026-08-13".to_string()));
    }

    #[test]
    fn test_label_priority_beats_document_order() {
        let html = page(&[
            row("Registry Expiry Date", "2030-01-01"),
            row("Expires On", "2029-01-01"),
        ]);
        assert_eq!(find_expiry_in_html(&html), Some("2029-01-01".to_string()));
    }

    #[test]
    fn test_value_is_next_df_value_in_document_order() {
        let html = r#"<div>Expiry Date</div><div class="note">ignored</div><div><div class="df-value"> 2027-02-03 </div></div>"#;
        assert_eq!(find_expiry_in_html(html), Some("2027-02-03".to_string()));
    }

    #[test]
    fn test_secondary_pass_matches_expir_substring() {
        let html = page(&[
            row("Domain", "example.com"),
            row("Registrar Registration EXPIRATION", "2028-12-31"),
        ]);
        assert_eq!(find_expiry_in_html(&html), Some("2028-12-31".to_string()));
    }

    #[test]
    fn test_value_text_nodes_are_stripped_and_joined() {
        let html = page(&[row("Expires On", "  <span> 2025-08-01 </span>\n")]);
        assert_eq!(find_expiry_in_html(&html), Some("2025-08-01".to_string()));
    }

    #[test]
    fn test_no_label_means_no_value() {
        let html = page(&[row("Registered On", "1995-08-14"), row("Status", "ok")]);
        assert_eq!(find_expiry_in_html(&html), None);
        assert_eq!(find_expiry_in_html(""), None);
    }

    #[test]
    fn test_label_without_value_falls_through() {
        let html = r#"<div class="df-label">Expires On</div><div class="df-value">   </div>"#;
        assert_eq!(find_expiry_in_html(html), None);
    }

    #[test]
    fn test_lookup_url() {
        let config = LookupConfig::default().with_web_url("http://localhost:1234/whois/");
        let lookup = WebLookup::with_config(&config).unwrap();
        assert_eq!(
            lookup.lookup_url("example.com"),
            "http://localhost:1234/whois/example.com"
        );

        let lookup = WebLookup::new().unwrap();
        assert_eq!(
            lookup.lookup_url("example.com"),
            "https://www.whois.com/whois/example.com"
        );
        assert_eq!(lookup.source(), LookupSource::WhoisCom);
    }
}
