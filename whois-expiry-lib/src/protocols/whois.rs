//! WHOIS protocol lookup.
//!
//! Queries port 43 through the `whois-rust` client with its own referral
//! following turned off; referrals are followed here instead. An IANA
//! `refer:` line leads to the TLD's registry, and a `Registrar WHOIS Server:`
//! line appends the registrar's answer to the registry's. A registrar that
//! cannot be reached leaves the registry answer as it was. The response is
//! free text, so the expiration field is picked out line by line and
//! converted to a native date where the format is recognised.

use crate::error::ExpiryCheckError;
use crate::protocols::registry::{extract_tld, get_whois_server, whois_servers_json};
use crate::protocols::ExpiryLookup;
use crate::types::{ExpiryValue, LookupOutcome, LookupSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use whois_rust::{WhoIs, WhoIsLookupOptions, WhoIsServerValue};

/// Expiration field names, highest priority first.
const EXPIRY_FIELDS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires on",
    "expires",
    "expiration time",
    "paid-till",
    "renewal date",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Socket timeouts run this much past the lookup deadline so the blocking
/// thread winds down on its own once the lookup has given up on it.
const SOCKET_GRACE: Duration = Duration::from_millis(500);

lazy_static::lazy_static! {
    static ref EXPIRY_LINE: Regex = Regex::new(&format!(
        r"(?im)^[ \t]*({})[ \t]*:[ \t]*(\S.*?)[ \t\r]*$",
        EXPIRY_FIELDS
            .iter()
            .map(|field| regex::escape(field))
            .collect::<Vec<_>>()
            .join("|")
    ))
    .expect("expiry field pattern is valid");

    /// IANA's pointer to the registry serving a TLD
    static ref TLD_REFERRAL: Regex =
        Regex::new(r"(?im)^[ \t]*refer[ \t]*:[ \t]*(\S+)").expect("refer pattern is valid");

    /// Registry's pointer to the registrar's own WHOIS server
    static ref REGISTRAR_REFERRAL: Regex = Regex::new(
        r"(?im)^[ \t]*(?:registrar whois server|whois server|referralserver)[ \t]*:[ \t]*(\S+)"
    )
    .expect("registrar referral pattern is valid");
}

/// WHOIS protocol client.
#[derive(Clone)]
pub struct WhoisLookup {
    /// Timeout for the whole query, referrals included
    timeout: Duration,
    /// Per-TLD servers consulted before the built-in map
    servers: HashMap<String, String>,
}

impl WhoisLookup {
    /// Create a new WHOIS lookup with the default 10 second timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a new WHOIS lookup with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            servers: HashMap::new(),
        }
    }

    /// Send the first query for the given TLDs to the given servers.
    ///
    /// Servers are `host` or `host:port`.
    ///
    /// ```rust
    /// use whois_expiry_lib::WhoisLookup;
    ///
    /// let lookup = WhoisLookup::new().with_servers([("com", "127.0.0.1:4343")]);
    /// assert_eq!(lookup.server_for("example.com").unwrap(), "127.0.0.1:4343");
    /// assert_eq!(lookup.server_for("example.org").unwrap(), "whois.publicinterestregistry.org");
    /// ```
    pub fn with_servers<I, T, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        self.servers.extend(
            servers
                .into_iter()
                .map(|(tld, server)| (tld.into().to_lowercase(), server.into())),
        );
        self
    }

    /// Server the first query for `domain` goes to.
    pub fn server_for(&self, domain: &str) -> Result<String, ExpiryCheckError> {
        let tld = extract_tld(domain)?;
        Ok(self
            .servers
            .get(&tld)
            .cloned()
            .unwrap_or_else(|| get_whois_server(&tld).to_string()))
    }

    /// Run the WHOIS query, following referrals, and return the response text.
    ///
    /// The client is blocking, so it runs on the blocking pool under a
    /// `tokio` timeout.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryCheckError` if:
    /// - The domain has no TLD
    /// - The first server, or the registry IANA refers to, cannot be reached
    /// - The query does not finish within the timeout
    pub async fn query(&self, domain: &str) -> Result<String, ExpiryCheckError> {
        let server = self.server_for(domain)?;
        let servers = whois_servers_json(domain)?;
        let domain_owned = domain.to_string();
        let socket_timeout = self.timeout + SOCKET_GRACE;

        let task = tokio::task::spawn_blocking(move || {
            let whois = WhoIs::from_string(&servers).map_err(|e| {
                ExpiryCheckError::whois(
                    domain_owned.clone(),
                    format!("Failed to load WHOIS servers: {}", e),
                )
            })?;

            query_with_referrals(&whois, &domain_owned, &server, socket_timeout)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ExpiryCheckError::internal(format!(
                "WHOIS task failed: {}",
                e
            ))),
            Err(_) => Err(ExpiryCheckError::timeout("WHOIS query", self.timeout)),
        }
    }
}

impl Default for WhoisLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpiryLookup for WhoisLookup {
    fn source(&self) -> LookupSource {
        LookupSource::Whois
    }

    async fn lookup(&self, domain: &str) -> LookupOutcome {
        match self.query(domain).await {
            Ok(response) => {
                let value = extract_expiry(&response);
                if value.is_none() {
                    tracing::debug!(domain, "WHOIS response has no expiration field");
                }
                value.into()
            }
            Err(e) => {
                tracing::warn!(domain, error = %e, "WHOIS lookup failed");
                LookupOutcome::Absent
            }
        }
    }
}

/// Query `server`, then follow an IANA referral and a registrar referral.
///
/// The registrar's answer is appended to the registry's; if the registrar
/// fails, the registry answer is returned alone.
fn query_with_referrals(
    whois: &WhoIs,
    domain: &str,
    server: &str,
    timeout: Duration,
) -> Result<String, ExpiryCheckError> {
    let mut server = server.to_string();
    let mut response = query_server(whois, domain, &server, timeout)?;

    if let Some(registry) = find_referral(&TLD_REFERRAL, &response, &server) {
        tracing::debug!(domain, %registry, "Following TLD referral");
        response = query_server(whois, domain, &registry, timeout)?;
        server = registry;
    }

    if let Some(registrar) = find_referral(&REGISTRAR_REFERRAL, &response, &server) {
        tracing::debug!(domain, %registrar, "Following registrar referral");
        match query_server(whois, domain, &registrar, timeout) {
            Ok(details) => {
                response.push('\n');
                response.push_str(&details);
            }
            Err(e) => {
                tracing::warn!(domain, %registrar, error = %e, "Registrar referral failed, keeping registry response");
            }
        }
    }

    Ok(response)
}

/// One round-trip to one server, with the client's own referral following off.
fn query_server(
    whois: &WhoIs,
    domain: &str,
    server: &str,
    timeout: Duration,
) -> Result<String, ExpiryCheckError> {
    let mut options = WhoIsLookupOptions::from_string(domain)
        .map_err(|e| ExpiryCheckError::whois(domain, format!("Invalid domain: {}", e)))?;
    let server_value = WhoIsServerValue::from_string(server).map_err(|e| {
        ExpiryCheckError::whois(domain, format!("Invalid WHOIS server '{}': {}", server, e))
    })?;

    options.server = Some(server_value);
    options.follow = 0;
    options.timeout = Some(timeout);

    whois
        .lookup(options)
        .map_err(|e| ExpiryCheckError::whois(domain, format!("{}: {}", server, e)))
}

/// Referral target named in `response`, unless it points back at `current`.
fn find_referral(pattern: &Regex, response: &str, current: &str) -> Option<String> {
    let host = pattern.captures(response)?.get(1)?.as_str();
    let host = host
        .strip_prefix("rwhois://")
        .or_else(|| host.strip_prefix("whois://"))
        .unwrap_or(host)
        .trim_end_matches('/');

    if host.is_empty() || host.eq_ignore_ascii_case(current) {
        None
    } else {
        Some(host.to_string())
    }
}

/// Pick the expiration value out of a raw WHOIS response.
///
/// Values are ordered by field priority, then by position in the response.
/// Duplicates are dropped. A single value is returned as is; several come
/// back as [`ExpiryValue::List`].
pub fn extract_expiry(response: &str) -> Option<ExpiryValue> {
    let mut matches: Vec<(usize, ExpiryValue)> = EXPIRY_LINE
        .captures_iter(response)
        .filter_map(|caps| {
            let field = caps.get(1)?.as_str().to_lowercase();
            let value = caps.get(2)?.as_str();
            let priority = EXPIRY_FIELDS.iter().position(|f| *f == field)?;
            Some((priority, parse_whois_date(value)))
        })
        .collect();

    // Stable sort keeps response order within a field
    matches.sort_by_key(|(priority, _)| *priority);

    let mut values: Vec<ExpiryValue> = Vec::new();
    for (_, value) in matches {
        if !values.contains(&value) {
            values.push(value);
        }
    }

    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(ExpiryValue::List(values)),
    }
}

/// Convert a WHOIS date string into a native value when the format is known.
fn parse_whois_date(value: &str) -> ExpiryValue {
    let value = value.trim();
    let first_token = value.split_whitespace().next().unwrap_or(value);

    for candidate in [value, first_token] {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(candidate) {
            return ExpiryValue::DateTime(datetime.naive_local());
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(candidate, format) {
                return ExpiryValue::DateTime(datetime);
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return ExpiryValue::Date(date);
            }
        }
    }

    ExpiryValue::Text(value.to_string())
}
