//! Lookup strategies for expiration dates.
//!
//! Each strategy answers the same question, "when does this domain
//! expire?", through a different channel. Strategies never fail loudly:
//! problems are logged and reported as [`LookupOutcome::Absent`] so the
//! checker can move on to the next one.

use crate::types::{LookupOutcome, LookupSource};
use async_trait::async_trait;

/// WHOIS protocol lookup (port 43)
pub mod whois;

/// whois.com page scraping
pub mod web;

/// TLD to WHOIS server mappings
pub mod registry;

pub use registry::{extract_tld, get_whois_server, get_whois_server_map};
pub use web::{find_expiry_in_html, WebLookup, EXPIRY_LABELS};
pub use whois::{extract_expiry, WhoisLookup};

/// A way of finding a domain's expiration date.
#[async_trait]
pub trait ExpiryLookup: Send + Sync {
    /// Label reported in the result when this strategy succeeds.
    fn source(&self) -> LookupSource;

    /// Look the domain up once. Errors are swallowed and reported as `Absent`.
    async fn lookup(&self, domain: &str) -> LookupOutcome;
}
