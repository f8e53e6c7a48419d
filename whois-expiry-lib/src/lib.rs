//! # WHOIS Expiry Library
//!
//! Looks up when a domain's registration expires and how many days are left.
//!
//! The WHOIS protocol is asked first; if it has nothing usable, the
//! whois.com lookup page is scraped instead. Whatever comes back is
//! normalized to a `YYYY-MM-DD` date.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_expiry_lib::ExpiryChecker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = ExpiryChecker::new()?;
//!     let report = checker.check_domain("example.com").await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Strategies
//!
//! - **WHOIS**: port 43 query with referral following
//! - **whois.com**: HTML scrape of the public lookup page
//!
//! Both implement [`ExpiryLookup`]; custom strategy lists can be passed to
//! [`ExpiryChecker::with_strategies`].

pub use checker::ExpiryChecker;
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, EnvConfig,
    FileConfig, LookupDefaults,
};
pub use error::ExpiryCheckError;
pub use normalize::{days_until, normalize, parse_date_text};
pub use protocols::{
    extract_expiry, extract_tld, find_expiry_in_html, get_whois_server, get_whois_server_map,
    ExpiryLookup, WebLookup, WhoisLookup, EXPIRY_LABELS,
};
pub use types::{
    ErrorReport, ExpiryReport, ExpiryValue, LookupConfig, LookupOutcome, LookupSource,
    DEFAULT_USER_AGENT, DEFAULT_WEB_URL,
};

pub mod normalize;

mod checker;
mod config;
mod error;
mod protocols;
mod types;

pub type Result<T> = std::result::Result<T, ExpiryCheckError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
