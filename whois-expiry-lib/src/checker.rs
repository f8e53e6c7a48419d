//! Main expiry checker implementation.
//!
//! `ExpiryChecker` runs the configured strategies in order, stops at the
//! first one that finds a value, normalizes it and builds the report.

use crate::error::ExpiryCheckError;
use crate::normalize::normalize;
use crate::protocols::{ExpiryLookup, WebLookup, WhoisLookup};
use crate::types::{ExpiryReport, LookupConfig, LookupOutcome};
use chrono::{Local, NaiveDate};

/// Coordinates the lookup strategies for a domain.
///
/// # Example
///
/// ```rust,no_run
/// use whois_expiry_lib::ExpiryChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = ExpiryChecker::new()?;
///     let report = checker.check_domain("example.com").await?;
///     println!("{} expires in {} days", report.domain, report.days_left);
///     Ok(())
/// }
/// ```
pub struct ExpiryChecker {
    /// Strategies in the order they are tried
    strategies: Vec<Box<dyn ExpiryLookup>>,
}

impl ExpiryChecker {
    /// Create a checker with default configuration: WHOIS first, whois.com second.
    pub fn new() -> Result<Self, ExpiryCheckError> {
        Self::with_config(&LookupConfig::default())
    }

    /// Create a checker from a configuration.
    ///
    /// Disabled strategies are left out. A checker with no strategies is
    /// valid and reports every domain as not found.
    ///
    /// ```rust
    /// use whois_expiry_lib::{ExpiryChecker, LookupConfig};
    /// use std::time::Duration;
    ///
    /// let config = LookupConfig::default()
    ///     .with_whois(false)
    ///     .with_timeout(Duration::from_secs(5));
    ///
    /// let checker = ExpiryChecker::with_config(&config).unwrap();
    /// assert_eq!(checker.strategy_count(), 1);
    /// ```
    pub fn with_config(config: &LookupConfig) -> Result<Self, ExpiryCheckError> {
        let mut strategies: Vec<Box<dyn ExpiryLookup>> = Vec::new();

        if config.enable_whois {
            strategies.push(Box::new(WhoisLookup::with_timeout(config.whois_timeout)));
        }
        if config.enable_web {
            strategies.push(Box::new(WebLookup::with_config(config)?));
        }

        Ok(Self { strategies })
    }

    /// Create a checker from an explicit, ordered list of strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn ExpiryLookup>>) -> Self {
        Self { strategies }
    }

    /// Number of strategies this checker will try.
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Look up a domain's expiration date, with days counted from today's local date.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryCheckError` if:
    /// - The domain is empty (`MissingDomain`)
    /// - No strategy finds an expiration date (`NotFound`)
    /// - The date found is not a `YYYY-MM-DD` date (`UnsupportedDateFormat`)
    pub async fn check_domain(&self, domain: &str) -> Result<ExpiryReport, ExpiryCheckError> {
        self.check_domain_on(domain, Local::now().date_naive()).await
    }

    /// Same as [`check_domain`](Self::check_domain), counting days from `today`.
    pub async fn check_domain_on(
        &self,
        domain: &str,
        today: NaiveDate,
    ) -> Result<ExpiryReport, ExpiryCheckError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ExpiryCheckError::MissingDomain);
        }

        for strategy in &self.strategies {
            let source = strategy.source();
            tracing::debug!(domain, %source, "Trying lookup strategy");

            match strategy.lookup(domain).await {
                LookupOutcome::Found(value) => {
                    tracing::info!(domain, %source, ?value, "Expiration value found");
                    let expiration_date = normalize(domain, &value)?;
                    return Ok(ExpiryReport::new(domain, expiration_date, source, today));
                }
                LookupOutcome::Absent => {
                    tracing::info!(domain, %source, "No expiration value, moving on");
                }
            }
        }

        Err(ExpiryCheckError::not_found(domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpiryValue, LookupSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedLookup {
        source: LookupSource,
        outcome: LookupOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl FixedLookup {
        fn boxed(
            source: LookupSource,
            outcome: LookupOutcome,
        ) -> (Box<dyn ExpiryLookup>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let lookup = Self {
                source,
                outcome,
                calls: calls.clone(),
            };
            (Box::new(lookup), calls)
        }
    }

    #[async_trait]
    impl ExpiryLookup for FixedLookup {
        fn source(&self) -> LookupSource {
            self.source
        }

        async fn lookup(&self, _domain: &str) -> LookupOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let (whois, whois_calls) = FixedLookup::boxed(
            LookupSource::Whois,
            LookupOutcome::Found(ExpiryValue::Date(date(2026, 1, 10))),
        );
        let (web, web_calls) = FixedLookup::boxed(LookupSource::WhoisCom, LookupOutcome::Absent);
        let checker = ExpiryChecker::with_strategies(vec![whois, web]);

        let report = checker
            .check_domain_on("example.com", date(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(report.expiration_date, date(2026, 1, 10));
        assert_eq!(report.days_left, 9);
        assert_eq!(report.source, LookupSource::Whois);
        assert_eq!(whois_calls.load(Ordering::SeqCst), 1);
        assert_eq!(web_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_absent_primary_falls_back() {
        let (whois, whois_calls) = FixedLookup::boxed(LookupSource::Whois, LookupOutcome::Absent);
        let (web, web_calls) = FixedLookup::boxed(
            LookupSource::WhoisCom,
            LookupOutcome::Found(ExpiryValue::Text("2025-08-01 00:00:00".to_string())),
        );
        let checker = ExpiryChecker::with_strategies(vec![whois, web]);

        let report = checker
            .check_domain_on("example.com", date(2025, 8, 11))
            .await
            .unwrap();

        assert_eq!(report.expiration_date, date(2025, 8, 1));
        assert_eq!(report.days_left, -10);
        assert!(report.is_expired());
        assert_eq!(report.source, LookupSource::WhoisCom);
        assert_eq!(whois_calls.load(Ordering::SeqCst), 1);
        assert_eq!(web_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_absent_is_not_found() {
        let (whois, _) = FixedLookup::boxed(LookupSource::Whois, LookupOutcome::Absent);
        let (web, web_calls) = FixedLookup::boxed(LookupSource::WhoisCom, LookupOutcome::Absent);
        let checker = ExpiryChecker::with_strategies(vec![whois, web]);

        let err = checker.check_domain("example.com").await.unwrap_err();
        assert!(matches!(err, ExpiryCheckError::NotFound { .. }));
        assert_eq!(web_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_date_is_terminal() {
        let (whois, _) = FixedLookup::boxed(
            LookupSource::Whois,
            LookupOutcome::Found(ExpiryValue::Text("N/A".to_string())),
        );
        let (web, web_calls) = FixedLookup::boxed(
            LookupSource::WhoisCom,
            LookupOutcome::Found(ExpiryValue::Text("2030-01-01".to_string())),
        );
        let checker = ExpiryChecker::with_strategies(vec![whois, web]);

        let err = checker.check_domain("example.com").await.unwrap_err();
        assert_eq!(err.raw_data(), Some("N/A"));
        assert_eq!(web_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_domain_is_missing() {
        let (whois, whois_calls) = FixedLookup::boxed(LookupSource::Whois, LookupOutcome::Absent);
        let checker = ExpiryChecker::with_strategies(vec![whois]);

        let err = checker.check_domain("   ").await.unwrap_err();
        assert!(matches!(err, ExpiryCheckError::MissingDomain));
        assert_eq!(whois_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_config_respects_toggles() {
        let both = ExpiryChecker::with_config(&LookupConfig::default()).unwrap();
        assert_eq!(both.strategy_count(), 2);

        let none = LookupConfig::default().with_whois(false).with_web(false);
        assert_eq!(ExpiryChecker::with_config(&none).unwrap().strategy_count(), 0);
    }
}
