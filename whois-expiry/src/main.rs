//! WHOIS Expiry CLI Application
//!
//! A command-line interface that reports when a domain expires and how many
//! days are left. Lookups are done by whois-expiry-lib; this binary handles
//! arguments, configuration precedence, logging and output.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::future::Future;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use whois_expiry_lib::{
    load_env_config, parse_timeout_string, ConfigManager, EnvConfig, ErrorReport,
    ExpiryCheckError, ExpiryChecker, ExpiryReport, FileConfig, LookupConfig,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-expiry
#[derive(Parser, Debug)]
#[command(name = "whois-expiry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Report when a domain expires using WHOIS with a whois.com fallback")]
#[command(
    long_about = "Report when a domain expires and how many days are left.\n\nThe WHOIS protocol is queried first; if it has no expiration date, the whois.com lookup page is scraped instead. The result is printed as JSON."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain name to look up (e.g. example.com)
    #[arg(value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// Skip the WHOIS protocol lookup
    #[arg(long = "no-whois", help_heading = "Lookup")]
    pub no_whois: bool,

    /// Skip the whois.com fallback
    #[arg(long = "no-web", help_heading = "Lookup")]
    pub no_web: bool,

    /// Timeout for each lookup (e.g. 5s, 30s, 2m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Lookup")]
    pub timeout: Option<String>,

    /// Base URL of the lookup website; the domain is appended as a path segment
    #[arg(long = "web-url", value_name = "URL", help_heading = "Lookup")]
    pub web_url: Option<String>,

    /// User-Agent sent to the lookup website
    #[arg(long = "user-agent", value_name = "UA", help_heading = "Lookup")]
    pub user_agent: Option<String>,

    /// Print a colored summary instead of JSON
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// How long exit waits for blocking work still running when the lookup ends.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn main() {
    let args = Args::parse();
    init_tracing(&args);

    let outcome = block_on_and_shutdown(run(&args)).and_then(|result| result);
    let printed = outcome.and_then(|report| print_report(&report, args.pretty));

    if let Err(e) = printed {
        print_error(&e);
        process::exit(1);
    }
}

/// Drive `future` on a fresh runtime, then shut it down without waiting on
/// abandoned blocking tasks such as a timed-out WHOIS socket.
fn block_on_and_shutdown<F: Future>(future: F) -> Result<F::Output, ExpiryCheckError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ExpiryCheckError::internal(format!("Failed to start runtime: {}", e)))?;

    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` and `--verbose` pick the level.
fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(args)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_log_level(args: &Args) -> &'static str {
    if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    }
}

/// Resolve the domain and configuration, then run the lookup.
async fn run(args: &Args) -> Result<ExpiryReport, ExpiryCheckError> {
    let domain = requested_domain(args)?;

    let config = build_config(args)?;
    tracing::debug!(?config, "Resolved lookup configuration");

    let checker = ExpiryChecker::with_config(&config)?;
    checker.check_domain(domain).await
}

/// The domain argument, trimmed. Missing and blank are the same error.
fn requested_domain(args: &Args) -> Result<&str, ExpiryCheckError> {
    args.domain
        .as_deref()
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .ok_or(ExpiryCheckError::MissingDomain)
}

fn print_report(report: &ExpiryReport, pretty: bool) -> Result<(), ExpiryCheckError> {
    if pretty {
        ui::print_report(report);
    } else {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| ExpiryCheckError::internal(format!("Failed to encode report: {}", e)))?;
        println!("{}", json);
    }
    Ok(())
}

/// Write the error object to stderr as compact JSON.
fn print_error(err: &ExpiryCheckError) {
    let report = ErrorReport::from(err);
    match serde_json::to_string(&report) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", report.error),
    }
}

/// Build LookupConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (WE_*)
/// 3. Config file (--config, WE_CONFIG, or discovered files)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<LookupConfig, ExpiryCheckError> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;

    let mut config = LookupConfig::default();

    // Step 1: Config file
    if let Some(lookup) = &file_config.lookup {
        config = lookup.apply_to(config);
    }

    // Step 2: Environment variables (WE_*)
    config = env_config.lookup.apply_to(config);

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args_to_config(config, args)
}

/// Load the config file: `--config` first, then `WE_CONFIG`, then discovery.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, ExpiryCheckError> {
    let config_manager = ConfigManager::new(args.verbose || args.debug);

    if let Some(explicit_config_path) = &args.config {
        tracing::info!(path = %explicit_config_path, "Using explicit config file (CLI --config)");
        config_manager.load_file(explicit_config_path)
    } else if let Some(env_config_path) = &env_config.config {
        tracing::info!(path = %env_config_path, "Using explicit config file (WE_CONFIG)");
        config_manager.load_file(env_config_path)
    } else {
        tracing::debug!("Discovering config files");
        config_manager.discover_and_load()
    }
}

/// Apply CLI arguments to config (highest precedence).
///
/// Boolean flags only ever disable a strategy; leaving them off keeps the
/// value from the environment or config file.
fn apply_cli_args_to_config(
    mut config: LookupConfig,
    args: &Args,
) -> Result<LookupConfig, ExpiryCheckError> {
    if args.no_whois {
        config.enable_whois = false;
    }
    if args.no_web {
        config.enable_web = false;
    }

    if let Some(timeout_str) = &args.timeout {
        let timeout = parse_timeout_string(timeout_str).ok_or_else(|| {
            ExpiryCheckError::config(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout_str
            ))
        })?;
        config = config.with_timeout(timeout);
    }

    if let Some(web_url) = &args.web_url {
        if !web_url.starts_with("http://") && !web_url.starts_with("https://") {
            return Err(ExpiryCheckError::config(format!(
                "Invalid web URL '{}'. It must start with http:// or https://",
                web_url
            )));
        }
        config = config.with_web_url(web_url.as_str());
    }

    if let Some(user_agent) = &args.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ExpiryCheckError::config("User-Agent cannot be empty"));
        }
        config = config.with_user_agent(user_agent.as_str());
    }

    Ok(config)
}
