//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading `WE_*`
//! environment variables, and folding both into a [`LookupConfig`].

use crate::error::ExpiryCheckError;
use crate::types::LookupConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Lookup strategy settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupDefaults>,
}

/// `[lookup]` table of a configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LookupDefaults {
    /// Query the WHOIS protocol
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<bool>,

    /// Fall back to the lookup website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<bool>,

    /// WHOIS timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Website timeout (as string, e.g., "15s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_timeout: Option<String>,

    /// `User-Agent` for the lookup website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Base URL of the lookup website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

impl LookupDefaults {
    /// Apply the values that are set onto `config`.
    ///
    /// Values are expected to be validated already; unparsable timeouts are skipped.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(whois) = self.whois {
            config.enable_whois = whois;
        }
        if let Some(web) = self.web {
            config.enable_web = web;
        }
        if let Some(timeout) = self.whois_timeout.as_deref().and_then(parse_timeout_string) {
            config.whois_timeout = timeout;
        }
        if let Some(timeout) = self.web_timeout.as_deref().and_then(parse_timeout_string) {
            config.web_timeout = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(web_url) = &self.web_url {
            config.web_url = web_url.clone();
        }
        config
    }

    /// Overlay `higher` on top of `self`; values set in `higher` win.
    fn merge(mut self, higher: LookupDefaults) -> LookupDefaults {
        if higher.whois.is_some() {
            self.whois = higher.whois;
        }
        if higher.web.is_some() {
            self.web = higher.web;
        }
        if higher.whois_timeout.is_some() {
            self.whois_timeout = higher.whois_timeout;
        }
        if higher.web_timeout.is_some() {
            self.web_timeout = higher.web_timeout;
        }
        if higher.user_agent.is_some() {
            self.user_agent = higher.user_agent;
        }
        if higher.web_url.is_some() {
            self.web_url = higher.web_url;
        }
        self
    }

    fn validate(&self) -> Result<(), ExpiryCheckError> {
        for (key, value) in [
            ("whois_timeout", &self.whois_timeout),
            ("web_timeout", &self.web_timeout),
        ] {
            if let Some(timeout_str) = value {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ExpiryCheckError::config(format!(
                        "Invalid {} '{}'. Use format like '5s', '30s', '2m'",
                        key, timeout_str
                    )));
                }
            }
        }

        if let Some(user_agent) = &self.user_agent {
            if user_agent.trim().is_empty() {
                return Err(ExpiryCheckError::config("user_agent cannot be empty"));
            }
        }

        if let Some(web_url) = &self.web_url {
            validate_web_url(web_url)?;
        }

        Ok(())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ExpiryCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExpiryCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ExpiryCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ExpiryCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, ExpiryCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "Loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whois-expiry.toml", "./.whois-expiry.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".whois-expiry.toml", "whois-expiry.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-expiry").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations. Values from `higher` take precedence.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            lookup: match (lower.lookup, higher.lookup) {
                (Some(lower_lookup), Some(higher_lookup)) => {
                    Some(lower_lookup.merge(higher_lookup))
                }
                (None, Some(higher_lookup)) => Some(higher_lookup),
                (Some(lower_lookup), None) => Some(lower_lookup),
                (None, None) => None,
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ExpiryCheckError> {
        match &config.lookup {
            Some(lookup) => lookup.validate(),
            None => Ok(()),
        }
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `WE_*` variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub lookup: LookupDefaults,
    pub config: Option<String>,
}

/// Load configuration from `WE_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    env_config.lookup.whois = env_flag(&lookup, "WE_WHOIS");
    env_config.lookup.web = env_flag(&lookup, "WE_WEB");
    env_config.lookup.whois_timeout = env_timeout(&lookup, "WE_WHOIS_TIMEOUT");
    env_config.lookup.web_timeout = env_timeout(&lookup, "WE_WEB_TIMEOUT");

    if let Some(user_agent) = lookup("WE_USER_AGENT") {
        if user_agent.trim().is_empty() {
            tracing::warn!("Ignoring empty WE_USER_AGENT");
        } else {
            tracing::debug!(%user_agent, "Using WE_USER_AGENT");
            env_config.lookup.user_agent = Some(user_agent);
        }
    }

    if let Some(web_url) = lookup("WE_WEB_URL") {
        match validate_web_url(&web_url) {
            Ok(()) => {
                tracing::debug!(%web_url, "Using WE_WEB_URL");
                env_config.lookup.web_url = Some(web_url);
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring WE_WEB_URL"),
        }
    }

    if let Some(config_path) = lookup("WE_CONFIG") {
        if !config_path.trim().is_empty() {
            env_config.config = Some(config_path);
        }
    }

    env_config
}

fn env_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(key)?;
    match parse_bool_flag(&val) {
        Some(flag) => {
            tracing::debug!("Using {}={}", key, flag);
            Some(flag)
        }
        None => {
            tracing::warn!("Invalid {}='{}', use true/false", key, val);
            None
        }
    }
}

fn env_timeout<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(key)?;
    if parse_timeout_string(&val).is_some() {
        tracing::debug!("Using {}={}", key, val);
        Some(val)
    } else {
        tracing::warn!(
            "Invalid {}='{}', use format like '5s', '30s', '2m'",
            key,
            val
        );
        None
    }
}

fn parse_bool_flag(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_web_url(url: &str) -> Result<(), ExpiryCheckError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ExpiryCheckError::config(format!(
            "Invalid web_url '{}'. It must start with http:// or https://",
            url
        )))
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into a duration.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.trim().parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse::<u64>().ok()
    };

    secs.filter(|secs| *secs > 0).map(Duration::from_secs)
}
