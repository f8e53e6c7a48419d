//! Error handling for expiration lookups.
//!
//! Lookup strategies never surface their failures: they log and report an
//! absent result. The variants below cover what does reach the caller
//! (missing input, nothing found, an unparsable date) plus the plumbing
//! errors used while loading configuration or building clients.

use std::fmt;
use std::time::Duration;

/// Main error type for expiration lookups.
#[derive(Debug, Clone)]
pub enum ExpiryCheckError {
    /// No domain name was supplied
    MissingDomain,

    /// Every enabled strategy came back empty
    NotFound { domain: String },

    /// A date was found but it is not a `YYYY-MM-DD` calendar date
    UnsupportedDateFormat { raw: String },

    /// Network-related errors (connection, DNS, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// WHOIS protocol specific errors
    WhoisError { domain: String, message: String },

    /// Non-success HTTP status from the lookup website
    HttpError { url: String, status: u16 },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ExpiryCheckError {
    /// Create a new not-found error.
    pub fn not_found<D: Into<String>>(domain: D) -> Self {
        Self::NotFound {
            domain: domain.into(),
        }
    }

    /// Create a new unsupported date format error carrying the raw value.
    pub fn unsupported_date<R: Into<String>>(raw: R) -> Self {
        Self::UnsupportedDateFormat { raw: raw.into() }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new HTTP status error.
    pub fn http_status<U: Into<String>>(url: U, status: u16) -> Self {
        Self::HttpError {
            url: url.into(),
            status,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The unparsed value behind a format error, if any.
    pub fn raw_data(&self) -> Option<&str> {
        match self {
            Self::UnsupportedDateFormat { raw } => Some(raw),
            _ => None,
        }
    }
}

impl fmt::Display for ExpiryCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDomain => write!(f, "No domain provided"),
            Self::NotFound { .. } => write!(f, "Expiration date not found in WHOIS data"),
            Self::UnsupportedDateFormat { raw } => {
                write!(f, "Unsupported date format: {}", raw)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::HttpError { url, status } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpiryCheckError {}

impl From<reqwest::Error> for ExpiryCheckError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            Self::http_status(url, status.as_u16())
        } else if err.is_timeout() {
            Self::timeout("HTTP request", Duration::from_secs(15))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}
