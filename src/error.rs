//! Errors surfaced by provider adapters.
//!
//! Expected "no data" outcomes (zero results, missing segments) are not
//! errors; they travel as `Option::None`.

use std::fmt;

/// Adapter misconfiguration, detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey { provider: &'static str },
    EmptyBaseUrl { provider: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey { provider } => {
                write!(f, "{} requires an API key", provider)
            }
            ConfigError::EmptyBaseUrl { provider } => {
                write!(f, "{} base url is empty", provider)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum ProviderError {
    Config(ConfigError),
    Http(reqwest::Error),
    /// The service answered with a non-success status code in its body.
    Status { status: String, message: Option<String> },
    /// The response could not be interpreted.
    Malformed(String),
    /// A multi-waypoint route was requested with fewer than two waypoints.
    TooFewWaypoints(usize),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(err) => write!(f, "configuration error: {}", err),
            ProviderError::Http(err) => write!(f, "http error: {}", err),
            ProviderError::Status { status, message } => match message {
                Some(message) => write!(f, "provider returned {}: {}", status, message),
                None => write!(f, "provider returned {}", status),
            },
            ProviderError::Malformed(msg) => write!(f, "malformed response: {}", msg),
            ProviderError::TooFewWaypoints(count) => {
                write!(f, "route needs at least 2 waypoints, got {}", count)
            }
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Config(err) => Some(err),
            ProviderError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for ProviderError {
    fn from(err: ConfigError) -> Self {
        ProviderError::Config(err)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err)
    }
}
