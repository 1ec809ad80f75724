//! Error types for lease-ddns.

use crate::address::AddressFamily;
use thiserror::Error;

/// Result type alias for lease-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The address listing could not be run, timed out or exited non-zero.
    #[error("Address discovery failed: {0}")]
    Discovery(String),

    /// The address listing ran but its output could not be interpreted.
    #[error("Address discovery output could not be parsed: {0}")]
    DiscoveryParse(String),

    /// A configured per-family index does not exist.
    #[error("{family} index {index} is out of range ({available} address(es) available)")]
    Selection {
        family: AddressFamily,
        index: usize,
        available: usize,
    },

    /// Provider rejected the credentials or does not know the domain.
    #[error("Authentication failed ({provider}): {message}")]
    Auth { provider: String, message: String },

    /// Provider answered with something we do not understand.
    #[error("Unexpected response ({provider}): {body}")]
    Protocol { provider: String, body: String },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Transport(String),

    /// One or more jobs terminated with an error.
    #[error("{failed} of {total} job(s) failed")]
    JobsFailed { failed: usize, total: usize },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Transport(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}
