//! Configuration management for lease-ddns.

use crate::error::{DdnsError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Independent update jobs.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// One job: an address source plus the providers it feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Name used in every log line of this job.
    pub name: String,

    /// Where addresses come from.
    pub parser: ParserConfig,

    /// Providers, applied in this order.
    #[serde(default)]
    pub updaters: Vec<UpdaterConfig>,
}

/// Address source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ParserConfig {
    /// Parse `ip addr show dev <interface> scope <scope>`.
    #[serde(rename = "ip_command", alias = "IPCommandParser")]
    IpCommand {
        /// Network interface (e.g. "eth0").
        interface: String,
        /// Address scope passed to `ip` (default: "global").
        #[serde(default = "default_scope")]
        scope: String,
        /// Command timeout in seconds (default: 5).
        #[serde(default = "default_command_timeout")]
        command_timeout: u64,
        #[serde(default = "default_true")]
        fetch_ipv4: bool,
        #[serde(default = "default_true")]
        fetch_ipv6: bool,
        /// Pick only the n-th IPv4 address.
        #[serde(default)]
        ipv4_index: Option<usize>,
        /// Pick only the n-th IPv6 address.
        #[serde(default)]
        ipv6_index: Option<usize>,
    },
}

fn default_scope() -> String {
    "global".to_string()
}

fn default_command_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// Updater configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum UpdaterConfig {
    #[serde(rename = "strato", alias = "StratoUpdater")]
    Strato {
        /// Username (or environment variable name if prefixed with $).
        username: String,
        /// Password (or environment variable name if prefixed with $).
        password: String,
        /// Hostname to update.
        domain: String,
    },

    /// Any provider speaking the dyndns2 `/nic/update` protocol.
    #[serde(rename = "dyndns2")]
    DynDns2 {
        /// Update host (e.g. "members.dyndns.org").
        server: String,
        username: String,
        password: String,
        domain: String,
    },
}

impl Config {
    /// Default config locations, most specific first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("lease-ddns/config.toml")),
            Some(PathBuf::from("/etc/lease-ddns/config.toml")),
            Some(PathBuf::from("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Resolve the config path: explicit path, else first existing default.
    pub fn resolve_path(cli_path: Option<PathBuf>) -> PathBuf {
        if let Some(path) = cli_path {
            return path;
        }

        let candidates = Self::candidate_paths();
        candidates
            .iter()
            .find(|candidate| candidate.exists())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields an empty configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file {} not found", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();

        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(DdnsError::Config("Job name must not be empty".to_string()));
            }
            if !names.insert(job.name.as_str()) {
                return Err(DdnsError::Config(format!(
                    "Duplicate job name '{}'",
                    job.name
                )));
            }

            job.parser.validate(&job.name)?;

            if job.updaters.is_empty() {
                tracing::warn!(job = %job.name, "Job has no updaters configured");
            }
            for updater in &job.updaters {
                updater.validate(&job.name)?;
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = DdnsError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl ParserConfig {
    fn validate(&self, job: &str) -> Result<()> {
        match self {
            ParserConfig::IpCommand {
                interface,
                command_timeout,
                fetch_ipv4,
                fetch_ipv6,
                ..
            } => {
                if interface.trim().is_empty() {
                    return Err(DdnsError::Config(format!("[{}] interface is empty", job)));
                }
                if *command_timeout == 0 {
                    return Err(DdnsError::Config(format!(
                        "[{}] command_timeout must be at least 1 second",
                        job
                    )));
                }
                if !fetch_ipv4 && !fetch_ipv6 {
                    return Err(DdnsError::Config(format!(
                        "[{}] both fetch_ipv4 and fetch_ipv6 are disabled",
                        job
                    )));
                }
                Ok(())
            }
        }
    }
}

impl UpdaterConfig {
    /// Get the provider name.
    pub fn name(&self) -> &'static str {
        match self {
            UpdaterConfig::Strato { .. } => "strato",
            UpdaterConfig::DynDns2 { .. } => "dyndns2",
        }
    }

    fn validate(&self, job: &str) -> Result<()> {
        let (username, domain) = match self {
            UpdaterConfig::Strato {
                username, domain, ..
            } => (username, domain),
            UpdaterConfig::DynDns2 {
                server,
                username,
                domain,
                ..
            } => {
                if server.trim().is_empty() {
                    return Err(DdnsError::Config(format!("[{}] dyndns2 server is empty", job)));
                }
                (username, domain)
            }
        };

        if username.is_empty() {
            return Err(DdnsError::Config(format!(
                "[{}] {} username is empty",
                job,
                self.name()
            )));
        }
        if domain.is_empty() {
            return Err(DdnsError::Config(format!(
                "[{}] {} domain is empty",
                job,
                self.name()
            )));
        }
        Ok(())
    }
}
