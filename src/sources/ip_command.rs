//! Address source backed by `ip addr show`.

use super::{AddressSource, Discovery};
use crate::address::{AddressFamily, AddressRecord};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;

/// Delay used when no selected address carries a finite lifetime (one day).
pub const DEFAULT_DELAY_SECS: u64 = 24 * 60 * 60;

const DEFAULT_PROGRAM: &str = "ip";

/// Per-family selection policy.
#[derive(Debug, Clone, Copy)]
struct FamilyPolicy {
    fetch: bool,
    index: Option<usize>,
}

impl Default for FamilyPolicy {
    fn default() -> Self {
        Self {
            fetch: true,
            index: None,
        }
    }
}

/// Reads addresses of one interface from the `ip` command.
pub struct IpCommandSource {
    program: String,
    interface: String,
    scope: String,
    timeout: Duration,
    ipv4: FamilyPolicy,
    ipv6: FamilyPolicy,
}

impl IpCommandSource {
    /// Create a source fetching every address of both families.
    pub fn new(interface: String, scope: String, timeout_secs: u64) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            interface,
            scope,
            timeout: Duration::from_secs(timeout_secs),
            ipv4: FamilyPolicy::default(),
            ipv6: FamilyPolicy::default(),
        }
    }

    /// Configure IPv4 fetching and optional index selection.
    pub fn with_ipv4(mut self, fetch: bool, index: Option<usize>) -> Self {
        self.ipv4 = FamilyPolicy { fetch, index };
        self
    }

    /// Configure IPv6 fetching and optional index selection.
    pub fn with_ipv6(mut self, fetch: bool, index: Option<usize>) -> Self {
        self.ipv6 = FamilyPolicy { fetch, index };
        self
    }

    /// Use a different executable than `ip` (for testing).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run the listing command and return its stdout.
    async fn list_addresses(&self) -> Result<String> {
        let child = Command::new(&self.program)
            .args(["addr", "show", "dev", &self.interface, "scope", &self.scope])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                DdnsError::Discovery(format!(
                    "'{} addr show dev {}' timed out after {}s",
                    self.program,
                    self.interface,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DdnsError::Discovery(format!("failed to run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            return Err(DdnsError::Discovery(format!(
                "'{} addr show dev {}' exited with {}: {}",
                self.program,
                self.interface,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| DdnsError::DiscoveryParse(format!("output is not UTF-8: {}", e)))
    }

    /// Apply the per-family policy to parsed records and compute the delay.
    ///
    /// IPv4 selections come first, then IPv6, each in listing order.
    pub fn select(&self, all: Vec<AddressRecord>) -> Result<Discovery> {
        let (ipv4, ipv6): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|record| record.family() == AddressFamily::IPv4);

        let mut records = select_family(AddressFamily::IPv4, ipv4, self.ipv4)?;
        records.extend(select_family(AddressFamily::IPv6, ipv6, self.ipv6)?);

        let delay_secs = recommended_delay(&records);
        Ok(Discovery {
            records,
            delay_secs,
        })
    }
}

fn select_family(
    family: AddressFamily,
    mut records: Vec<AddressRecord>,
    policy: FamilyPolicy,
) -> Result<Vec<AddressRecord>> {
    if !policy.fetch {
        return Ok(Vec::new());
    }

    match policy.index {
        None => Ok(records),
        Some(index) if index < records.len() => Ok(vec![records.swap_remove(index)]),
        Some(index) => Err(DdnsError::Selection {
            family,
            index,
            available: records.len(),
        }),
    }
}

/// Shortest finite lifetime among `records`, or [`DEFAULT_DELAY_SECS`].
pub fn recommended_delay(records: &[AddressRecord]) -> u64 {
    records
        .iter()
        .filter_map(AddressRecord::valid_lifetime)
        .min()
        .unwrap_or(DEFAULT_DELAY_SECS)
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?m)^\s+(?P<family>inet6?) (?P<address>[0-9a-fA-F.:]+)/\d+.*\n\s+valid_lft (?P<lft>\w+)",
        )
        .expect("address pattern is valid")
    })
}

/// Parse `ip addr show` output into records, in listing order.
///
/// Every `inet`/`inet6` line must be followed by its `valid_lft` line; a
/// lifetime of `forever` (or anything non-numeric) is indefinite.
pub fn parse_ip_output(output: &str) -> Vec<AddressRecord> {
    address_pattern()
        .captures_iter(output)
        .filter_map(|caps| {
            let family = AddressFamily::from_keyword(&caps["family"])?;
            let lifetime = caps["lft"].trim_end_matches("sec").parse::<u64>().ok();
            Some(AddressRecord::new(&caps["address"], family, lifetime))
        })
        .collect()
}

#[async_trait]
impl AddressSource for IpCommandSource {
    fn name(&self) -> &'static str {
        "ip_command"
    }

    async fn discover(&self) -> Result<Discovery> {
        let output = self.list_addresses().await?;
        let all = parse_ip_output(&output);
        tracing::debug!(
            interface = %self.interface,
            found = all.len(),
            "Parsed address listing"
        );
        self.select(all)
    }
}
