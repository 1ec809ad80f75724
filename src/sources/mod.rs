//! Address sources.

mod ip_command;

pub use ip_command::{parse_ip_output, recommended_delay, IpCommandSource, DEFAULT_DELAY_SECS};

use crate::address::AddressRecord;
use crate::config::ParserConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Outcome of one discovery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Selected records, in discovery order.
    pub records: Vec<AddressRecord>,
    /// Seconds until the next cycle should run.
    pub delay_secs: u64,
}

/// Trait for address sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &'static str;

    /// Enumerate and select the current addresses.
    async fn discover(&self) -> Result<Discovery>;
}

/// Create an address source from configuration.
pub fn create_source(config: &ParserConfig) -> Box<dyn AddressSource> {
    match config {
        ParserConfig::IpCommand {
            interface,
            scope,
            command_timeout,
            fetch_ipv4,
            fetch_ipv6,
            ipv4_index,
            ipv6_index,
        } => Box::new(
            IpCommandSource::new(interface.clone(), scope.clone(), *command_timeout)
                .with_ipv4(*fetch_ipv4, *ipv4_index)
                .with_ipv6(*fetch_ipv6, *ipv6_index),
        ),
    }
}
