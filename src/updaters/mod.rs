//! DDNS update targets.

mod dyndns;


pub use dyndns::{DynDnsUpdater, STRATO_SERVER};

use crate::address::AddressRecord;
use crate::config::UpdaterConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for DDNS update targets.
///
/// Targets own their change-detection state, hence `&mut self`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateTarget: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Get the domain being managed.
    fn domain(&self) -> String;

    /// Push `records` to the provider. Returns whether the provider state changed.
    async fn apply(&mut self, records: &[AddressRecord]) -> Result<bool>;
}

/// Create an update target from configuration.
pub fn create_updater(config: &UpdaterConfig) -> Box<dyn UpdateTarget> {
    match config {
        UpdaterConfig::Strato {
            username,
            password,
            domain,
        } => Box::new(DynDnsUpdater::strato(
            resolve_env(username),
            resolve_env(password),
            domain.clone(),
        )),
        UpdaterConfig::DynDns2 {
            server,
            username,
            password,
            domain,
        } => Box::new(DynDnsUpdater::new(
            "dyndns2",
            server,
            resolve_env(username),
            resolve_env(password),
            domain.clone(),
        )),
    }
}

/// Credentials written as `$NAME` are read from the environment.
///
/// An unset variable leaves the literal in place so the provider rejects it
/// with `badauth` rather than the daemon refusing to start.
fn resolve_env(value: &str) -> String {
    let Some(var_name) = value.strip_prefix('$') else {
        return value.to_string();
    };

    match std::env::var(var_name) {
        Ok(resolved) => resolved,
        Err(_) => {
            tracing::warn!(variable = var_name, "Credential variable is not set, using it verbatim");
            value.to_string()
        }
    }
}
