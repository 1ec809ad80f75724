//! dyndns2 (`/nic/update`) providers, Strato included.

use super::UpdateTarget;
use crate::address::AddressRecord;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Update host used by Strato.
pub const STRATO_SERVER: &str = "dyndns.strato.com";

/// Provider speaking the dyndns2 update protocol.
///
/// All selected addresses, both families, go out in a single request.
pub struct DynDnsUpdater {
    provider: &'static str,
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    domain: String,
    last_known: BTreeSet<String>,
}

/// How the provider answered an update request.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Good,
    NoChange,
    Rejected,
    Unknown,
}

impl Answer {
    fn classify(body: &str) -> Self {
        if body.starts_with("good") {
            Answer::Good
        } else if body.starts_with("nochg") {
            Answer::NoChange
        } else if body.starts_with("badauth") || body.starts_with("nohost") {
            Answer::Rejected
        } else {
            Answer::Unknown
        }
    }
}

impl DynDnsUpdater {
    /// Create a dyndns2 provider talking to `https://<server>`.
    pub fn new(
        provider: &'static str,
        server: &str,
        username: String,
        password: String,
        domain: String,
    ) -> Self {
        Self::with_base_url(
            provider,
            username,
            password,
            domain,
            format!("https://{}", server),
        )
    }

    /// Create a Strato provider.
    pub fn strato(username: String, password: String, domain: String) -> Self {
        Self::new("strato", STRATO_SERVER, username, password, domain)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        provider: &'static str,
        username: String,
        password: String,
        domain: String,
        base_url: String,
    ) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            base_url,
            username,
            password,
            domain,
            last_known: BTreeSet::new(),
        }
    }

    /// Addresses last accepted (or attempted) by the provider.
    pub fn last_known(&self) -> &BTreeSet<String> {
        &self.last_known
    }

    async fn send(&self, myip: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/nic/update", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("hostname", self.domain.as_str()), ("myip", myip)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(provider = self.provider, %status, "Update endpoint returned error status");
        }

        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl UpdateTarget for DynDnsUpdater {
    fn name(&self) -> &'static str {
        self.provider
    }

    fn domain(&self) -> String {
        self.domain.clone()
    }

    async fn apply(&mut self, records: &[AddressRecord]) -> Result<bool> {
        let addresses: BTreeSet<String> = records
            .iter()
            .map(|record| record.address().to_string())
            .collect();

        if addresses == self.last_known {
            tracing::debug!(
                provider = self.provider,
                domain = %self.domain,
                "No address change detected, skipping update"
            );
            return Ok(false);
        }

        let myip = addresses.iter().cloned().collect::<Vec<_>>().join(",");
        tracing::info!(
            provider = self.provider,
            domain = %self.domain,
            addresses = %myip,
            "Sending update"
        );

        let body = self.send(&myip).await.map_err(|e| {
            tracing::error!(provider = self.provider, domain = %self.domain, "Update request failed: {}", e);
            e
        })?;

        // Cached even for rejected payloads so an identical set is not resent.
        self.last_known = addresses;

        match Answer::classify(&body) {
            Answer::Good => {
                tracing::info!(provider = self.provider, domain = %self.domain, "Addresses updated");
                Ok(true)
            }
            Answer::NoChange => {
                tracing::info!(provider = self.provider, domain = %self.domain, "Addresses already up to date");
                Ok(false)
            }
            Answer::Rejected => {
                tracing::error!(
                    provider = self.provider,
                    domain = %self.domain,
                    response = %body,
                    "Authentication failed or domain does not exist"
                );
                Err(DdnsError::Auth {
                    provider: self.provider.to_string(),
                    message: format!("authentication failed or domain does not exist ({})", body),
                })
            }
            Answer::Unknown => {
                tracing::error!(provider = self.provider, domain = %self.domain, response = %body, "Unexpected response");
                Err(DdnsError::Protocol {
                    provider: self.provider.to_string(),
                    body,
                })
            }
        }
    }
}
