//! # lease-ddns
//!
//! Dynamic DNS updater that reads addresses straight from a network
//! interface and re-checks them before their lease runs out.
//!
//! ## Features
//!
//! - Address discovery from `ip addr show`, IPv4 and IPv6
//! - Per-family selection (skip a family, or pick the n-th address)
//! - Poll interval follows the shortest address lifetime
//! - dyndns2 providers (Strato and any `/nic/update` compatible host)
//! - Several independent jobs, each in its own failure domain
//!
//! ## Usage
//!
//! ```bash
//! # Update once and exit
//! lease-ddns --config /etc/lease-ddns/config.toml
//!
//! # Keep running
//! lease-ddns --config /etc/lease-ddns/config.toml --daemon
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod job;
pub mod scheduler;
pub mod sources;
pub mod updaters;

pub use address::{AddressFamily, AddressRecord};
pub use config::Config;
pub use error::{DdnsError, Result};
pub use job::{JobRunner, RunMode};
pub use scheduler::Scheduler;
