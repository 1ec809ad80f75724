//! Per-job update cycle and daemon loop.

use crate::config::JobConfig;
use crate::error::Result;
use crate::sources::{create_source, AddressSource};
use crate::updaters::{create_updater, UpdateTarget};
use std::time::Duration;
use tracing::Instrument;

/// Shortest sleep between two cycles, in seconds.
pub const MIN_SLEEP_SECS: u64 = 1;

/// Longest sleep between two cycles, in seconds.
pub const MAX_SLEEP_SECS: u64 = u32::MAX as u64;

/// Whether a job runs once or loops forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Daemon,
}

/// Summary of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of addresses handed to the updaters.
    pub addresses: usize,
    /// Number of updaters that reported a change.
    pub changed: usize,
    /// Seconds until the next cycle.
    pub delay_secs: u64,
}

/// One job: a single address source feeding an ordered list of targets.
pub struct JobRunner {
    name: String,
    source: Box<dyn AddressSource>,
    targets: Vec<Box<dyn UpdateTarget>>,
}

impl JobRunner {
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn AddressSource>,
        targets: Vec<Box<dyn UpdateTarget>>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            targets,
        }
    }

    /// Build the runner for a configured job.
    pub fn from_config(config: &JobConfig) -> Self {
        Self::new(
            config.name.clone(),
            create_source(&config.parser),
            config.updaters.iter().map(create_updater).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one discovery + update cycle.
    ///
    /// The first failing step aborts the cycle; later targets are not tried.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let discovery = self.source.discover().await.map_err(|e| {
            tracing::error!(source = self.source.name(), "Address discovery failed: {}", e);
            e
        })?;

        for record in &discovery.records {
            tracing::debug!("Selected {}", record);
        }

        let mut changed = 0;
        for target in self.targets.iter_mut() {
            match target.apply(&discovery.records).await {
                Ok(true) => {
                    changed += 1;
                    tracing::info!(
                        updater = target.name(),
                        domain = %target.domain(),
                        "Updater updated successfully"
                    );
                }
                Ok(false) => {
                    tracing::info!(
                        updater = target.name(),
                        domain = %target.domain(),
                        "Updater executed successfully, addresses unchanged"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        updater = target.name(),
                        domain = %target.domain(),
                        "Updater failed: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(CycleReport {
            addresses: discovery.records.len(),
            changed,
            delay_secs: discovery.delay_secs,
        })
    }

    /// Run the job. In daemon mode this only returns on the first failure.
    pub async fn run(&mut self, mode: RunMode) -> Result<()> {
        let span = tracing::info_span!("job", job = %self.name);
        self.run_inner(mode).instrument(span).await
    }

    async fn run_inner(&mut self, mode: RunMode) -> Result<()> {
        loop {
            let report = self.run_cycle().await?;

            if mode == RunMode::Once {
                return Ok(());
            }

            let sleep_secs = report.delay_secs.clamp(MIN_SLEEP_SECS, MAX_SLEEP_SECS);
            match next_run_at(sleep_secs) {
                Some(at) => tracing::info!(
                    "Sleeping for {} seconds before next update (at {})",
                    sleep_secs,
                    at.format("%Y-%m-%d %H:%M:%S")
                ),
                None => tracing::info!("Sleeping for {} seconds before next update", sleep_secs),
            }
            tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
        }
    }
}

fn next_run_at(sleep_secs: u64) -> Option<chrono::DateTime<chrono::Local>> {
    let delta = chrono::TimeDelta::try_seconds(i64::try_from(sleep_secs).ok()?)?;
    chrono::Local::now().checked_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressFamily, AddressRecord};
    use crate::error::DdnsError;
    use crate::sources::{parse_ip_output, Discovery, IpCommandSource, MockAddressSource};
    use crate::updaters::MockUpdateTarget;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn discovery(delay_secs: u64) -> Discovery {
        Discovery {
            records: vec![
                AddressRecord::new("10.0.0.5", AddressFamily::IPv4, Some(delay_secs)),
                AddressRecord::new("fe80::1", AddressFamily::IPv6, None),
            ],
            delay_secs,
        }
    }

    fn source_returning(delay_secs: u64) -> MockAddressSource {
        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_discover()
            .returning(move || Ok(discovery(delay_secs)));
        source
    }

    fn target(name: &'static str) -> MockUpdateTarget {
        let mut target = MockUpdateTarget::new();
        target.expect_name().return_const(name);
        target.expect_domain().returning(|| "home.example.com".to_string());
        target
    }

    #[tokio::test]
    async fn test_cycle_applies_targets_in_order() {
        let mut seq = Sequence::new();

        let mut first = target("first");
        first
            .expect_apply()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|records| records.len() == 2)
            .returning(|_| Ok(true));

        let mut second = target("second");
        second
            .expect_apply()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));

        let mut runner = JobRunner::new(
            "home",
            Box::new(source_returning(120)),
            vec![Box::new(first), Box::new(second)],
        );

        let report = assert_ok!(runner.run_cycle().await);
        assert_eq!(
            report,
            CycleReport {
                addresses: 2,
                changed: 1,
                delay_secs: 120
            }
        );
    }

    #[tokio::test]
    async fn test_failing_target_stops_cycle() {
        let mut first = target("first");
        first
            .expect_apply()
            .times(1)
            .returning(|_| Err(DdnsError::Transport("connection refused".to_string())));

        let mut second = target("second");
        second.expect_apply().never();

        let mut runner = JobRunner::new(
            "home",
            Box::new(source_returning(120)),
            vec![Box::new(first), Box::new(second)],
        );

        let result = runner.run_cycle().await;
        assert!(matches!(result, Err(DdnsError::Transport(_))));
    }

    #[tokio::test]
    async fn test_discovery_failure_skips_targets() {
        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_discover()
            .times(1)
            .returning(|| Err(DdnsError::Discovery("timed out".to_string())));

        let mut only = target("only");
        only.expect_apply().never();

        let mut runner = JobRunner::new("home", Box::new(source), vec![Box::new(only)]);

        assert_err!(runner.run(RunMode::Daemon).await);
    }

    #[tokio::test]
    async fn test_zero_targets_is_legal() {
        let mut runner = JobRunner::new("bare", Box::new(source_returning(60)), Vec::new());
        let report = assert_ok!(runner.run_cycle().await);
        assert_eq!(report.changed, 0);
    }

    #[tokio::test]
    async fn test_once_runs_single_cycle() {
        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_discover()
            .times(1)
            .returning(|| Ok(discovery(30)));

        let mut runner = JobRunner::new("home", Box::new(source), Vec::new());
        assert_ok!(runner.run(RunMode::Once).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_daemon_sleeps_for_discovered_delay() {
        let cycles = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cycles);

        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source.expect_discover().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(discovery(45))
        });

        let mut runner = JobRunner::new("home", Box::new(source), Vec::new());
        let result =
            tokio::time::timeout(Duration::from_secs(100), runner.run(RunMode::Daemon)).await;

        // Still looping; cycles at t=0, 45 and 90.
        assert!(result.is_err());
        assert_eq!(cycles.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_daemon_stops_on_target_failure() {
        let mut only = target("only");
        let mut seq = Sequence::new();
        only.expect_apply()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        only.expect_apply()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(DdnsError::Auth {
                    provider: "strato".to_string(),
                    message: "badauth".to_string(),
                })
            });

        let mut runner = JobRunner::new("home", Box::new(source_returning(10)), vec![Box::new(only)]);

        let result = runner.run(RunMode::Daemon).await;
        assert!(matches!(result, Err(DdnsError::Auth { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_floored() {
        let cycles = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cycles);

        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source.expect_discover().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(discovery(0))
        });

        let mut runner = JobRunner::new("home", Box::new(source), Vec::new());
        let _ = tokio::time::timeout(Duration::from_millis(2500), runner.run(RunMode::Daemon)).await;

        assert_eq!(cycles.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_lifetime_keeps_daemon_alive() {
        let dump = "    inet 10.0.0.5/24 scope global dynamic eth0\n       valid_lft 10000000000000000sec preferred_lft 10000000000000000sec\n";
        let parsed = IpCommandSource::new("eth0".to_string(), "global".to_string(), 5)
            .select(parse_ip_output(dump))
            .unwrap();
        assert_eq!(parsed.delay_secs, 10_000_000_000_000_000);

        let cycles = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cycles);

        let mut source = MockAddressSource::new();
        source.expect_name().return_const("mock");
        source.expect_discover().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(parsed.clone())
        });

        let mut runner = JobRunner::new("home", Box::new(source), Vec::new());
        let result =
            tokio::time::timeout(Duration::from_secs(60), runner.run(RunMode::Daemon)).await;

        // Sleeping, not panicked or finished.
        assert!(result.is_err());
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_next_run_at_bounds() {
        assert!(next_run_at(60).is_some());
        assert!(next_run_at(MAX_SLEEP_SECS).is_some());
        assert!(next_run_at(u64::MAX).is_none());
    }
}
