//! Top-level job scheduling.

use crate::config::Config;
use crate::error::{DdnsError, Result};
use crate::job::{JobRunner, RunMode};

/// Runs every configured job with isolated failure domains.
pub struct Scheduler {
    jobs: Vec<JobRunner>,
}

impl Scheduler {
    pub fn new(jobs: Vec<JobRunner>) -> Self {
        Self { jobs }
    }

    /// Build a runner for each configured job.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jobs.iter().map(JobRunner::from_config).collect())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run all jobs and wait for them.
    ///
    /// A single job runs on the calling task. Several jobs each get their own
    /// task; a failing or panicking job never stops its siblings.
    pub async fn run(self, mode: RunMode) -> Result<()> {
        let total = self.jobs.len();

        match total {
            0 => {
                tracing::error!("No jobs found in the configuration");
                Err(DdnsError::Config("no jobs configured".to_string()))
            }
            1 => {
                // The cycle already logged the failure; hand the cause to the caller.
                let mut jobs = self.jobs;
                let mut job = jobs.remove(0);
                job.run(mode).await
            }
            _ => {
                tracing::info!("Starting {} jobs", total);

                let handles: Vec<_> = self
                    .jobs
                    .into_iter()
                    .map(|mut job| {
                        let name = job.name().to_string();
                        let handle = tokio::spawn(async move { job.run(mode).await });
                        (name, handle)
                    })
                    .collect();

                let mut failed = 0;
                for (name, handle) in handles {
                    match handle.await {
                        Ok(Ok(())) => tracing::debug!(job = %name, "Job finished"),
                        Ok(Err(e)) => {
                            failed += 1;
                            tracing::debug!(job = %name, "Job terminated: {}", e);
                        }
                        Err(e) => {
                            failed += 1;
                            tracing::error!(job = %name, "Job task aborted: {}", e);
                        }
                    }
                }

                if failed > 0 {
                    Err(DdnsError::JobsFailed { failed, total })
                } else {
                    Ok(())
                }
            }
        }
    }
}
