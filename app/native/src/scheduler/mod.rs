//! Job scheduling.
//!
//! [`JobScheduler`] owns the "is the daily job registered" question and
//! delegates timers, queues, and execution to an injected [`JobSystem`]:
//!
//! - [`memory::InMemoryJobSystem`] - bookkeeping only, for tests
//! - [`local::LocalJobSystem`] - file-backed registry with worker threads,
//!   driven by [`daemon::run`]

pub mod daemon;
pub mod job;
pub mod local;
pub mod memory;
pub mod network;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use job::{
    Constraints, JobId, JobInfo, JobReport, JobState, OneShotRequest, PeriodicRequest,
    PeriodicSchedule,
};
pub use local::LocalJobSystem;
pub use memory::InMemoryJobSystem;
pub use network::{Connectivity, TcpConnectivity};

use crate::config::ScheduleConfig;
use crate::constants::ONE_SHOT_JOB_NAME;

/// Work executed for every job run.
pub type JobWork = Arc<dyn Fn() -> JobReport + Send + Sync>;

/// Errors raised by a job system.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The persisted registry could not be read or written.
    #[error("job registry error: {0}")]
    Registry(String),
    /// A worker thread or runtime could not be started.
    #[error("failed to start worker: {0}")]
    Spawn(String),
    /// No job with this id is known.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
}

/// Host job queue: unique periodic registrations plus one-shot jobs.
pub trait JobSystem: Send + Sync {
    /// Registers a recurring job, or updates the live registration with the same name.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the registration cannot be recorded.
    fn enqueue_unique_periodic(&self, request: PeriodicRequest) -> Result<JobId, SchedulerError>;

    /// Cancels the recurring registration with this name. In-flight runs are not interrupted.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the cancellation cannot be recorded.
    fn cancel_unique(&self, name: &str) -> Result<(), SchedulerError>;

    /// Every known job recorded under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the registry cannot be read.
    fn job_infos(&self, name: &str) -> Result<Vec<JobInfo>, SchedulerError>;

    /// Enqueues a one-shot job and returns without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the job cannot be recorded or started.
    fn enqueue(&self, request: OneShotRequest) -> Result<JobId, SchedulerError>;
}

/// Registers, cancels, and queries the recurring generation job.
#[derive(Clone)]
pub struct JobScheduler {
    system: Arc<dyn JobSystem>,
    interval: Duration,
    constraints: Constraints,
}

impl JobScheduler {
    /// Scheduler with a daily interval that requires network.
    #[must_use]
    pub fn new(system: Arc<dyn JobSystem>) -> Self {
        Self {
            system,
            interval: Duration::from_secs(24 * 3600),
            constraints: Constraints { requires_network: true },
        }
    }

    #[must_use]
    pub fn from_config(system: Arc<dyn JobSystem>, config: &ScheduleConfig) -> Self {
        Self::new(system).with_interval(config.interval()).with_constraints(Constraints {
            requires_network: config.require_network,
        })
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Registers the recurring job.
    ///
    /// Calling it again updates the live registration's interval and
    /// constraints without restarting its period or a run in flight.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` from the job system.
    pub fn schedule_daily(&self, job_name: &str) -> Result<JobId, SchedulerError> {
        let id = self.system.enqueue_unique_periodic(PeriodicRequest {
            name: job_name.to_string(),
            interval: self.interval,
            constraints: self.constraints,
        })?;
        tracing::info!(
            job = job_name,
            %id,
            interval_secs = self.interval.as_secs(),
            "scheduled recurring job"
        );
        Ok(id)
    }

    /// Removes the recurring registration.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` from the job system.
    pub fn cancel(&self, job_name: &str) -> Result<(), SchedulerError> {
        self.system.cancel_unique(job_name)?;
        tracing::info!(job = job_name, "cancelled recurring job");
        Ok(())
    }

    /// Whether at least one non-finished job exists under `job_name`.
    ///
    /// Registry errors are logged and reported as not scheduled.
    #[must_use]
    pub fn is_scheduled(&self, job_name: &str) -> bool {
        match self.system.job_infos(job_name) {
            Ok(infos) => infos.iter().any(|info| !info.state.is_finished()),
            Err(err) => {
                tracing::warn!(error = %err, job = job_name, "failed to query job state");
                false
            }
        }
    }

    /// The active registration under `job_name`, if any.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the registry cannot be read.
    pub fn active_registration(&self, job_name: &str) -> Result<Option<JobInfo>, SchedulerError> {
        Ok(self
            .system
            .job_infos(job_name)?
            .into_iter()
            .find(|info| info.is_periodic() && !info.state.is_finished()))
    }

    /// Enqueues an independent single run. Schedule state is untouched.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` from the job system.
    pub fn run_once(&self) -> Result<JobId, SchedulerError> {
        let id = self.system.enqueue(OneShotRequest { name: ONE_SHOT_JOB_NAME.to_string() })?;
        tracing::info!(%id, "enqueued one-shot generation");
        Ok(id)
    }
}
