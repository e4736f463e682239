//! Job records shared by every job system implementation.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique job identifier (UUID v7, so ids sort by creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    #[must_use]
    pub fn new() -> Self { Self(Uuid::now_v7()) }

    /// First eight hex digits, for thread names and terse output.
    #[must_use]
    pub fn short(&self) -> String { self.0.simple().to_string()[..8].to_string() }
}

impl Default for JobId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Enqueued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    /// Terminal states never transition again.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Conditions that must hold before a periodic job is dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub requires_network: bool,
}

/// Recurrence of a periodic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicSchedule {
    pub interval_secs: u64,
    pub constraints: Constraints,
}

impl PeriodicSchedule {
    #[must_use]
    pub const fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }
}

/// Request to register (or replace) a named recurring job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicRequest {
    pub name: String,
    pub interval: Duration,
    pub constraints: Constraints,
}

/// Request to run a job once, as soon as possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneShotRequest {
    pub name: String,
}

/// How a finished run went, as reported by the job's work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub succeeded: bool,
    pub summary: String,
}

impl JobReport {
    #[must_use]
    pub fn success(summary: impl Into<String>) -> Self {
        Self { succeeded: true, summary: summary.into() }
    }

    #[must_use]
    pub fn failure(summary: impl Into<String>) -> Self {
        Self { succeeded: false, summary: summary.into() }
    }
}

/// Snapshot of a job known to a job system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: JobId,
    pub name: String,
    pub state: JobState,
    /// Present for recurring registrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<PeriodicSchedule>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_outcome: Option<String>,
    #[serde(default)]
    pub run_count: u32,
    /// Process id of the worker currently executing a run of this job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<u32>,
}

impl JobInfo {
    /// A fresh recurring registration.
    #[must_use]
    pub fn periodic(request: &PeriodicRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            name: request.name.clone(),
            state: JobState::Enqueued,
            schedule: Some(PeriodicSchedule {
                interval_secs: request.interval.as_secs(),
                constraints: request.constraints,
            }),
            created_at: now,
            last_run: None,
            last_outcome: None,
            run_count: 0,
            owner: None,
        }
    }

    /// A fresh single-shot job.
    #[must_use]
    pub fn one_shot(request: &OneShotRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            name: request.name.clone(),
            state: JobState::Enqueued,
            schedule: None,
            created_at: now,
            last_run: None,
            last_outcome: None,
            run_count: 0,
            owner: None,
        }
    }

    #[must_use]
    pub const fn is_periodic(&self) -> bool { self.schedule.is_some() }

    /// Whether a worker is still executing a run, even one whose job was cancelled.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool { self.owner.is_some() }

    /// Whether a recurring registration should run at `now`.
    ///
    /// Only idle registrations are due: one that has never run, or whose last
    /// run started at least one interval ago.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let Some(schedule) = self.schedule else {
            return false;
        };
        if self.state != JobState::Enqueued {
            return false;
        }
        self.last_run.is_none_or(|last| {
            let elapsed = now.signed_duration_since(last);
            elapsed.to_std().is_ok_and(|elapsed| elapsed >= schedule.interval())
        })
    }

    /// Marks the job as started at `now` by the current process.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.state = JobState::Running;
        self.last_run = Some(now);
        self.run_count += 1;
        self.owner = Some(std::process::id());
    }

    /// Records a finished run.
    ///
    /// Recurring registrations go back to `Enqueued`; single-shot jobs become
    /// `Succeeded` or `Failed`. A job that is no longer `Running` (for example
    /// cancelled while the run was in flight) keeps its state.
    pub fn finish(&mut self, report: &JobReport) {
        self.last_outcome = Some(report.summary.clone());
        self.owner = None;
        if self.state != JobState::Running {
            return;
        }
        self.state = match (self.is_periodic(), report.succeeded) {
            (true, _) => JobState::Enqueued,
            (false, true) => JobState::Succeeded,
            (false, false) => JobState::Failed,
        };
    }
}

/// Registers a recurring job in `jobs`, keeping at most one live registration per name.
///
/// A live registration is updated in place: it keeps its id, state, and last
/// run, so a run in flight continues and the next run stays one interval after
/// the last. Extra live registrations under the name are cancelled. Returns
/// the id of the live registration and whether one already existed.
pub fn register_periodic(
    jobs: &mut Vec<JobInfo>,
    request: &PeriodicRequest,
    now: DateTime<Utc>,
) -> (JobId, bool) {
    let schedule = PeriodicSchedule {
        interval_secs: request.interval.as_secs(),
        constraints: request.constraints,
    };
    let mut kept: Option<JobId> = None;
    for job in jobs.iter_mut() {
        if job.name != request.name || !job.is_periodic() || job.state.is_finished() {
            continue;
        }
        if kept.is_none() {
            job.schedule = Some(schedule);
            kept = Some(job.id);
        } else {
            job.state = JobState::Cancelled;
        }
    }

    match kept {
        Some(id) => (id, true),
        None => {
            let job = JobInfo::periodic(request, now);
            let id = job.id;
            jobs.push(job);
            (id, false)
        }
    }
}

/// Cancels every live recurring registration under `name`. In-flight runs keep going.
pub fn cancel_periodic(jobs: &mut [JobInfo], name: &str) -> usize {
    let mut cancelled = 0;
    for job in jobs.iter_mut() {
        if job.name == name && job.is_periodic() && !job.state.is_finished() {
            job.state = JobState::Cancelled;
            cancelled += 1;
        }
    }
    cancelled
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn daily() -> PeriodicRequest {
        PeriodicRequest {
            name: "daily".to_string(),
            interval: Duration::from_secs(24 * 3600),
            constraints: Constraints { requires_network: true },
        }
    }

    #[test]
    fn test_finished_states() {
        assert!(!JobState::Enqueued.is_finished());
        assert!(!JobState::Running.is_finished());
        assert!(JobState::Succeeded.is_finished());
        assert!(JobState::Failed.is_finished());
        assert!(JobState::Cancelled.is_finished());
    }

    #[test]
    fn test_job_ids_are_unique() {
        let first = JobId::new();
        let second = JobId::new();
        assert_ne!(first, second);
        assert_eq!(first.short().len(), 8);
        assert!(first.to_string().starts_with(&first.short()));
    }

    #[test]
    fn test_new_registration_is_due() {
        let now = Utc::now();
        let job = JobInfo::periodic(&daily(), now);
        assert!(job.is_due(now));
    }

    #[test]
    fn test_due_after_interval_elapsed() {
        let now = Utc::now();
        let mut job = JobInfo::periodic(&daily(), now);
        job.start(now);
        job.finish(&JobReport::success("delivered"));

        assert!(!job.is_due(now + TimeDelta::hours(23)));
        assert!(job.is_due(now + TimeDelta::hours(24)));
    }

    #[test]
    fn test_running_registration_is_never_due() {
        let now = Utc::now();
        let mut job = JobInfo::periodic(&daily(), now);
        job.start(now);
        assert!(!job.is_due(now + TimeDelta::days(3)));
    }

    #[test]
    fn test_one_shot_is_never_due() {
        let job = JobInfo::one_shot(&OneShotRequest { name: "once".to_string() }, Utc::now());
        assert!(!job.is_due(Utc::now()));
    }

    #[test]
    fn test_periodic_finish_returns_to_enqueued() {
        let now = Utc::now();
        let mut job = JobInfo::periodic(&daily(), now);
        job.start(now);
        job.finish(&JobReport::failure("disk full"));

        assert_eq!(job.state, JobState::Enqueued);
        assert_eq!(job.last_outcome.as_deref(), Some("disk full"));
        assert_eq!(job.run_count, 1);
    }

    #[test]
    fn test_one_shot_finish_is_terminal() {
        let mut ok = JobInfo::one_shot(&OneShotRequest { name: "once".to_string() }, Utc::now());
        ok.start(Utc::now());
        ok.finish(&JobReport::success("fallback"));
        assert_eq!(ok.state, JobState::Succeeded);

        let request = OneShotRequest { name: "once".to_string() };
        let mut failed = JobInfo::one_shot(&request, Utc::now());
        failed.start(Utc::now());
        failed.finish(&JobReport::failure("apply failed"));
        assert_eq!(failed.state, JobState::Failed);
    }

    #[test]
    fn test_finish_does_not_resurrect_cancelled() {
        let now = Utc::now();
        let mut job = JobInfo::periodic(&daily(), now);
        job.start(now);
        job.state = JobState::Cancelled;

        job.finish(&JobReport::success("delivered"));

        assert_eq!(job.state, JobState::Cancelled);
    }

    #[test]
    fn test_start_and_finish_track_owner() {
        let now = Utc::now();
        let mut job = JobInfo::periodic(&daily(), now);
        job.start(now);
        assert_eq!(job.owner, Some(std::process::id()));
        assert!(job.is_in_flight());

        job.state = JobState::Cancelled;
        job.finish(&JobReport::success("delivered"));
        assert!(!job.is_in_flight());
    }

    #[test]
    fn test_register_twice_updates_in_place() {
        let now = Utc::now();
        let mut jobs = Vec::new();
        let (first, existed) = register_periodic(&mut jobs, &daily(), now);
        assert!(!existed);
        jobs[0].start(now);
        jobs[0].finish(&JobReport::success("delivered"));

        let hourly = PeriodicRequest { interval: Duration::from_secs(3600), ..daily() };
        let (second, existed) = register_periodic(&mut jobs, &hourly, now);

        assert!(existed);
        assert_eq!(first, second);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].last_run, Some(now));
        assert_eq!(jobs[0].schedule.unwrap().interval_secs, 3600);
        assert!(!jobs[0].is_due(now + TimeDelta::minutes(30)));
    }

    #[test]
    fn test_register_while_running_keeps_the_run() {
        let now = Utc::now();
        let mut jobs = Vec::new();
        register_periodic(&mut jobs, &daily(), now);
        jobs[0].start(now);

        register_periodic(&mut jobs, &daily(), now);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].state, JobState::Running);
    }

    #[test]
    fn test_register_after_cancel_creates_new_registration() {
        let now = Utc::now();
        let mut jobs = Vec::new();
        let (first, _) = register_periodic(&mut jobs, &daily(), now);
        assert_eq!(cancel_periodic(&mut jobs, "daily"), 1);

        let (second, existed) = register_periodic(&mut jobs, &daily(), now);

        assert!(!existed);
        assert_ne!(first, second);
        assert_eq!(jobs.iter().filter(|j| !j.state.is_finished()).count(), 1);
    }

    #[test]
    fn test_job_info_serializes_camel_case() {
        let job = JobInfo::periodic(&daily(), Utc::now());
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["state"], "enqueued");
        assert_eq!(json["schedule"]["intervalSecs"], 86_400);
        assert_eq!(json["schedule"]["constraints"]["requiresNetwork"], true);
        assert!(json.get("runCount").is_some());
    }
}
