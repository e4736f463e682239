//! In-memory job system. Records registrations and one-shot jobs without
//! running anything; tests drive state transitions explicitly.

use chrono::Utc;
use parking_lot::Mutex;

use super::job::{cancel_periodic, register_periodic};
use super::{
    JobId, JobInfo, JobReport, JobSystem, OneShotRequest, PeriodicRequest, SchedulerError,
};

#[derive(Debug, Default)]
pub struct InMemoryJobSystem {
    jobs: Mutex<Vec<JobInfo>>,
}

impl InMemoryJobSystem {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// All recorded jobs, in insertion order.
    #[must_use]
    pub fn all_jobs(&self) -> Vec<JobInfo> { self.jobs.lock().clone() }

    /// Moves a job to `Running`, as a real system would when dispatching it.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::UnknownJob` if no job has this id.
    pub fn start(&self, id: JobId) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.iter_mut().find(|j| j.id == id).ok_or(SchedulerError::UnknownJob(id))?;
        job.start(Utc::now());
        Ok(())
    }

    /// Records the end of a run.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::UnknownJob` if no job has this id.
    pub fn complete(&self, id: JobId, report: &JobReport) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.iter_mut().find(|j| j.id == id).ok_or(SchedulerError::UnknownJob(id))?;
        job.finish(report);
        Ok(())
    }
}

impl JobSystem for InMemoryJobSystem {
    fn enqueue_unique_periodic(&self, request: PeriodicRequest) -> Result<JobId, SchedulerError> {
        let (id, _) = register_periodic(&mut self.jobs.lock(), &request, Utc::now());
        Ok(id)
    }

    fn cancel_unique(&self, name: &str) -> Result<(), SchedulerError> {
        cancel_periodic(&mut self.jobs.lock(), name);
        Ok(())
    }

    fn job_infos(&self, name: &str) -> Result<Vec<JobInfo>, SchedulerError> {
        Ok(self.jobs.lock().iter().filter(|j| j.name == name).cloned().collect())
    }

    fn enqueue(&self, request: OneShotRequest) -> Result<JobId, SchedulerError> {
        let job = JobInfo::one_shot(&request, Utc::now());
        let id = job.id;
        self.jobs.lock().push(job);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Constraints, JobState};

    fn request(name: &str) -> PeriodicRequest {
        PeriodicRequest {
            name: name.to_string(),
            interval: std::time::Duration::from_secs(60),
            constraints: Constraints::default(),
        }
    }

    #[test]
    fn test_replace_keeps_running_registration() {
        let system = InMemoryJobSystem::new();
        let first = system.enqueue_unique_periodic(request("daily")).unwrap();
        system.start(first).unwrap();

        let second = system.enqueue_unique_periodic(request("daily")).unwrap();

        assert_eq!(first, second);
        let jobs = system.all_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].state, JobState::Running);
    }

    #[test]
    fn test_other_names_are_untouched() {
        let system = InMemoryJobSystem::new();
        system.enqueue_unique_periodic(request("a")).unwrap();
        system.enqueue_unique_periodic(request("b")).unwrap();
        system.cancel_unique("a").unwrap();

        let b = system.job_infos("b").unwrap();
        assert_eq!(b[0].state, JobState::Enqueued);
    }

    #[test]
    fn test_completion_after_cancel_does_not_resurrect() {
        let system = InMemoryJobSystem::new();
        let id = system.enqueue_unique_periodic(request("daily")).unwrap();
        system.start(id).unwrap();
        system.cancel_unique("daily").unwrap();

        system.complete(id, &JobReport::success("delivered")).unwrap();

        let infos = system.job_infos("daily").unwrap();
        assert!(infos.iter().all(|j| j.state.is_finished()));
    }

    #[test]
    fn test_one_shot_lifecycle() {
        let system = InMemoryJobSystem::new();
        let id = system.enqueue(OneShotRequest { name: "once".to_string() }).unwrap();
        system.start(id).unwrap();
        system.complete(id, &JobReport::failure("apply failed")).unwrap();

        let job = &system.job_infos("once").unwrap()[0];
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.last_outcome.as_deref(), Some("apply failed"));
    }

    #[test]
    fn test_unknown_job() {
        let system = InMemoryJobSystem::new();
        assert!(matches!(system.start(JobId::new()), Err(SchedulerError::UnknownJob(_))));
    }
}
