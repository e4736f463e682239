//! File-backed job system.
//!
//! Job records live in a JSON registry (`jobs.json` in the data directory) so
//! that the CLI and the daemon see the same registrations. Every mutation
//! takes an exclusive lock on a sibling `.lock` file, reloads the registry,
//! applies the change, and writes it back atomically, so separate processes
//! never overwrite each other's updates.
//!
//! Runs execute on named worker threads. A panic inside the job's work is
//! caught and recorded as a failed run. A started job records the id of the
//! process running it; recovery only touches jobs whose process is gone.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::job::{cancel_periodic, register_periodic};
use super::network::Connectivity;
use super::{
    JobId, JobInfo, JobReport, JobState, JobSystem, JobWork, OneShotRequest, PeriodicRequest,
    SchedulerError,
};
use crate::platform::spawn_named_thread;

/// Finished jobs kept in the registry for `schedule status`.
const MAX_FINISHED_HISTORY: usize = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    #[serde(default)]
    jobs: Vec<JobInfo>,
}

impl Registry {
    fn find_mut(&mut self, id: JobId) -> Option<&mut JobInfo> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    /// Whether any job under `name` still has a worker running.
    fn name_in_flight(&self, name: &str) -> bool {
        self.jobs.iter().any(|job| job.name == name && job.is_in_flight())
    }

    /// Due recurring registrations with no run of the same name in flight,
    /// and one-shot jobs still waiting to start.
    fn is_startable(&self, job: &JobInfo, now: DateTime<Utc>) -> bool {
        if job.is_periodic() {
            job.is_due(now) && !self.name_in_flight(&job.name)
        } else {
            job.state == JobState::Enqueued
        }
    }

    /// Drops the oldest finished jobs beyond the history limit.
    fn prune(&mut self) {
        let mut finished: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|job| job.state.is_finished() && !job.is_in_flight())
            .map(|job| job.id)
            .collect();
        if finished.len() <= MAX_FINISHED_HISTORY {
            return;
        }
        finished.sort_unstable();
        let stale = &finished[..finished.len() - MAX_FINISHED_HISTORY];
        self.jobs.retain(|job| !stale.contains(&job.id));
    }
}

struct Inner {
    registry_path: PathBuf,
    lock_path: PathBuf,
    registry_lock: Mutex<()>,
    work: JobWork,
    workers: Mutex<HashMap<JobId, JoinHandle<()>>>,
    run_one_shots: bool,
}

impl Inner {
    fn load(&self) -> Result<Registry, SchedulerError> {
        match fs::read_to_string(&self.registry_path) {
            Ok(text) if text.trim().is_empty() => Ok(Registry::default()),
            Ok(text) => Ok(serde_json::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %self.registry_path.display(),
                    error = %err,
                    "job registry is unreadable, starting empty"
                );
                Registry::default()
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Registry::default()),
            Err(err) => Err(SchedulerError::Registry(format!(
                "failed to read {}: {err}",
                self.registry_path.display()
            ))),
        }
    }

    fn save(&self, registry: &Registry) -> Result<(), SchedulerError> {
        let json = serde_json::to_vec_pretty(registry)
            .map_err(|err| SchedulerError::Registry(err.to_string()))?;
        write_atomic(&self.registry_path, &json).map_err(|err| {
            SchedulerError::Registry(format!(
                "failed to write {}: {err}",
                self.registry_path.display()
            ))
        })
    }

    /// Opens the lock file and blocks until this process holds it exclusively.
    /// The lock is released when the returned file is dropped.
    fn lock_registry_file(&self) -> Result<File, SchedulerError> {
        let lock_err = |err: std::io::Error| {
            SchedulerError::Registry(format!("failed to lock {}: {err}", self.lock_path.display()))
        };
        if let Some(dir) = self.lock_path.parent() {
            fs::create_dir_all(dir).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(lock_err)?;
        file.lock().map_err(lock_err)?;
        Ok(file)
    }

    /// Read-modify-write of the registry under the in-process and file locks.
    fn update<R>(&self, change: impl FnOnce(&mut Registry) -> R) -> Result<R, SchedulerError> {
        let _guard = self.registry_lock.lock();
        let _file_lock = self.lock_registry_file()?;
        let mut registry = self.load()?;
        let result = change(&mut registry);
        registry.prune();
        self.save(&registry)?;
        Ok(result)
    }

    fn snapshot(&self) -> Result<Registry, SchedulerError> {
        let _guard = self.registry_lock.lock();
        self.load()
    }

    /// Runs the work for a job already marked `Running` and records the result.
    fn execute(&self, id: JobId) {
        tracing::info!(%id, "job started");
        let report = catch_unwind(AssertUnwindSafe(|| (self.work)())).unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(%id, panic = %message, "job panicked");
            JobReport::failure(format!("panicked: {message}"))
        });

        let recorded = self.update(|registry| {
            registry.find_mut(id).map(|job| {
                job.finish(&report);
                job.state
            })
        });
        match recorded {
            Ok(Some(state)) => {
                tracing::info!(%id, %state, summary = %report.summary, "job finished");
            }
            Ok(None) => tracing::warn!(%id, "finished job is no longer in the registry"),
            Err(err) => tracing::error!(%id, error = %err, "failed to record job result"),
        }
    }
}

/// `jobs.json` -> `jobs.json.lock`, next to the registry.
fn lock_path_for(registry_path: &Path) -> PathBuf {
    let mut name =
        registry_path.file_name().map_or_else(|| OsString::from("jobs"), OsString::from);
    name.push(".lock");
    registry_path.with_file_name(name)
}

/// Whether the process that started `job` has exited without recording a result.
///
/// Jobs from registries written before owners were tracked count as orphaned
/// when they are still `Running`.
fn is_orphaned(job: &JobInfo, processes: &mut System) -> bool {
    match job.owner {
        Some(pid) => !process_alive(processes, pid),
        None => job.state == JobState::Running,
    }
}

fn process_alive(processes: &mut System, pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    let pid = Pid::from_u32(pid);
    processes.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    processes.process(pid).is_some()
}

/// Job system persisted to a JSON file, executing runs on worker threads.
#[derive(Clone)]
pub struct LocalJobSystem {
    inner: Arc<Inner>,
}

impl LocalJobSystem {
    /// Job system whose runs execute `work`, with its registry at `registry_path`.
    #[must_use]
    pub fn new(registry_path: impl Into<PathBuf>, work: JobWork) -> Self {
        let registry_path = registry_path.into();
        Self {
            inner: Arc::new(Inner {
                lock_path: lock_path_for(&registry_path),
                registry_path,
                registry_lock: Mutex::new(()),
                work,
                workers: Mutex::new(HashMap::new()),
                run_one_shots: true,
            }),
        }
    }

    /// Job system that only records one-shot jobs; a daemon picks them up later.
    #[must_use]
    pub fn queue_only(registry_path: impl Into<PathBuf>) -> Self {
        let mut system = Self::new(registry_path, Arc::new(|| JobReport::failure("not runnable")));
        if let Some(inner) = Arc::get_mut(&mut system.inner) {
            inner.run_one_shots = false;
        }
        system
    }

    #[must_use]
    pub fn registry_path(&self) -> &Path { &self.inner.registry_path }

    /// Every job in the registry.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Registry` if the registry cannot be read.
    pub fn all_jobs(&self) -> Result<Vec<JobInfo>, SchedulerError> {
        Ok(self.inner.snapshot()?.jobs)
    }

    /// Starts every due recurring job and every pending one-shot job.
    ///
    /// A recurring registration is never started while a run under the same
    /// name is still in flight. Due jobs that require network are skipped
    /// while `network` reports it unavailable. Returns the ids that were started.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the registry cannot be updated.
    pub fn dispatch_due(
        &self,
        now: DateTime<Utc>,
        network: &dyn Connectivity,
    ) -> Result<Vec<JobId>, SchedulerError> {
        self.reap_workers();

        let registry = self.inner.snapshot()?;
        let candidates: Vec<&JobInfo> =
            registry.jobs.iter().filter(|job| registry.is_startable(job, now)).collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let needs_network = candidates
            .iter()
            .any(|job| job.schedule.is_some_and(|s| s.constraints.requires_network));
        let online = !needs_network || network.is_available();
        if !online {
            tracing::info!("network unavailable, deferring jobs that require it");
        }

        let wanted: Vec<JobId> = candidates
            .iter()
            .filter(|job| online || !job.schedule.is_some_and(|s| s.constraints.requires_network))
            .map(|job| job.id)
            .collect();

        let started = self.inner.update(|registry| {
            let mut started = Vec::new();
            for id in &wanted {
                let startable = registry
                    .jobs
                    .iter()
                    .find(|job| job.id == *id)
                    .is_some_and(|job| registry.is_startable(job, now));
                if startable && let Some(job) = registry.find_mut(*id) {
                    job.start(now);
                    started.push(*id);
                }
            }
            started
        })?;

        for id in &started {
            self.spawn_worker(*id)?;
        }
        Ok(started)
    }

    /// Resets jobs left in flight by a process that exited mid-run.
    ///
    /// Recurring registrations become `Enqueued` again; one-shot jobs fail.
    /// Jobs whose owning process is still alive, such as a foreground
    /// `daywall generate`, are left alone.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the registry cannot be updated.
    pub fn recover(&self) -> Result<usize, SchedulerError> {
        let mut processes = System::new();
        self.inner.update(|registry| {
            let mut recovered = 0;
            for job in &mut registry.jobs {
                if is_orphaned(job, &mut processes) {
                    tracing::warn!(
                        id = %job.id,
                        job = %job.name,
                        owner = ?job.owner,
                        "recovering interrupted job"
                    );
                    job.finish(&JobReport::failure("interrupted"));
                    recovered += 1;
                }
            }
            recovered
        })
    }

    /// Blocks until the worker for `id` has finished. Unknown ids return immediately.
    pub fn join(&self, id: JobId) {
        let handle = self.inner.workers.lock().remove(&id);
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            tracing::error!(%id, "worker thread panicked");
        }
    }

    /// Blocks until every worker started by this system has finished.
    pub fn wait_all(&self) {
        let handles: Vec<(JobId, JoinHandle<()>)> = self.inner.workers.lock().drain().collect();
        for (id, handle) in handles {
            if handle.join().is_err() {
                tracing::error!(%id, "worker thread panicked");
            }
        }
    }

    fn reap_workers(&self) { self.inner.workers.lock().retain(|_, handle| !handle.is_finished()); }

    fn spawn_worker(&self, id: JobId) -> Result<(), SchedulerError> {
        let inner = Arc::clone(&self.inner);
        let spawned = spawn_named_thread(&format!("job-{}", id.short()), move || inner.execute(id));

        match spawned {
            Ok(handle) => {
                self.inner.workers.lock().insert(id, handle);
                Ok(())
            }
            Err(err) => {
                let report = JobReport::failure(format!("failed to start: {err}"));
                if let Err(record_err) = self.inner.update(|registry| {
                    if let Some(job) = registry.find_mut(id) {
                        job.finish(&report);
                    }
                }) {
                    tracing::error!(%id, error = %record_err, "failed to record spawn failure");
                }
                Err(SchedulerError::Spawn(err.to_string()))
            }
        }
    }
}

impl JobSystem for LocalJobSystem {
    fn enqueue_unique_periodic(&self, request: PeriodicRequest) -> Result<JobId, SchedulerError> {
        let now = Utc::now();
        let (id, existed) =
            self.inner.update(|registry| register_periodic(&mut registry.jobs, &request, now))?;
        if existed {
            tracing::debug!(job = %request.name, %id, "updated existing registration");
        }
        Ok(id)
    }

    fn cancel_unique(&self, name: &str) -> Result<(), SchedulerError> {
        let cancelled = self.inner.update(|registry| cancel_periodic(&mut registry.jobs, name))?;
        tracing::debug!(job = name, cancelled, "cancel requested");
        Ok(())
    }

    fn job_infos(&self, name: &str) -> Result<Vec<JobInfo>, SchedulerError> {
        Ok(self.inner.snapshot()?.jobs.into_iter().filter(|job| job.name == name).collect())
    }

    fn enqueue(&self, request: OneShotRequest) -> Result<JobId, SchedulerError> {
        let now = Utc::now();
        let mut job = JobInfo::one_shot(&request, now);
        let id = job.id;
        let run_now = self.inner.run_one_shots;
        if run_now {
            job.start(now);
        }
        self.inner.update(|registry| registry.jobs.push(job))?;

        if run_now {
            self.spawn_worker(id)?;
        }
        Ok(id)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
