//! Generate CLI command.
//!
//! Runs one generation through the job system, in the foreground or queued
//! for the daemon.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;

use crate::cli::output::{self, field};
use crate::config::{self, DaywallConfig};
use crate::constants::{ONE_SHOT_JOB_NAME, REGISTRY_FILE_NAME};
use crate::error::DaywallError;
use crate::pipeline::GenerationPipeline;
use crate::platform::data_dir;
use crate::scheduler::{JobInfo, JobReport, JobScheduler, JobState, JobSystem, LocalJobSystem};

/// Arguments for `daywall generate`.
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Queue the run for the daemon and return immediately.
    #[arg(long, short)]
    pub detach: bool,
}

/// Location of the shared job registry.
pub(super) fn registry_path() -> PathBuf { data_dir().join(REGISTRY_FILE_NAME) }

/// Job system whose runs execute the configured generation pipeline.
pub(super) fn pipeline_job_system(
    config: &DaywallConfig,
    config_dir: &Path,
) -> Result<(LocalJobSystem, Arc<GenerationPipeline>), DaywallError> {
    let pipeline = Arc::new(
        GenerationPipeline::from_config(config, config_dir)
            .map_err(|e| DaywallError::GenerationFailed(e.to_string()))?,
    );
    let worker = Arc::clone(&pipeline);
    let system =
        LocalJobSystem::new(registry_path(), Arc::new(move || JobReport::from(&worker.run())));
    Ok((system, pipeline))
}

/// Execute the generate command.
///
/// # Errors
///
/// Returns `DaywallError::GenerationFailed` when the run ends in a failed
/// outcome, or a scheduler error if the job cannot be enqueued.
pub fn execute(args: &GenerateArgs) -> Result<(), DaywallError> {
    let config = config::get_config();

    if args.detach {
        let system = Arc::new(LocalJobSystem::queue_only(registry_path()));
        let id = JobScheduler::from_config(system, &config.schedule).run_once()?;
        println!("{id}");
        eprintln!("Queued. The daemon starts it on its next tick.");
        return Ok(());
    }

    let (system, pipeline) = pipeline_job_system(config, &config::config_dir())?;
    let scheduler = JobScheduler::from_config(Arc::new(system.clone()), &config.schedule);

    let id = scheduler.run_once()?;
    system.join(id);

    let job = system
        .job_infos(ONE_SHOT_JOB_NAME)?
        .into_iter()
        .find(|job| job.id == id)
        .ok_or_else(|| DaywallError::SchedulerError(format!("job {id} disappeared")))?;

    print_result(&job, &pipeline.store().current_path());

    if job.state == JobState::Failed {
        return Err(DaywallError::GenerationFailed(job.last_outcome.unwrap_or_default()));
    }
    Ok(())
}

fn print_result(job: &JobInfo, current: &Path) {
    field("State", output::state(job.state));
    if let Some(summary) = job.last_outcome.as_deref() {
        field("Outcome", output::outcome(job.state, summary));
    }
    if job.state == JobState::Succeeded {
        field("Wallpaper", current.display());
    }
}
