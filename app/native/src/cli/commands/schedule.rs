//! Schedule and daemon CLI commands.

use std::sync::Arc;

use clap::Subcommand;
use serde_json::json;

use super::generate::{pipeline_job_system, registry_path};
use crate::cli::output::{field, print_job, print_json, yes_no};
use crate::config;
use crate::constants::DAILY_JOB_NAME;
use crate::error::DaywallError;
use crate::scheduler::network::AlwaysOnline;
use crate::scheduler::{Connectivity, JobScheduler, LocalJobSystem, TcpConnectivity, daemon};

/// Recurring generation commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
#[command(next_display_order = None)]
pub enum ScheduleCommands {
    /// Register the recurring generation job.
    ///
    /// Replaces any existing registration. The job runs while `daywall daemon`
    /// is running.
    Enable,

    /// Cancel the recurring generation job.
    ///
    /// A run already in progress is allowed to finish.
    Disable,

    /// Show whether the recurring job is registered and how it last ran.
    #[command(after_long_help = r#"Examples:
  daywall schedule status           # Human-readable summary
  daywall schedule status --json    # Machine-readable output"#)]
    Status {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },
}

fn scheduler() -> JobScheduler {
    let config = config::get_config();
    let system = Arc::new(LocalJobSystem::queue_only(registry_path()));
    JobScheduler::from_config(system, &config.schedule)
}

/// Execute schedule subcommands.
///
/// # Errors
///
/// Returns an error if the job registry cannot be read or written.
pub fn execute(cmd: &ScheduleCommands) -> Result<(), DaywallError> {
    match cmd {
        ScheduleCommands::Enable => {
            let id = scheduler().schedule_daily(DAILY_JOB_NAME)?;
            let hours = config::get_config().schedule.interval_hours;
            println!("Scheduled generation every {hours}h (job {}).", id.short());
            println!("Keep `daywall daemon` running to execute it.");
            Ok(())
        }
        ScheduleCommands::Disable => {
            scheduler().cancel(DAILY_JOB_NAME)?;
            println!("Recurring generation cancelled.");
            Ok(())
        }
        ScheduleCommands::Status { json } => show_status(*json),
    }
}

fn show_status(as_json: bool) -> Result<(), DaywallError> {
    let scheduler = scheduler();
    let scheduled = scheduler.is_scheduled(DAILY_JOB_NAME);
    let registration = scheduler.active_registration(DAILY_JOB_NAME)?;

    if as_json {
        print_json(&json!({
            "scheduled": scheduled,
            "registration": registration,
        }))?;
        return Ok(());
    }

    field("Scheduled", yes_no(scheduled));
    if let Some(job) = registration {
        print_job(&job);
    }
    Ok(())
}

/// Run the scheduler daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the pipeline or the async runtime cannot be created.
pub fn run_daemon() -> Result<(), DaywallError> {
    let config = config::get_config();
    let (system, _) = pipeline_job_system(config, &config::config_dir())?;

    let base_url = &config.generator.base_url;
    let network: Arc<dyn Connectivity> = match TcpConnectivity::from_base_url(base_url) {
        Some(tcp) => Arc::new(tcp),
        None => {
            tracing::warn!(
                base_url = %base_url,
                "cannot derive a host to check, treating network as available"
            );
            Arc::new(AlwaysOnline)
        }
    };

    daemon::run(&system, network, config.schedule.tick())?;
    Ok(())
}
