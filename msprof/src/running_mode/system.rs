//! System mode: whole-device and host sampling for a fixed period.
//!
//! Jobs are started per device in command-line order, host task first,
//! then the device task when device-side collection was requested. They
//! are stopped in exactly the reverse order once the period ends or a quit
//! is requested. A job that cannot collect here is skipped with a warning
//! and the run ends with [`RunStatus::NotSupport`]; any other job failure
//! rolls back every job already started.

use super::runner::Runner;
use super::{sets, ModeContext};
use crate::domain::{ArgId, DeviceId, ModeError, RunStatus};
use crate::layout;
use crate::params::{ProfMode, ProfileParams, ProfilingMode};
use crate::record;
use crate::task::{sources, CollectionTask, DeviceTask, HostTask, TaskSupervisor};
use chrono::Local;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tick of the period wait.
const WAIT_TICK: Duration = Duration::from_millis(100);

pub(crate) fn check(params: &mut ProfileParams, ctx: &ModeContext) -> Result<(), ModeError> {
    sets::SYSTEM.check_forbidden(&params.used_params)?;
    sets::SYSTEM.check_necessary(&params.used_params)?;
    if !data_will_be_collected(params) {
        return Err(ModeError::NoDataCollected);
    }
    sets::SYSTEM.warn_useless(&params.used_params);
    check_host_sys_params(params, ctx)
}

/// Something beyond device and window selection was asked for.
fn data_will_be_collected(params: &ProfileParams) -> bool {
    params.used_params.iter().any(|id| !sets::SYSTEM_SELECTORS.contains(id))
}

fn check_host_sys_params(params: &mut ProfileParams, ctx: &ModeContext) -> Result<(), ModeError> {
    let host = params.is_host_profiling();
    if params.is_used(ArgId::SysDevices) || !params.device_list().is_empty() {
        check_devices_online(params, ctx, host)?;
    } else if !host {
        return Err(ModeError::DevicesRequired);
    }
    if !params.host_sys.is_empty() && params.host_sys_pid.is_none() {
        return Err(ModeError::HostSysPidRequired);
    }
    Ok(())
}

/// Drop offline devices from `--sys-devices`, expanding `all` to every
/// online device. With host collection requested no online device is
/// needed; the host job runs alone.
fn check_devices_online(params: &mut ProfileParams, ctx: &ModeContext, host: bool) -> Result<(), ModeError> {
    let online = ctx.driver.online_devices().map_err(|e| ModeError::DeviceQuery(e.to_string()))?;
    let requested = params.device_list();
    let mut valid: Vec<u32> = Vec::new();
    let mut offline: Vec<&str> = Vec::new();
    if requested.iter().any(|d| d == "all") {
        valid.clone_from(&online);
    } else {
        for raw in &requested {
            let id: u32 = raw.parse().map_err(|_| ModeError::InvalidDevice(raw.clone()))?;
            if online.contains(&id) {
                if !valid.contains(&id) {
                    valid.push(id);
                }
            } else {
                offline.push(raw);
            }
        }
    }
    if !offline.is_empty() {
        eprintln!("warning: The following devices({}) are offline and will not collect.", offline.join(","));
    }
    if valid.is_empty() {
        if !host {
            return Err(ModeError::NoOnlineDevice);
        }
        eprintln!("warning: No online device selected, only host data will be collected.");
        params.devices = None;
        return Ok(());
    }
    params.devices = Some(valid.iter().map(u32::to_string).collect::<Vec<_>>().join(","));
    Ok(())
}

pub(crate) fn set_default_params(params: &mut ProfileParams) {
    params.prof_mode = ProfMode::System;
    if params.ai_core == Some(true) {
        params.aiv.get_or_insert(true);
        params.ai_core_mode = Some(ProfilingMode::SampleBased);
        params.aiv_mode = Some(ProfilingMode::SampleBased);
    }
}

pub(crate) fn run(params: &mut ProfileParams, ctx: &ModeContext) -> Result<RunStatus, ModeError> {
    set_default_params(params);
    let mut runner = Runner::new(ctx, "system");
    let mut jobs = SysJobs::default();

    start_sys_task(params, ctx, &mut jobs)?;
    if jobs.supervisor.is_empty() {
        eprintln!("warning: No system profiling job could start in this environment.");
        runner.update_dirs_from_record(params);
        return Ok(RunStatus::NotSupport);
    }
    wait_sys_task(params, ctx);
    if let Err(e) = jobs.supervisor.stop_all() {
        warn!("stopping system jobs: {e}");
    }

    runner.update_dirs_from_record(params);
    runner.auto_export(params);
    if jobs.skipped > 0 {
        return Ok(RunStatus::NotSupport);
    }
    Ok(RunStatus::Success)
}

/// Running jobs plus the count of jobs skipped as not supported.
#[derive(Default)]
struct SysJobs {
    supervisor: TaskSupervisor,
    skipped: usize,
}

impl SysJobs {
    fn launch(&mut self, task: Box<dyn CollectionTask>) -> Result<(), ModeError> {
        match self.supervisor.launch(task) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_supported() => {
                eprintln!("warning: {e}, this job will not collect.");
                self.skipped += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Announce the result directory, then start host and device jobs. Every
/// job already started is stopped again if a later one fails.
fn start_sys_task(params: &ProfileParams, ctx: &ModeContext, jobs: &mut SysJobs) -> Result<(), ModeError> {
    if ctx.cancel.is_cancelled() {
        return Err(ModeError::Quit("system profiling".to_string()));
    }
    let base_dir = layout::result_dir_name(ctx.pid, Local::now());
    record::append(&params.result_dir, ctx.pid, &base_dir)?;
    let run_dir = params.result_dir.join(&base_dir);
    info!("system profiling results in {}", run_dir.display());

    let started = start_host_jobs(params, &run_dir, jobs).and_then(|()| {
        for raw in params.device_list() {
            let id: u32 = raw.parse().map_err(|_| ModeError::InvalidDevice(raw.clone()))?;
            start_device_jobs(params, ctx, DeviceId(id), &run_dir, jobs)?;
        }
        Ok(())
    });
    if started.is_err() {
        if let Err(e) = jobs.supervisor.stop_all() {
            warn!("rolling back started jobs: {e}");
        }
    }
    started
}

fn create_job_dir(run_dir: &Path, device: DeviceId) -> Result<PathBuf, ModeError> {
    let job_dir = run_dir.join(device.result_path());
    std::fs::create_dir_all(&job_dir)
        .map_err(|source| ModeError::CreateDir { path: job_dir.display().to_string(), source })?;
    Ok(job_dir)
}

/// Configuration blob of one job, tagged with its job id.
fn job_blob(params: &ProfileParams, job_id: &str) -> Result<String, ModeError> {
    let mut job = params.clone();
    job.job_id = job_id.to_string();
    Ok(job.to_blob()?)
}

fn start_host_jobs(params: &ProfileParams, run_dir: &Path, jobs: &mut SysJobs) -> Result<(), ModeError> {
    if !params.is_host_profiling() {
        return Ok(());
    }
    let job_dir = create_job_dir(run_dir, DeviceId::HOST)?;
    let job_id = layout::new_job_id();
    let blob = job_blob(params, job_id.as_str())?;
    let task = HostTask::new(job_id, DeviceId::HOST, job_dir, blob, sources::host_sources(params));
    jobs.launch(Box::new(task))
}

fn start_device_jobs(
    params: &ProfileParams,
    ctx: &ModeContext,
    device: DeviceId,
    run_dir: &Path,
    jobs: &mut SysJobs,
) -> Result<(), ModeError> {
    let job_dir = create_job_dir(run_dir, device)?;

    let host_job = layout::new_job_id();
    let blob = job_blob(params, host_job.as_str())?;
    let sources = ctx.driver.host_sources(device, params);
    jobs.launch(Box::new(HostTask::new(host_job, device, job_dir, blob, sources)))?;

    if params.is_device_job() && !ctx.platform.soc_side() {
        let mut device_job = layout::new_job_id();
        while jobs.supervisor.get_running_task(&device_job).is_some() {
            device_job = layout::new_job_id();
        }
        let blob = job_blob(params, device_job.as_str())?;
        let task = DeviceTask::new(device_job, device, ctx.driver.clone(), blob);
        debug!("{device}: starting device job");
        jobs.launch(Box::new(task))?;
    }
    Ok(())
}

/// Block until the period elapses or a quit is requested. Without a
/// period only a quit ends the wait.
fn wait_sys_task(params: &ProfileParams, ctx: &ModeContext) {
    match params.profiling_period_secs {
        Some(secs) => {
            println!("info: System profiling runs for {secs} seconds.");
            if ctx.cancel.sleep(Duration::from_secs(u64::from(secs))) {
                info!("system profiling stopped by quit request");
            }
        }
        None => {
            println!("info: System profiling runs until stopped.");
            while !ctx.cancel.sleep(WAIT_TICK) {}
        }
    }
}
