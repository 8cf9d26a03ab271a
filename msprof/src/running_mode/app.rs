//! App mode: profile one launched (or attached) application.

use super::runner::Runner;
use super::{sets, ModeContext};
use crate::domain::{ModeError, RunStatus};
use crate::launcher::AppCommand;
use crate::params::{ProfMode, ProfileParams, ProfilingMode};
use crate::platform::{Feature, Platform};
use log::{info, warn};
use std::io;
use std::time::{Duration, Instant};

/// Time given to a freshly launched application to bind its dynamic
/// profiling socket.
pub const APP_LAUNCH_GRACE: Duration = Duration::from_secs(2);

pub(crate) fn check(params: &ProfileParams) {
    sets::APP.warn_useless(&params.used_params);
}

/// Fill switches the user left unset.
pub(crate) fn set_default_params(params: &mut ProfileParams, platform: &dyn Platform) {
    params.prof_mode = ProfMode::App;
    params.acl.get_or_insert(true);
    params.task_time.get_or_insert_with(|| "on".to_string());
    if params.ai_core.is_none() {
        params.ai_core = Some(true);
        params.ai_core_lpm = true;
    }
    params.ai_core_mode.get_or_insert(ProfilingMode::TaskBased);
    if params.ai_core == Some(true) && params.aiv.is_none() {
        params.ai_core_lpm = true;
        params.aiv = Some(true);
    }
    params.aiv_mode.get_or_insert(ProfilingMode::TaskBased);
    if params.aiv_mode == Some(ProfilingMode::SampleBased) || !platform.supports(Feature::AicoreLpm) {
        params.ai_core_lpm = false;
    }
    if params.ai_core == Some(true) && params.aic_metrics.is_none() {
        params.aic_metrics = Some(platform.default_metrics().to_string());
    }
    if params.aiv == Some(true) && params.aiv_metrics.is_none() {
        params.aiv_metrics = Some(platform.default_metrics().to_string());
    }
}

pub(crate) fn run(params: &mut ProfileParams, ctx: &ModeContext) -> Result<RunStatus, ModeError> {
    set_default_params(params, ctx.platform.as_ref());
    ctx.dynamic.configure(params, ctx.pid);
    let mut runner = Runner::new(ctx, "app");
    if ctx.dynamic.is_enabled() {
        return run_dynamic(&mut runner, params);
    }

    let started = Instant::now();
    launch_app(&mut runner, params)?;
    runner.wait_running(params)?;
    let elapsed = started.elapsed();
    runner.update_dirs_from_record(params);

    if runner.result_dirs().is_empty() {
        if params.delay_secs.is_some_and(|delay| elapsed.as_secs() <= u64::from(delay)) {
            warn!("[App Mode] the app process exited before the delay time");
        } else {
            warn!("[App Mode] no result directory was announced by the app");
            eprintln!(
                "warning: Failed to find profiling data, please check that the application executes \
                 AI-related business, or ensure that aclInit/GEInitialize is invoked in the application"
            );
        }
        return Ok(RunStatus::Success);
    }
    runner.auto_export(params);
    Ok(RunStatus::Success)
}

fn launch_app(runner: &mut Runner<'_>, params: &ProfileParams) -> Result<(), ModeError> {
    let blob = params.to_blob()?;
    let app = AppCommand::from_params(params, &blob)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no application to launch"))?;
    info!("launching {} {:?}", app.program.display(), app.args);
    runner.spawn(&app.name(), app.to_command())
}

/// Launch the app (unless attaching), hand control to the interactive
/// client and wait for it to quit.
fn run_dynamic(runner: &mut Runner<'_>, params: &ProfileParams) -> Result<RunStatus, ModeError> {
    let ctx = runner.ctx;
    if runner.quit_requested() {
        return Err(ModeError::Quit("app".to_string()));
    }
    let app_mode = ctx.dynamic.is_app_mode();
    if app_mode {
        launch_app(runner, params)?;
        if ctx.cancel.sleep(APP_LAUNCH_GRACE) {
            info!("quit requested during app start up");
        }
    }

    let blob = params.to_blob()?;
    let lines = ctx.dynamic_input()?;
    if let Err(e) = ctx.dynamic.start_client(&blob, &ctx.cancel, lines, Box::new(io::stdout())) {
        runner.kill_child();
        return Err(e.into());
    }
    info!("dynamic profiling client started");
    ctx.dynamic.wait_quit(&ctx.cancel);

    if app_mode && !runner.quit_requested() {
        println!("info: waiting for app process exit......");
        runner.wait_running(params)?;
    }
    Ok(RunStatus::Success)
}
