//! # msprof - Main Entry Point
//!
//! Validate the command line, select one running mode, pre-check it and run
//! it. Diagnostics go to stderr; the exit code is the run status.

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use msprof::cancel::CancelToken;
use msprof::cli::Args;
use msprof::domain::RunStatus;
use msprof::running_mode::{self, ModeContext, RunningMode};
use msprof::validation::ParamValidator;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("error: {e}");
            RunStatus::Failed.exit_code()
        }
    });
}

fn run() -> Result<RunStatus> {
    let args = Args::parse();

    let cancel = CancelToken::new();
    cancel.install_ctrlc_handler();
    let ctx = ModeContext::host(cancel)?;

    let mut params = ParamValidator::new(ctx.platform.as_ref()).validate(&args)?;
    debug!("options given: {:?}", params.used_params);

    let mode = RunningMode::select(&params)?;
    running_mode::check(mode, &mut params, &ctx)?;
    info!("{} mode pre-check passed, result root {}", mode.name(), params.result_dir.display());

    let status = running_mode::run(mode, &mut params, &ctx)?;
    if status == RunStatus::NotSupport {
        eprintln!("warning: {} profiling is not supported in this environment", mode.name());
    }
    Ok(status)
}
