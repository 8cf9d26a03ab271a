//! Child process launch and polling supervision.

use crate::cancel::{CancelToken, POLL_INTERVAL};
use crate::domain::LaunchError;
use crate::params::ProfileParams;
use log::{debug, warn};
use msprof_common::{PROFILER_SAMPLE_CONFIG_ENV, PROFILING_MODE_DYNAMIC, PROFILING_MODE_ENV};
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Child, Command};

/// Raw wait status of a child that exited with code 1.
pub const RAW_STATUS_FAILURE: i32 = 256;

/// Command line of the profiled application.
#[derive(Debug, Clone)]
pub struct AppCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl AppCommand {
    /// The application from `params` with the configuration blob in its
    /// environment. `None` if no application was given.
    #[must_use]
    pub fn from_params(params: &ProfileParams, blob: &str) -> Option<Self> {
        let program = params.app_path.clone()?;
        let mut env = params.app_env.clone();
        env.push((PROFILER_SAMPLE_CONFIG_ENV.to_string(), blob.to_string()));
        if params.dynamic {
            env.push((PROFILING_MODE_ENV.to_string(), PROFILING_MODE_DYNAMIC.to_string()));
        }
        Some(Self { program, args: params.app_parameters.clone(), env })
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.program.file_name().map_or_else(
            || self.program.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

/// How a polled wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Raw wait status.
    Exited(i32),
    Cancelled,
}

/// A spawned child, waited on by polling so cancellation can be observed.
#[derive(Debug)]
pub struct ChildProcess {
    name: String,
    child: Child,
}

impl ChildProcess {
    /// # Errors
    /// [`LaunchError::Spawn`] when the program cannot be executed.
    pub fn spawn(name: impl Into<String>, mut cmd: Command) -> Result<Self, LaunchError> {
        let name = name.into();
        let child = cmd.spawn().map_err(|source| LaunchError::Spawn { name: name.clone(), source })?;
        debug!("launched {name} as pid {}", child.id());
        Ok(Self { name, child })
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-blocking exit check, raw wait status if exited.
    ///
    /// # Errors
    /// [`LaunchError::Wait`] if the status cannot be collected.
    pub fn try_wait(&mut self) -> Result<Option<i32>, LaunchError> {
        self.child
            .try_wait()
            .map(|status| status.map(ExitStatusExt::into_raw))
            .map_err(|source| LaunchError::Wait { name: self.name.clone(), pid: self.pid(), source })
    }

    /// Poll until exit or cancellation. A child that exits is always reported
    /// as exited, even if cancellation arrived in the same slice.
    ///
    /// # Errors
    /// [`LaunchError::Wait`] if the status cannot be collected.
    pub fn wait(&mut self, cancel: &CancelToken) -> Result<WaitOutcome, LaunchError> {
        loop {
            if let Some(raw) = self.try_wait()? {
                return Ok(WaitOutcome::Exited(raw));
            }
            if cancel.is_cancelled() {
                return Ok(WaitOutcome::Cancelled);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Kill and reap. A child that already exited is fine.
    pub fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("kill {} ({}): {e}", self.name, self.pid());
        }
        let _ = self.child.wait();
    }
}

/// Judge a raw wait status. Non-zero statuses are reported unless the user
/// asked to quit; only [`RAW_STATUS_FAILURE`] fails the run.
///
/// # Errors
/// [`LaunchError::ExitStatus`] for a failing status.
pub fn check_exit(name: &str, pid: u32, raw: i32, quit_requested: bool) -> Result<(), LaunchError> {
    if raw != 0 && !quit_requested {
        warn!("{name} ({pid}) exited with raw status {raw}");
        eprintln!("warning: An exception has occurred in process {name}");
    }
    if raw == RAW_STATUS_FAILURE {
        return Err(LaunchError::ExitStatus { name: name.to_string(), status: raw >> 8 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn test_wait_reports_exit_status() {
        let mut child = ChildProcess::spawn("sh", sh("exit 1")).unwrap();
        let outcome = child.wait(&CancelToken::new()).unwrap();
        assert_eq!(outcome, WaitOutcome::Exited(RAW_STATUS_FAILURE));
        assert!(check_exit("sh", child.pid(), RAW_STATUS_FAILURE, false).is_err());
    }

    #[test]
    fn test_cancelled_wait_then_kill() {
        let mut child = ChildProcess::spawn("sleep", sh("sleep 30")).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(child.wait(&cancel).unwrap(), WaitOutcome::Cancelled);
        child.kill();
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_spawn_missing_program() {
        let err = ChildProcess::spawn("nope", Command::new("/nonexistent/app")).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[test]
    fn test_app_command_env() {
        let params = ProfileParams {
            app_path: Some(PathBuf::from("/bin/true")),
            app_parameters: vec!["-x".to_string()],
            dynamic: true,
            ..Default::default()
        };
        let cmd = AppCommand::from_params(&params, "{}").unwrap();
        assert_eq!(cmd.name(), "true");
        assert!(cmd.env.contains(&(PROFILER_SAMPLE_CONFIG_ENV.to_string(), "{}".to_string())));
        assert!(cmd.env.iter().any(|(k, _)| k == PROFILING_MODE_ENV));
    }

    #[test]
    fn test_other_nonzero_status_only_warns() {
        assert!(check_exit("app", 1, 512, false).is_ok());
        assert!(check_exit("app", 1, 0, false).is_ok());
    }
}
