//! State shared by every running mode: the single tracked child process,
//! the result directories found so far, and the resolved analysis backend.

use super::ModeContext;
use crate::backend::{self, Invocation};
use crate::domain::{LaunchError, ModeError};
use crate::launcher::{check_exit, ChildProcess, WaitOutcome};
use crate::params::ProfileParams;
use crate::preflight::{self, AnalysisEnv};
use crate::record;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

pub(crate) struct Runner<'c> {
    pub(crate) ctx: &'c ModeContext,
    mode: &'static str,
    child: Option<ChildProcess>,
    result_dirs: Vec<PathBuf>,
    analysis: Option<AnalysisEnv>,
}

fn base_name(dir: &Path) -> String {
    dir.file_name().map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl<'c> Runner<'c> {
    pub(crate) fn new(ctx: &'c ModeContext, mode: &'static str) -> Self {
        Self { ctx, mode, child: None, result_dirs: Vec::new(), analysis: None }
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.ctx.cancel.is_cancelled()
    }

    pub(crate) fn result_dirs(&self) -> &[PathBuf] {
        &self.result_dirs
    }

    /// Pick up directories announced through this run's record file.
    pub(crate) fn update_dirs_from_record(&mut self, params: &ProfileParams) {
        match record::take(&params.result_dir, self.ctx.pid) {
            Some(dirs) => {
                for dir in dirs {
                    if !self.result_dirs.contains(&dir) {
                        self.result_dirs.push(dir);
                    }
                }
            }
            None => debug!("[{} mode] no output record in {}", self.mode, params.result_dir.display()),
        }
    }

    /// Use the `--output` directory itself as the result directory.
    pub(crate) fn update_dirs_from_params(&mut self, params: &ProfileParams) {
        if self.result_dirs.is_empty() {
            self.result_dirs.push(params.result_dir.clone());
        }
    }

    /// Resolve the interpreter and backend script.
    ///
    /// # Errors
    /// [`ModeError::AnalysisEnv`] on the device side, after a quit, or when
    /// the interpreter or script is unusable.
    pub(crate) fn check_analysis_env(&mut self, params: &ProfileParams) -> Result<(), ModeError> {
        if self.quit_requested() {
            return Err(ModeError::Quit("analysis".to_string()));
        }
        if self.ctx.platform.soc_side() {
            return Err(ModeError::AnalysisEnv("Not in host side, analysis is not supported".to_string()));
        }
        let env = preflight::check_analysis_env(params.python_path.as_deref(), &self.ctx.self_exe)
            .map_err(|e| ModeError::AnalysisEnv(e.to_string()))?;
        debug!("analysis backend {} via {}", env.script.display(), env.python.display());
        self.analysis = Some(env);
        Ok(())
    }

    /// Launch `cmd` as the tracked child.
    ///
    /// # Errors
    /// A quit was requested, another child is tracked, or spawning failed.
    pub(crate) fn spawn(&mut self, name: &str, cmd: Command) -> Result<(), ModeError> {
        if self.quit_requested() {
            return Err(ModeError::Quit(name.to_string()));
        }
        if let Some(child) = &self.child {
            return Err(LaunchError::Busy { pid: child.pid() }.into());
        }
        self.child = Some(ChildProcess::spawn(name, cmd)?);
        Ok(())
    }

    /// Poll the tracked child to exit. A quit observed while waiting tears
    /// the run down without waiting, then the child's real exit status is
    /// still collected.
    ///
    /// # Errors
    /// The status could not be collected, or the child exited with the
    /// failing status.
    pub(crate) fn wait_running(&mut self, params: &ProfileParams) -> Result<(), ModeError> {
        loop {
            let Some(child) = self.child.as_mut() else {
                return Ok(());
            };
            match child.wait(&self.ctx.cancel)? {
                WaitOutcome::Exited(raw) => {
                    let (name, pid) = (child.name().to_string(), child.pid());
                    info!("{name} process {pid} exited, raw status {raw}");
                    self.child = None;
                    check_exit(&name, pid, raw, self.quit_requested())?;
                    return Ok(());
                }
                WaitOutcome::Cancelled => self.stop_no_wait(params),
            }
        }
    }

    /// Quit handling: stop the dynamic client, kill the running child and
    /// collect whatever directories were announced.
    pub(crate) fn stop_no_wait(&mut self, params: &ProfileParams) {
        eprintln!("warning: Receive stop signal.");
        self.ctx.dynamic.stop_client();
        self.kill_child();
        self.update_dirs_from_record(params);
    }

    pub(crate) fn kill_child(&mut self) {
        if let Some(child) = self.child.as_mut() {
            info!("[{} mode] stopping {} process {}", self.mode, child.name(), child.pid());
            child.kill();
        }
    }

    /// Run one backend invocation to completion.
    fn run_backend(&mut self, invocation: &Invocation, params: &ProfileParams) -> Result<(), ModeError> {
        let Some(env) = self.analysis.as_ref() else {
            return Err(ModeError::AnalysisEnv("analysis environment was not checked".to_string()));
        };
        let cmd = invocation.to_command(env);
        self.spawn(invocation.name, cmd)?;
        self.wait_running(params)
    }

    fn run_step(
        &mut self,
        verb: &str,
        dir: &Path,
        invocations: &[Invocation],
        params: &ProfileParams,
    ) -> Result<(), ModeError> {
        let name = base_name(dir);
        println!("info: Start {verb} data in {name}.");
        for invocation in invocations {
            if let Err(e) = self.run_backend(invocation, params) {
                warn!("{} failed in {name}: {e}", invocation.name);
                return Err(e);
            }
        }
        println!("info: {} all data in {name} done.", capitalize(verb));
        Ok(())
    }

    pub(crate) fn start_parse(&mut self, dir: &Path, params: &ProfileParams) -> Result<(), ModeError> {
        self.run_step("parse", dir, &[backend::parse(dir)], params)
    }

    pub(crate) fn start_query(&mut self, dir: &Path, params: &ProfileParams) -> Result<(), ModeError> {
        self.run_step("query", dir, &[backend::query(dir)], params)
    }

    pub(crate) fn start_export(&mut self, dir: &Path, params: &ProfileParams) -> Result<(), ModeError> {
        self.run_step("export", dir, &backend::export(dir, params), params)
    }

    pub(crate) fn start_analyze(&mut self, dir: &Path, params: &ProfileParams) -> Result<(), ModeError> {
        self.run_step("analyze", dir, &[backend::analyze(dir, params)], params)
    }

    /// Best-effort export then query of every result directory. Failures
    /// are warnings; collected data is already on disk.
    pub(crate) fn auto_export(&mut self, params: &ProfileParams) {
        if let Err(e) = self.check_analysis_env(params) {
            eprintln!("warning: {e}");
            warn!("[{} mode] analysis environment is not OK, auto parse will not start", self.mode);
            return;
        }
        for dir in self.result_dirs.clone() {
            if let Err(e) = self.start_export(&dir, params) {
                eprintln!("warning: The export task did not complete successfully: {e}");
                return;
            }
            if let Err(e) = self.start_query(&dir, params) {
                eprintln!("warning: The query task did not complete successfully: {e}");
                return;
            }
        }
    }
}

impl Drop for Runner<'_> {
    fn drop(&mut self) {
        self.kill_child();
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |c| c.to_ascii_uppercase().to_string() + chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("export"), "Export");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("/out/PROF_1")), "PROF_1");
    }
}
