//! Running modes
//!
//! Exactly one mode runs per invocation. It is chosen from the validated
//! parameters, pre-checked against its option sets, then run to completion
//! against a [`ModeContext`] that carries every external collaborator.

mod analysis;
mod app;
mod runner;
pub mod sets;
mod system;

pub use analysis::OfflineMode;
pub use app::APP_LAUNCH_GRACE;

use crate::cancel::CancelToken;
use crate::domain::{ModeError, RunStatus};
use crate::driver::{Driver, HostDriver};
use crate::dynamic::{spawn_stdin_reader, Connector, DynProfManager, UnixConnector};
use crate::params::ProfileParams;
use crate::platform::{HostPlatform, Platform};
use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    App,
    System,
    Offline(OfflineMode),
}

impl RunningMode {
    /// Pick the mode. Collection outranks analysis: an application or
    /// attach target wins, then any system collection option, then the
    /// offline switches in `parse`, `query`, `export`, `analyze` order.
    ///
    /// # Errors
    /// [`ModeError::NoModeSelected`] when nothing selects a mode.
    pub fn select(params: &ProfileParams) -> Result<Self, ModeError> {
        let mode = if params.application.is_some() || params.dynamic_pid.is_some() {
            RunningMode::App
        } else if sets::selects_system(&params.used_params) || params.is_host_profiling() {
            RunningMode::System
        } else if params.parse {
            RunningMode::Offline(OfflineMode::Parse)
        } else if params.query {
            RunningMode::Offline(OfflineMode::Query)
        } else if params.export {
            RunningMode::Offline(OfflineMode::Export)
        } else if params.analyze {
            RunningMode::Offline(OfflineMode::Analyze)
        } else {
            return Err(ModeError::NoModeSelected);
        };
        Ok(mode)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RunningMode::App => "app",
            RunningMode::System => "system",
            RunningMode::Offline(mode) => mode.name(),
        }
    }
}

/// External collaborators of a run. Tests build one from fakes.
pub struct ModeContext {
    pub platform: Arc<dyn Platform>,
    pub driver: Arc<dyn Driver>,
    pub dynamic: DynProfManager,
    pub cancel: CancelToken,
    /// This executable; the analysis backend is found relative to it.
    pub self_exe: PathBuf,
    /// Key of this run's `output.record` file.
    pub pid: u32,
    dynamic_input: Mutex<Option<Receiver<String>>>,
}

impl ModeContext {
    #[must_use]
    pub fn new(
        platform: Arc<dyn Platform>,
        driver: Arc<dyn Driver>,
        connector: Arc<dyn Connector>,
        cancel: CancelToken,
        self_exe: PathBuf,
    ) -> Self {
        Self {
            platform,
            driver,
            dynamic: DynProfManager::new(connector),
            cancel,
            self_exe,
            pid: std::process::id(),
            dynamic_input: Mutex::new(None),
        }
    }

    /// Context for the machine msprof runs on.
    ///
    /// # Errors
    /// The path of this executable cannot be resolved.
    pub fn host(cancel: CancelToken) -> Result<Self> {
        let platform = HostPlatform::detect();
        let driver = HostDriver::new(platform.in_container());
        let self_exe = std::env::current_exe().context("Failed to resolve the msprof executable path")?;
        Ok(Self::new(Arc::new(platform), Arc::new(driver), Arc::new(UnixConnector), cancel, self_exe))
    }

    /// Feed dynamic-profiling commands from `lines` instead of stdin.
    #[must_use]
    pub fn with_dynamic_input(self, lines: Receiver<String>) -> Self {
        *self.dynamic_input.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(lines);
        self
    }

    pub(crate) fn dynamic_input(&self) -> io::Result<Receiver<String>> {
        let injected = self.dynamic_input.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take();
        match injected {
            Some(lines) => Ok(lines),
            None => spawn_stdin_reader(),
        }
    }
}

/// Mode pre-check. May rewrite `params` (System narrows `--sys-devices` to
/// the online devices).
///
/// # Errors
/// Forbidden or missing options, no data to collect, or no usable device.
pub fn check(mode: RunningMode, params: &mut ProfileParams, ctx: &ModeContext) -> Result<(), ModeError> {
    match mode {
        RunningMode::App => {
            app::check(params);
            Ok(())
        }
        RunningMode::System => system::check(params, ctx),
        RunningMode::Offline(offline) => analysis::check(offline, params),
    }
}

/// Run a pre-checked mode to completion.
///
/// # Errors
/// The mode failed; partial results may remain on disk.
pub fn run(mode: RunningMode, params: &mut ProfileParams, ctx: &ModeContext) -> Result<RunStatus, ModeError> {
    info!("running {} mode", mode.name());
    match mode {
        RunningMode::App => app::run(params, ctx),
        RunningMode::System => system::run(params, ctx),
        RunningMode::Offline(offline) => analysis::run(offline, params, ctx),
    }
}
