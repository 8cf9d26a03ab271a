#![allow(dead_code)]

use anyhow::Result;
use clap::Parser;
use msprof::cancel::CancelToken;
use msprof::cli::Args;
use msprof::domain::{DeviceId, RunStatus, TaskError};
use msprof::driver::{DeviceSession, Driver};
use msprof::dynamic::{Connector, UnixConnector};
use msprof::params::ProfileParams;
use msprof::platform::{HostPlatform, PlatformType};
use msprof::running_mode::{self, ModeContext, RunningMode};
use msprof::task::sampler::SampleSource;
use msprof::validation::ParamValidator;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Driver with a fixed set of online devices whose sessions log calls.
pub struct FakeDriver {
    pub online: Vec<u32>,
    pub supported: bool,
    pub calls: CallLog,
}

impl FakeDriver {
    pub fn new(online: Vec<u32>) -> Self {
        Self { online, supported: true, calls: CallLog::default() }
    }

    pub fn unsupported(online: Vec<u32>) -> Self {
        Self { supported: false, ..Self::new(online) }
    }
}

struct FakeSession {
    device: DeviceId,
    calls: CallLog,
}

impl FakeSession {
    fn log(&self, what: &str) {
        self.calls.lock().unwrap().push(format!("{what} {}", self.device.0));
    }
}

impl DeviceSession for FakeSession {
    fn start(&mut self, blob: &str) -> Result<(), TaskError> {
        assert!(ProfileParams::from_blob(blob).is_ok());
        self.log("start");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TaskError> {
        self.log("stop");
        Ok(())
    }

    fn wait(&mut self) -> Result<(), TaskError> {
        self.log("wait");
        Ok(())
    }
}

impl Driver for FakeDriver {
    fn online_devices(&self) -> Result<Vec<u32>, TaskError> {
        Ok(self.online.clone())
    }

    fn host_sources(&self, _device: DeviceId, _params: &ProfileParams) -> Vec<Box<dyn SampleSource>> {
        Vec::new()
    }

    fn open_session(&self, device: DeviceId) -> Result<Box<dyn DeviceSession>, TaskError> {
        if !self.supported {
            return Err(TaskError::not_supported(device, "fake driver has no device channel"));
        }
        Ok(Box::new(FakeSession { device, calls: self.calls.clone() }))
    }
}

/// Context rooted in `root`: the binary lives at `root/bin/msprof`.
pub fn context(root: &Path, driver: Arc<dyn Driver>) -> ModeContext {
    context_with_connector(root, driver, Arc::new(UnixConnector))
}

pub fn context_with_connector(root: &Path, driver: Arc<dyn Driver>, connector: Arc<dyn Connector>) -> ModeContext {
    ModeContext::new(
        Arc::new(HostPlatform::new(PlatformType::CloudV2, false)),
        driver,
        connector,
        CancelToken::new(),
        root.join("bin").join("msprof"),
    )
}

/// Parse, validate, select, check and run like the binary does.
pub fn run_msprof(argv: &[&str], ctx: &ModeContext) -> Result<RunStatus> {
    let args = Args::try_parse_from(std::iter::once("msprof").chain(argv.iter().copied()))?;
    let mut params = ParamValidator::new(ctx.platform.as_ref()).validate(&args)?;
    let mode = RunningMode::select(&params)?;
    running_mode::check(mode, &mut params, ctx)?;
    Ok(running_mode::run(mode, &mut params, ctx)?)
}

pub fn write_script(path: &Path, body: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// `PROF_*` directories directly under `output`.
pub fn result_dirs(output: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(output)
        .unwrap()
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.file_name().is_some_and(|n| n.to_string_lossy().starts_with("PROF_")))
        .collect();
    dirs.sort();
    dirs
}
