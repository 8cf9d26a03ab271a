//! Pre-flight checks for msprof
//!
//! Validates the host before collection or post-processing starts: external
//! tools needed by host sampling, privileges, and the analysis backend.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() and access() require unsafe

use crate::domain::ValidationError;
use crate::params::HostSys;
use anyhow::{bail, Context, Result};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Default interpreter when `--python-path` is not given.
pub const DEFAULT_PYTHON: &str = "python3";

/// Backend script location relative to the directory holding the binary.
const ANALYSIS_SCRIPT: &str = "../profiler_tool/analysis/msprof/msprof.py";

/// Resolved interpreter and backend script for post-processing.
#[derive(Debug, Clone)]
pub struct AnalysisEnv {
    pub python: PathBuf,
    pub script: PathBuf,
}

/// Check that the tools a host statistic shells out to are available.
///
/// `osrt` traces with `perf` and `ltrace`, `disk` reads `iotop`. Both need
/// root or sudo.
///
/// # Errors
/// [`ValidationError::ToolMissing`] naming the first missing tool.
pub fn check_host_tools(sources: &[HostSys]) -> Result<(), ValidationError> {
    for source in sources {
        let tools: &[&str] = match source {
            HostSys::Osrt => &["perf", "ltrace"],
            HostSys::Disk => &["iotop"],
            _ => continue,
        };
        for tool in tools {
            if find_on_path(tool).is_none() || !has_privileges() {
                return Err(ValidationError::ToolMissing { tool: (*tool).to_string() });
            }
        }
    }
    Ok(())
}

fn is_root() -> bool {
    let euid = unsafe { libc::geteuid() };
    euid == 0
}

/// Root, or a `sudo` the tools can be run through.
fn has_privileges() -> bool {
    is_root() || find_on_path("sudo").is_some()
}

/// Locate an executable in `$PATH`.
#[must_use]
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).map(|dir| dir.join(name)).find(|p| p.is_file() && is_executable(p))
}

/// `access(path, X_OK)` for the current user.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    access(path, libc::X_OK)
}

/// `access(path, W_OK)` for the current user.
#[must_use]
pub fn is_writable(path: &Path) -> bool {
    access(path, libc::W_OK)
}

fn access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

/// Resolve the python interpreter and backend script.
///
/// # Errors
/// Interpreter or script missing or not executable.
pub fn check_analysis_env(python_path: Option<&str>, self_exe: &Path) -> Result<AnalysisEnv> {
    let python = match python_path {
        Some(p) => PathBuf::from(p),
        None => find_on_path(DEFAULT_PYTHON).with_context(|| {
            format!("{DEFAULT_PYTHON} not found in PATH, specify one with --python-path")
        })?,
    };
    if !python.is_file() || !is_executable(&python) {
        bail!("Python interpreter {} is not an executable file", python.display());
    }

    let exe_dir = self_exe.parent().context("Cannot resolve the directory of msprof")?;
    let script = exe_dir.join(ANALYSIS_SCRIPT);
    if !script.is_file() {
        bail!(
            "Analysis script not found: {}\n\n\
             Install msprof together with profiler_tool, e.g. with `cargo xtask dist`.",
            script.display()
        );
    }
    if !is_executable(&script) {
        bail!("Analysis script {} is not executable", script.display());
    }
    Ok(AnalysisEnv { python, script })
}
