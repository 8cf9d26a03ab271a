//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep device ids, job ids and process ids from being
//! mixed up in the orchestration code.

use std::fmt;

/// Pseudo device id used for host-only collection jobs.
pub const DEFAULT_HOST_ID: u32 = 64;

/// Accelerator device id, or [`DEFAULT_HOST_ID`] for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl DeviceId {
    pub const HOST: DeviceId = DeviceId(DEFAULT_HOST_ID);

    #[must_use]
    pub fn is_host(self) -> bool {
        self == Self::HOST
    }

    /// Name of the per-job result subdirectory (`host` or `device_<id>`).
    #[must_use]
    pub fn result_path(self) -> String {
        if self.is_host() {
            "host".to_string()
        } else {
            format!("device_{}", self.0)
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "host")
        } else {
            write!(f, "device {}", self.0)
        }
    }
}

/// Collection job identifier, unique per task within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub String);

impl JobId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final outcome of one invocation, reported to the shell as the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
    /// System profiling cannot run in this environment (e.g. a container).
    NotSupport,
}

impl RunStatus {
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failed => 1,
            RunStatus::NotSupport => 3,
        }
    }
}
