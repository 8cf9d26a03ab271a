//! Structured error types for msprof
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! The Display text of every variant is the one-line diagnostic shown to the
//! user, so keep it actionable.

use super::arg_id::ArgId;
use super::types::DeviceId;
use msprof_common::ProtocolError;
use thiserror::Error;

/// Rejected command-line input. Raised before any process or job starts.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Argument {0} is empty")]
    Empty(ArgId),

    #[error("Argument {arg}={value} is invalid. {hint}")]
    InvalidValue { arg: ArgId, value: String, hint: String },

    #[error("Argument {arg}={value} is out of range, valid range is [{min}, {max}]")]
    OutOfRange { arg: ArgId, value: String, min: u64, max: u64 },

    #[error("Argument {arg} {path}: {reason}")]
    Path { arg: ArgId, path: String, reason: String },

    #[error("Argument {first} can not be used together with {second}")]
    Conflict { first: ArgId, second: ArgId },

    #[error("Argument {arg} requires {requirement}")]
    Requires { arg: ArgId, requirement: String },

    #[error("The tool {tool} is invalid, please check if the tool and sudo are available")]
    ToolMissing { tool: String },
}

impl ValidationError {
    pub fn invalid(arg: ArgId, value: &str, hint: impl Into<String>) -> Self {
        ValidationError::InvalidValue { arg, value: value.to_string(), hint: hint.into() }
    }

    pub fn path(arg: ArgId, path: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        ValidationError::Path { arg, path: path.to_string(), reason: reason.into() }
    }
}

/// Mode selection, pre-check and orchestration failures.
#[derive(Error, Debug)]
pub enum ModeError {
    #[error(
        "No profiling mode selected. Specify --application, --sys-devices, --host-sys, \
         --host-sys-usage, --parse, --query, --export or --analyze"
    )]
    NoModeSelected,

    #[error("The argument {args} is forbidden when --{precheck} is not empty")]
    Forbidden { args: String, precheck: String },

    #[error("The argument {args} is necessary when --{precheck} is not empty")]
    MissingNecessary { args: String, precheck: String },

    #[error("No collection data type is specified, profiling will not start")]
    NoDataCollected,

    #[error("The device ({0}) is not valid, please check it!")]
    InvalidDevice(String),

    #[error("Argument --sys-devices is invalid, please enter a valid --sys-devices value")]
    NoOnlineDevice,

    #[error("The argument --sys-devices is necessary when device system profiling is requested")]
    DevicesRequired,

    #[error("Get online devices failed: {0}")]
    DeviceQuery(String),

    #[error("The argument --host-sys-pid is required when app is empty and --host-sys is on")]
    HostSysPidRequired,

    #[error("Analysis environment is not ready: {0}")]
    AnalysisEnv(String),

    #[error("Create dir ({path}) failed: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("msprof has quit, {0} will not start")]
    Quit(String),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Dynamic(#[from] DynamicError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Per-job failure. `NotSupported` is recoverable and distinct from `Failed`.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{device}: {reason}")]
    NotSupported { device: DeviceId, reason: String },

    #[error("{device}: {reason}")]
    Failed { device: DeviceId, reason: String },

    #[error("{device}: job {job_id} is already running")]
    DuplicateJob { device: DeviceId, job_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TaskError {
    pub fn failed(device: DeviceId, reason: impl Into<String>) -> Self {
        TaskError::Failed { device, reason: reason.into() }
    }

    pub fn not_supported(device: DeviceId, reason: impl Into<String>) -> Self {
        TaskError::NotSupported { device, reason: reason.into() }
    }

    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, TaskError::NotSupported { .. })
    }
}

/// Child process launch and supervision failures.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Failed to launch {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process {pid} is running, only one child process can run at the same time")]
    Busy { pid: u32 },

    #[error("Failed to wait {name} process {pid} to exit: {source}")]
    Wait {
        name: String,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} process exited with status {status}")]
    ExitStatus { name: String, status: i32 },
}

/// Dynamic-profiling session failures.
#[derive(Error, Debug)]
pub enum DynamicError {
    #[error("Dynamic profiling failed to connect to {name}: {source}")]
    Connect {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dynamic profiling socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dynamic profiling protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Dynamic profiling server rejected the parameters ({0:?})")]
    ParamsRejected(msprof_common::RspCode),

    #[error("Dynamic profiling client is already running")]
    AlreadyRunning,

    #[error("Dynamic profiling is not enabled")]
    NotEnabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_display_names_option() {
        let err = ModeError::Forbidden { args: "--query".to_string(), precheck: "parse".to_string() };
        assert_eq!(err.to_string(), "The argument --query is forbidden when --parse is not empty");
    }

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::OutOfRange {
            arg: ArgId::AicFreq,
            value: "101".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "Argument --aic-freq=101 is out of range, valid range is [1, 100]");
    }

    #[test]
    fn test_not_supported_is_distinct() {
        assert!(TaskError::not_supported(DeviceId(0), "container").is_not_supported());
        assert!(!TaskError::failed(DeviceId(0), "init").is_not_supported());
    }
}
