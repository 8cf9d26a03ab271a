//! Profiling parameter store
//!
//! [`ProfileParams`] accumulates validated option values for one invocation.
//! It is serialized to JSON as the opaque configuration blob handed to the
//! launched application, the dynamic-profiling server and every job's
//! `sample.json`.
//!
//! `used_params` records which options were given explicitly. It is filled
//! during validation and read-only afterwards; mode pre-checks consult only
//! this set.

use crate::domain::ArgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfilingMode {
    #[serde(rename = "task-based")]
    TaskBased,
    #[serde(rename = "sample-based")]
    SampleBased,
}

impl fmt::Display for ProfilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfilingMode::TaskBased => f.write_str("task-based"),
            ProfilingMode::SampleBased => f.write_str("sample-based"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    #[default]
    Text,
    Db,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryFormat::Csv => f.write_str("csv"),
            SummaryFormat::Json => f.write_str("json"),
        }
    }
}

/// Host-side statistics selectable with `--host-sys` / `--host-sys-usage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostSys {
    Cpu,
    Mem,
    Disk,
    Network,
    Osrt,
}

impl HostSys {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "cpu" => HostSys::Cpu,
            "mem" => HostSys::Mem,
            "disk" => HostSys::Disk,
            "network" => HostSys::Network,
            "osrt" => HostSys::Osrt,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfMode {
    #[default]
    App,
    System,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileParams {
    pub job_id: String,
    pub result_dir: PathBuf,
    pub storage_limit_mb: Option<u32>,
    pub python_path: Option<String>,
    pub prof_mode: ProfMode,

    // Launch
    pub application: Option<String>,
    pub app_path: Option<PathBuf>,
    pub app_parameters: Vec<String>,
    pub app_env: Vec<(String, String)>,

    // Dynamic profiling
    pub dynamic: bool,
    pub dynamic_pid: Option<u32>,
    pub delay_secs: Option<u32>,
    pub duration_secs: Option<u32>,

    // Application-scoped traces
    pub acl: Option<bool>,
    pub model_execution: Option<bool>,
    pub runtime_api: Option<bool>,
    pub task_time: Option<String>,
    pub aicpu: Option<bool>,
    pub hccl: Option<bool>,
    pub l2: Option<bool>,
    pub ge_api: Option<String>,
    pub task_memory: Option<bool>,
    pub msproftx: Option<bool>,
    pub mstx_domain_include: Option<String>,
    pub mstx_domain_exclude: Option<String>,

    // AI core / AI vector core PMU
    pub ai_core: Option<bool>,
    pub ai_core_mode: Option<ProfilingMode>,
    pub aic_metrics: Option<String>,
    pub aic_freq: Option<u32>,
    pub ai_core_lpm: bool,
    pub aiv: Option<bool>,
    pub aiv_mode: Option<ProfilingMode>,
    pub aiv_metrics: Option<String>,
    pub aiv_freq: Option<u32>,

    // Device-side system sampling
    pub devices: Option<String>,
    pub profiling_period_secs: Option<u32>,
    pub sys_profiling: Option<bool>,
    pub sys_sampling_freq: Option<u32>,
    pub sys_pid_profiling: Option<bool>,
    pub sys_pid_sampling_freq: Option<u32>,
    pub sys_cpu_profiling: Option<bool>,
    pub sys_cpu_freq: Option<u32>,
    pub sys_io_profiling: Option<bool>,
    pub sys_io_sampling_freq: Option<u32>,
    pub sys_interconnection_profiling: Option<bool>,
    pub sys_interconnection_freq: Option<u32>,
    pub dvpp_profiling: Option<bool>,
    pub dvpp_freq: Option<u32>,
    pub hardware_mem: Option<bool>,
    pub hardware_mem_freq: Option<u32>,
    pub llc_profiling: Option<String>,
    pub sys_lp: Option<bool>,
    pub sys_lp_freq: Option<u32>,
    pub instr_profiling: Option<bool>,
    pub instr_profiling_freq: Option<u32>,
    pub qos_profiling: bool,

    // Host-side sampling
    pub host_sys: Vec<HostSys>,
    pub host_sys_pid: Option<u32>,
    pub host_sys_usage: Vec<HostSys>,
    pub host_sys_usage_freq: Option<u32>,
    pub host_profiling: bool,

    // Post-processing
    pub parse: bool,
    pub query: bool,
    pub export: bool,
    pub analyze: bool,
    pub rule: Option<String>,
    pub clear: bool,
    pub export_type: ExportType,
    pub summary_format: SummaryFormat,
    pub iteration_id: Option<u32>,
    pub model_id: Option<u32>,
    pub reports: Option<PathBuf>,

    #[serde(skip)]
    pub used_params: BTreeSet<ArgId>,
}

impl ProfileParams {
    /// Serialize into the opaque configuration blob.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// # Errors
    /// Malformed blob.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    #[must_use]
    pub fn is_used(&self, id: ArgId) -> bool {
        self.used_params.contains(&id)
    }

    /// Host-only statistics were requested (`--host-sys` or `--host-sys-usage`).
    #[must_use]
    pub fn is_host_profiling(&self) -> bool {
        !self.host_sys.is_empty() || !self.host_sys_usage.is_empty()
    }

    /// Any device-side system collection was requested, which needs an RPC
    /// task on the device in addition to the host-side task.
    #[must_use]
    pub fn is_device_job(&self) -> bool {
        [
            self.sys_profiling,
            self.sys_pid_profiling,
            self.sys_cpu_profiling,
            self.sys_io_profiling,
            self.sys_interconnection_profiling,
            self.dvpp_profiling,
            self.hardware_mem,
            self.sys_lp,
            self.instr_profiling,
        ]
        .iter()
        .any(|s| *s == Some(true))
            || self.llc_profiling.is_some()
    }

    /// Device list as given (`all` or comma-separated ids).
    #[must_use]
    pub fn device_list(&self) -> Vec<String> {
        self.devices
            .as_deref()
            .map(|d| d.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Convert a sampling frequency in Hz into an interval in milliseconds.
#[must_use]
pub fn freq_to_interval_ms(freq: u32) -> u32 {
    1000 / freq.max(1)
}
