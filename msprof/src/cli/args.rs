//! CLI argument definitions
//!
//! Options are taken as raw text and checked by [`crate::validation`], so
//! every rejection carries the same wording regardless of which option failed.

use crate::domain::ArgId;
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "msprof",
    version,
    about = "Profile applications and devices on Ascend AI accelerators",
    after_help = "\
EXAMPLES:
    msprof --output=/tmp/prof --application=\"./train.sh --epochs 1\"
    msprof --output=/tmp/prof ./infer --batch 8             App arguments after the options
    msprof --dynamic=on --pid=4242 --output=/tmp/prof         Attach to a running app
    msprof --sys-devices=0 --sys-period=10 --sys-pid-profiling=on --output=/tmp/prof
    msprof --export=on --output=/tmp/prof/PROF_000001_xxx     Export collected data"
)]
pub struct Args {
    // ── Output ───────────────────────────────────────────────────────────
    /// Result directory (default: $ASCEND_WORK_PATH/profiling_data, or the current dir)
    #[arg(long, value_name = "DIR")]
    pub output: Option<String>,

    /// Disk quota for collected data, e.g. 500MB
    #[arg(long, value_name = "SIZE")]
    pub storage_limit: Option<String>,

    /// Python interpreter used for parse/export/query/analyze (default: python3)
    #[arg(long, value_name = "PATH")]
    pub python_path: Option<String>,

    // ── Launch ───────────────────────────────────────────────────────────
    /// Application command line to launch and profile
    #[arg(long, value_name = "CMD")]
    pub application: Option<String>,

    /// Extra environment for the application, `K=V` pairs separated by `;`
    #[arg(long, value_name = "ENV")]
    pub environment: Option<String>,

    // ── Dynamic profiling ────────────────────────────────────────────────
    /// Start/stop collection interactively (on|off)
    #[arg(long, value_name = "on|off")]
    pub dynamic: Option<String>,

    /// Attach dynamic profiling to a running process
    #[arg(long, value_name = "PID")]
    pub pid: Option<String>,

    /// Seconds to wait before collection starts
    #[arg(long, value_name = "SECS")]
    pub delay: Option<String>,

    /// Seconds to collect before stopping
    #[arg(long, value_name = "SECS")]
    pub duration: Option<String>,

    // ── Application traces ───────────────────────────────────────────────
    #[arg(long, value_name = "on|off")]
    pub ascendcl: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub model_execution: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub runtime_api: Option<String>,
    /// Task timeline level (on|off|l0|l1|l2|l3)
    #[arg(long, value_name = "LEVEL")]
    pub task_time: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub aicpu: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub hccl: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub l2: Option<String>,
    /// Graph engine API level (off|l0|l1)
    #[arg(long, value_name = "LEVEL")]
    pub ge_api: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub task_memory: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub msproftx: Option<String>,
    #[arg(long, value_name = "DOMAINS")]
    pub mstx_domain_include: Option<String>,
    #[arg(long, value_name = "DOMAINS")]
    pub mstx_domain_exclude: Option<String>,

    // ── AI core PMU ──────────────────────────────────────────────────────
    #[arg(long, value_name = "on|off")]
    pub ai_core: Option<String>,
    #[arg(long, value_name = "MODE")]
    pub aic_mode: Option<String>,
    /// Metric groups, or `Custom:<events>`
    #[arg(long, value_name = "METRICS")]
    pub aic_metrics: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub aic_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub ai_vector_core: Option<String>,
    #[arg(long, value_name = "MODE")]
    pub aiv_mode: Option<String>,
    #[arg(long, value_name = "METRICS")]
    pub aiv_metrics: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub aiv_freq: Option<String>,

    // ── System sampling ──────────────────────────────────────────────────
    /// Devices to sample (`all` or comma-separated ids)
    #[arg(long, value_name = "IDS")]
    pub sys_devices: Option<String>,
    /// Sampling period in seconds
    #[arg(long, value_name = "SECS")]
    pub sys_period: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_sampling_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_pid_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_pid_sampling_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_cpu_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_cpu_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_io_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_io_sampling_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_interconnection_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_interconnection_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub dvpp_profiling: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub dvpp_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_hardware_mem: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_hardware_mem_freq: Option<String>,
    /// LLC events (read|write, or capacity|bandwidth)
    #[arg(long, value_name = "EVENTS")]
    pub llc_profiling: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub sys_lp: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub sys_lp_freq: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub instr_profiling: Option<String>,
    #[arg(long, value_name = "CYCLES")]
    pub instr_profiling_freq: Option<String>,

    // ── Host sampling ────────────────────────────────────────────────────
    /// Host statistics (cpu,mem,disk,network,osrt)
    #[arg(long, value_name = "LIST")]
    pub host_sys: Option<String>,
    #[arg(long, value_name = "PID")]
    pub host_sys_pid: Option<String>,
    /// Host usage of all processes (cpu,mem)
    #[arg(long, value_name = "LIST")]
    pub host_sys_usage: Option<String>,
    #[arg(long, value_name = "HZ")]
    pub host_sys_usage_freq: Option<String>,

    // ── Post-processing ──────────────────────────────────────────────────
    #[arg(long, value_name = "on|off")]
    pub parse: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub query: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub export: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub analyze: Option<String>,
    /// Analysis rules (communication,communication_matrix)
    #[arg(long, value_name = "RULES")]
    pub rule: Option<String>,
    #[arg(long, value_name = "on|off")]
    pub clear: Option<String>,
    /// Export type (text|db)
    #[arg(long = "type", value_name = "TYPE")]
    pub export_type: Option<String>,
    /// Summary format (csv|json)
    #[arg(long, value_name = "FORMAT")]
    pub summary_format: Option<String>,
    #[arg(long, value_name = "ID")]
    pub iteration_id: Option<String>,
    #[arg(long, value_name = "ID")]
    pub model_id: Option<String>,
    /// Report configuration file for timeline export
    #[arg(long, value_name = "FILE")]
    pub reports: Option<String>,

    /// Application and its arguments, when --application is not used
    #[arg(value_name = "APP", trailing_var_arg = true, allow_hyphen_values = true)]
    pub app_args: Vec<String>,
}

impl Args {
    /// Raw text given for an option, `None` if absent.
    #[must_use]
    pub fn raw(&self, id: ArgId) -> Option<&str> {
        let value = match id {
            ArgId::Output => &self.output,
            ArgId::StorageLimit => &self.storage_limit,
            ArgId::PythonPath => &self.python_path,
            ArgId::Application => &self.application,
            ArgId::Environment => &self.environment,
            ArgId::Dynamic => &self.dynamic,
            ArgId::Pid => &self.pid,
            ArgId::Delay => &self.delay,
            ArgId::Duration => &self.duration,
            ArgId::Ascendcl => &self.ascendcl,
            ArgId::ModelExecution => &self.model_execution,
            ArgId::RuntimeApi => &self.runtime_api,
            ArgId::TaskTime => &self.task_time,
            ArgId::Aicpu => &self.aicpu,
            ArgId::Hccl => &self.hccl,
            ArgId::L2 => &self.l2,
            ArgId::GeApi => &self.ge_api,
            ArgId::TaskMemory => &self.task_memory,
            ArgId::Msproftx => &self.msproftx,
            ArgId::MstxDomainInclude => &self.mstx_domain_include,
            ArgId::MstxDomainExclude => &self.mstx_domain_exclude,
            ArgId::AiCore => &self.ai_core,
            ArgId::AicMode => &self.aic_mode,
            ArgId::AicMetrics => &self.aic_metrics,
            ArgId::AicFreq => &self.aic_freq,
            ArgId::AiVectorCore => &self.ai_vector_core,
            ArgId::AivMode => &self.aiv_mode,
            ArgId::AivMetrics => &self.aiv_metrics,
            ArgId::AivFreq => &self.aiv_freq,
            ArgId::SysDevices => &self.sys_devices,
            ArgId::SysPeriod => &self.sys_period,
            ArgId::SysProfiling => &self.sys_profiling,
            ArgId::SysSamplingFreq => &self.sys_sampling_freq,
            ArgId::SysPidProfiling => &self.sys_pid_profiling,
            ArgId::SysPidSamplingFreq => &self.sys_pid_sampling_freq,
            ArgId::SysCpuProfiling => &self.sys_cpu_profiling,
            ArgId::SysCpuFreq => &self.sys_cpu_freq,
            ArgId::SysIoProfiling => &self.sys_io_profiling,
            ArgId::SysIoSamplingFreq => &self.sys_io_sampling_freq,
            ArgId::SysInterconnectionProfiling => &self.sys_interconnection_profiling,
            ArgId::SysInterconnectionFreq => &self.sys_interconnection_freq,
            ArgId::DvppProfiling => &self.dvpp_profiling,
            ArgId::DvppFreq => &self.dvpp_freq,
            ArgId::SysHardwareMem => &self.sys_hardware_mem,
            ArgId::SysHardwareMemFreq => &self.sys_hardware_mem_freq,
            ArgId::LlcProfiling => &self.llc_profiling,
            ArgId::SysLp => &self.sys_lp,
            ArgId::SysLpFreq => &self.sys_lp_freq,
            ArgId::InstrProfiling => &self.instr_profiling,
            ArgId::InstrProfilingFreq => &self.instr_profiling_freq,
            ArgId::HostSys => &self.host_sys,
            ArgId::HostSysPid => &self.host_sys_pid,
            ArgId::HostSysUsage => &self.host_sys_usage,
            ArgId::HostSysUsageFreq => &self.host_sys_usage_freq,
            ArgId::Parse => &self.parse,
            ArgId::Query => &self.query,
            ArgId::Export => &self.export,
            ArgId::Analyze => &self.analyze,
            ArgId::Rule => &self.rule,
            ArgId::Clear => &self.clear,
            ArgId::ExportType => &self.export_type,
            ArgId::SummaryFormat => &self.summary_format,
            ArgId::IterationId => &self.iteration_id,
            ArgId::ModelId => &self.model_id,
            ArgId::Reports => &self.reports,
        };
        value.as_deref()
    }

    /// Options given on the command line, in declaration order.
    pub fn used(&self) -> impl Iterator<Item = ArgId> + '_ {
        ArgId::ALL.iter().copied().filter(|id| self.raw(*id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_syntax_and_trailing_app() {
        let args = Args::try_parse_from([
            "msprof",
            "--output=/tmp/x",
            "--task-time=l1",
            "./myapp",
            "--batch",
            "8",
        ])
        .unwrap();
        assert_eq!(args.raw(ArgId::Output), Some("/tmp/x"));
        assert_eq!(args.raw(ArgId::TaskTime), Some("l1"));
        assert_eq!(args.app_args, vec!["./myapp", "--batch", "8"]);
    }

    #[test]
    fn test_used_lists_only_given_options() {
        let args = Args::try_parse_from(["msprof", "--type=db", "--export=on"]).unwrap();
        let used: Vec<_> = args.used().collect();
        assert_eq!(used, vec![ArgId::Export, ArgId::ExportType]);
    }
}
