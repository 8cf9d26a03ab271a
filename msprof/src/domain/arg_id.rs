//! Command-line option identifiers
//!
//! Every option that can appear in `usedParams` has one [`ArgId`]. Mode
//! black/white/necessary sets are expressed in these ids.

use std::fmt;

macro_rules! arg_ids {
    ($($variant:ident => $flag:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ArgId {
            $($variant,)*
        }

        impl ArgId {
            /// All option ids in declaration order.
            pub const ALL: &'static [ArgId] = &[$(ArgId::$variant,)*];

            /// Long option name without the leading dashes.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(ArgId::$variant => $flag,)*
                }
            }
        }
    };
}

arg_ids! {
    Output => "output",
    StorageLimit => "storage-limit",
    PythonPath => "python-path",
    Application => "application",
    Environment => "environment",
    Dynamic => "dynamic",
    Pid => "pid",
    Delay => "delay",
    Duration => "duration",
    Ascendcl => "ascendcl",
    ModelExecution => "model-execution",
    RuntimeApi => "runtime-api",
    TaskTime => "task-time",
    Aicpu => "aicpu",
    Hccl => "hccl",
    L2 => "l2",
    GeApi => "ge-api",
    TaskMemory => "task-memory",
    Msproftx => "msproftx",
    MstxDomainInclude => "mstx-domain-include",
    MstxDomainExclude => "mstx-domain-exclude",
    AiCore => "ai-core",
    AicMode => "aic-mode",
    AicMetrics => "aic-metrics",
    AicFreq => "aic-freq",
    AiVectorCore => "ai-vector-core",
    AivMode => "aiv-mode",
    AivMetrics => "aiv-metrics",
    AivFreq => "aiv-freq",
    SysDevices => "sys-devices",
    SysPeriod => "sys-period",
    SysProfiling => "sys-profiling",
    SysSamplingFreq => "sys-sampling-freq",
    SysPidProfiling => "sys-pid-profiling",
    SysPidSamplingFreq => "sys-pid-sampling-freq",
    SysCpuProfiling => "sys-cpu-profiling",
    SysCpuFreq => "sys-cpu-freq",
    SysIoProfiling => "sys-io-profiling",
    SysIoSamplingFreq => "sys-io-sampling-freq",
    SysInterconnectionProfiling => "sys-interconnection-profiling",
    SysInterconnectionFreq => "sys-interconnection-freq",
    DvppProfiling => "dvpp-profiling",
    DvppFreq => "dvpp-freq",
    SysHardwareMem => "sys-hardware-mem",
    SysHardwareMemFreq => "sys-hardware-mem-freq",
    LlcProfiling => "llc-profiling",
    SysLp => "sys-lp",
    SysLpFreq => "sys-lp-freq",
    InstrProfiling => "instr-profiling",
    InstrProfilingFreq => "instr-profiling-freq",
    HostSys => "host-sys",
    HostSysPid => "host-sys-pid",
    HostSysUsage => "host-sys-usage",
    HostSysUsageFreq => "host-sys-usage-freq",
    Parse => "parse",
    Query => "query",
    Export => "export",
    Analyze => "analyze",
    Rule => "rule",
    Clear => "clear",
    ExportType => "type",
    SummaryFormat => "summary-format",
    IterationId => "iteration-id",
    ModelId => "model-id",
    Reports => "reports",
}

impl fmt::Display for ArgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name())
    }
}

/// Join option names as `--a, --b` for diagnostics.
pub fn join_args<'a>(ids: impl IntoIterator<Item = &'a ArgId>) -> String {
    ids.into_iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_has_dashes() {
        assert_eq!(ArgId::Output.to_string(), "--output");
        assert_eq!(ArgId::ExportType.to_string(), "--type");
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ArgId::ALL.iter().map(|id| id.name()).collect();
        assert_eq!(names.len(), ArgId::ALL.len());
    }

    #[test]
    fn test_join_args() {
        assert_eq!(join_args(&[ArgId::Query, ArgId::Export]), "--query, --export");
    }
}
