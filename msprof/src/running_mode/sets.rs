//! Per-mode option sets
//!
//! `black` options are fatal in a mode, `necessary` options must be given,
//! and anything outside `white` only earns a warning. For every mode
//! `necessary ⊆ white` and `black ∩ white = ∅`.

use crate::domain::{join_args, ArgId, ModeError};
use std::collections::BTreeSet;
use ArgId::{
    AiCore, AiVectorCore, AicFreq, AicMetrics, AicMode, Aicpu, Analyze, Application, Ascendcl, AivFreq, AivMetrics,
    AivMode, Clear, Delay, Duration, DvppFreq, DvppProfiling, Dynamic, Environment, Export, ExportType, GeApi,
    Hccl, HostSys, HostSysPid, HostSysUsage, HostSysUsageFreq, InstrProfiling, InstrProfilingFreq, IterationId, L2,
    LlcProfiling, ModelExecution, ModelId, Msproftx, MstxDomainExclude, MstxDomainInclude, Output, Parse, Pid,
    PythonPath, Query, Reports, Rule, RuntimeApi, StorageLimit, SummaryFormat, SysCpuFreq, SysCpuProfiling,
    SysDevices, SysHardwareMem, SysHardwareMemFreq, SysInterconnectionFreq, SysInterconnectionProfiling,
    SysIoProfiling, SysIoSamplingFreq, SysLp, SysLpFreq, SysPeriod, SysPidProfiling, SysPidSamplingFreq,
    SysProfiling, SysSamplingFreq, TaskMemory, TaskTime,
};

#[derive(Debug, Clone, Copy)]
pub struct ParamSets {
    /// Option named in diagnostics, without the leading dashes.
    pub precheck: &'static str,
    pub black: &'static [ArgId],
    pub white: &'static [ArgId],
    pub necessary: &'static [ArgId],
}

impl ParamSets {
    /// # Errors
    /// [`ModeError::Forbidden`] listing every forbidden option given.
    pub fn check_forbidden(&self, used: &BTreeSet<ArgId>) -> Result<(), ModeError> {
        let hit: Vec<&ArgId> = self.black.iter().filter(|id| used.contains(id)).collect();
        if hit.is_empty() {
            return Ok(());
        }
        Err(ModeError::Forbidden { args: join_args(hit), precheck: self.precheck.to_string() })
    }

    /// # Errors
    /// [`ModeError::MissingNecessary`] listing every missing option.
    pub fn check_necessary(&self, used: &BTreeSet<ArgId>) -> Result<(), ModeError> {
        let missing: Vec<&ArgId> = self.necessary.iter().filter(|id| !used.contains(id)).collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ModeError::MissingNecessary { args: join_args(missing), precheck: self.precheck.to_string() })
    }

    /// Options given that have no effect in this mode.
    #[must_use]
    pub fn useless<'u>(&self, used: &'u BTreeSet<ArgId>) -> Vec<&'u ArgId> {
        used.iter().filter(|id| !self.white.contains(id)).collect()
    }

    /// Print a warning naming every option without effect.
    pub fn warn_useless(&self, used: &BTreeSet<ArgId>) {
        let useless = self.useless(used);
        if !useless.is_empty() {
            eprintln!(
                "warning: The argument {} is useless when --{} is not empty",
                join_args(useless),
                self.precheck
            );
        }
    }
}

pub const APP: ParamSets = ParamSets {
    precheck: "application",
    black: &[],
    white: &[
        Output, StorageLimit, PythonPath, Application, Environment, Dynamic, Pid, Delay, Duration, Ascendcl,
        ModelExecution, RuntimeApi, TaskTime, Aicpu, Hccl, L2, GeApi, TaskMemory, Msproftx, MstxDomainInclude,
        MstxDomainExclude, AiCore, AicMode, AicMetrics, AicFreq, AiVectorCore, AivMode, AivMetrics, AivFreq,
        SysProfiling, SysSamplingFreq, SysPidProfiling, SysPidSamplingFreq, SysCpuProfiling, SysCpuFreq,
        SysIoProfiling, SysIoSamplingFreq, SysInterconnectionProfiling, SysInterconnectionFreq, DvppProfiling,
        DvppFreq, SysHardwareMem, SysHardwareMemFreq, LlcProfiling, SysLp, SysLpFreq, InstrProfiling,
        InstrProfilingFreq, HostSys, HostSysPid, HostSysUsage, HostSysUsageFreq,
    ],
    necessary: &[],
};

pub const SYSTEM: ParamSets = ParamSets {
    precheck: "sys-devices",
    black: &[Application, Environment, Dynamic, Pid, Delay, Duration, Parse, Query, Export, Analyze],
    white: &[
        Output, StorageLimit, PythonPath, AiCore, AicMode, AicMetrics, AicFreq, AiVectorCore, AivMode, AivMetrics,
        AivFreq, SysDevices, SysPeriod, SysProfiling, SysSamplingFreq, SysPidProfiling, SysPidSamplingFreq,
        SysCpuProfiling, SysCpuFreq, SysIoProfiling, SysIoSamplingFreq, SysInterconnectionProfiling,
        SysInterconnectionFreq, DvppProfiling, DvppFreq, SysHardwareMem, SysHardwareMemFreq, LlcProfiling, SysLp,
        SysLpFreq, InstrProfiling, InstrProfilingFreq, HostSys, HostSysPid, HostSysUsage, HostSysUsageFreq,
    ],
    necessary: &[Output],
};

/// Options that select devices or a window but never enable a collection
/// on their own.
pub const SYSTEM_SELECTORS: &[ArgId] = &[Output, StorageLimit, PythonPath, SysDevices, SysPeriod];

/// Options shared by every collecting mode that never pick one.
const COMMON: &[ArgId] = &[Output, StorageLimit, PythonPath];

/// Any system option beyond the common ones was given.
#[must_use]
pub fn selects_system(used: &BTreeSet<ArgId>) -> bool {
    used.iter().any(|id| SYSTEM.white.contains(id) && !COMMON.contains(id))
}

pub const PARSE: ParamSets = ParamSets {
    precheck: "parse",
    black: &[Query, Export, Analyze, Rule, Clear],
    white: &[Output, Parse, PythonPath],
    necessary: &[Output, Parse],
};

pub const QUERY: ParamSets = ParamSets {
    precheck: "query",
    black: &[Parse, Export, Analyze, Rule, Clear],
    white: &[Output, Query, PythonPath],
    necessary: &[Output, Query],
};

pub const EXPORT: ParamSets = ParamSets {
    precheck: "export",
    black: &[Query, Parse, Analyze, Rule],
    white: &[Output, Export, IterationId, ModelId, SummaryFormat, PythonPath, Clear, ExportType, Reports],
    necessary: &[Output, Export],
};

pub const EXPORT_DB: ParamSets = ParamSets {
    precheck: "export and --type",
    black: &[Query, Parse, Analyze, Rule, IterationId, ModelId, SummaryFormat, Clear, Reports],
    white: &[Output, Export, ExportType, PythonPath],
    necessary: &[Output, Export, ExportType],
};

pub const ANALYZE: ParamSets = ParamSets {
    precheck: "analyze",
    black: &[Query, Export, Parse],
    white: &[Output, Analyze, PythonPath, Rule, Clear, ExportType],
    necessary: &[Output, Analyze],
};
