//! Command-line validation
//!
//! [`ParamValidator`] turns the raw option text collected by [`Args`] into a
//! [`ProfileParams`]. Every option is checked on its own first, in
//! declaration order, then the cross-option rules (dynamic profiling,
//! mstx domains, output defaulting) run over the result. The first
//! rejection aborts validation, so no mode ever runs on partial input.

pub mod metrics;
pub mod paths;

use crate::cli::Args;
use crate::domain::{ArgId, ValidationError};
use crate::params::{ExportType, HostSys, ProfileParams, ProfilingMode, SummaryFormat};
use crate::platform::{Feature, Platform};
use crate::preflight::{self, find_on_path};
use crate::process_lookup::{process_exists, process_name};
use log::debug;

/// Largest pid the kernel hands out (`pid_max` upper bound).
pub const PROF_MAX_DYNAMIC_PID: u32 = 4_194_304;

/// Storage limit floor in MB.
pub const STORAGE_LIMIT_MIN_MB: u32 = 200;

/// Longest accepted `--sys-period`, 30 days.
pub const MAX_SYS_PERIOD_SECS: u32 = 2_592_000;

/// Device ids are below this bound.
pub const MAX_DEVICE_ID: u32 = 64;

const RULES: &[&str] = &["communication", "communication_matrix"];

pub struct ParamValidator<'a> {
    platform: &'a dyn Platform,
}

impl<'a> ParamValidator<'a> {
    #[must_use]
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    /// Validate every given option and the rules between them.
    ///
    /// # Errors
    /// The first rejected option or option combination.
    pub fn validate(&self, args: &Args) -> Result<ProfileParams, ValidationError> {
        let mut params = ProfileParams::default();
        for id in args.used() {
            let raw = args.raw(id).unwrap_or_default();
            params.used_params.insert(id);
            self.check_option(id, raw, &mut params)?;
        }

        if !args.app_args.is_empty() {
            if params.application.is_some() {
                debug!("--application given, ignoring positional command {:?}", args.app_args);
            } else {
                let spec = paths::application_argv(&args.app_args)?;
                params.used_params.insert(ArgId::Application);
                params.application = Some(spec.name);
                params.app_path = Some(spec.program);
                params.app_parameters = spec.parameters;
            }
        }

        check_dynamic(&params)?;
        check_mstx(&params)?;
        params.host_profiling = params.is_host_profiling();

        if params.result_dir.as_os_str().is_empty() {
            if let Some(root) = paths::default_output_root(params.application.is_some())? {
                params.result_dir = root;
            }
        }
        Ok(params)
    }

    fn check_option(&self, id: ArgId, raw: &str, params: &mut ProfileParams) -> Result<(), ValidationError> {
        match id {
            ArgId::Output => params.result_dir = paths::output_dir(id, raw)?,
            ArgId::StorageLimit => params.storage_limit_mb = Some(storage_limit(raw)?),
            ArgId::PythonPath => params.python_path = Some(paths::python_path(raw)?),
            ArgId::Application => {
                let spec = paths::application(raw)?;
                params.application = Some(spec.name);
                params.app_path = Some(spec.program);
                params.app_parameters = spec.parameters;
            }
            ArgId::Environment => params.app_env = paths::environment(raw)?,

            ArgId::Dynamic => params.dynamic = on_off(id, raw)?,
            ArgId::Pid => {
                let pid = range(id, raw, 1, PROF_MAX_DYNAMIC_PID)?;
                if !process_exists(pid) {
                    return Err(ValidationError::invalid(id, raw, "The process does not exist"));
                }
                if let Ok(name) = process_name(pid) {
                    debug!("dynamic profiling target {name} ({pid})");
                }
                params.dynamic_pid = Some(pid);
            }
            ArgId::Delay => params.delay_secs = Some(range(id, raw, 1, u32::MAX)?),
            ArgId::Duration => params.duration_secs = Some(range(id, raw, 1, u32::MAX)?),

            ArgId::Ascendcl => params.acl = Some(on_off(id, raw)?),
            ArgId::ModelExecution => {
                eprintln!("warning: [Note] [model-execution] This option will be discarded in later versions.");
                params.model_execution = Some(on_off(id, raw)?);
            }
            ArgId::RuntimeApi => params.runtime_api = Some(on_off(id, raw)?),
            ArgId::TaskTime => params.task_time = Some(self.task_time(raw)?),
            ArgId::Aicpu => params.aicpu = Some(on_off(id, raw)?),
            ArgId::Hccl => {
                eprintln!("warning: [Note] [hccl] This option will be discarded in later versions.");
                params.hccl = Some(on_off(id, raw)?);
            }
            ArgId::L2 => params.l2 = Some(on_off(id, raw)?),
            ArgId::GeApi => params.ge_api = Some(one_of(id, raw, &["off", "l0", "l1"])?.to_string()),
            ArgId::TaskMemory => params.task_memory = Some(on_off(id, raw)?),
            ArgId::Msproftx => params.msproftx = Some(on_off(id, raw)?),
            ArgId::MstxDomainInclude => params.mstx_domain_include = Some(non_empty(id, raw)?),
            ArgId::MstxDomainExclude => params.mstx_domain_exclude = Some(non_empty(id, raw)?),

            ArgId::AiCore => params.ai_core = Some(on_off(id, raw)?),
            ArgId::AicMode => params.ai_core_mode = Some(profiling_mode(id, raw)?),
            ArgId::AicMetrics => params.aic_metrics = Some(metrics::normalize(id, raw, self.platform)?),
            ArgId::AicFreq => params.aic_freq = Some(range(id, raw, 1, 100)?),
            ArgId::AiVectorCore => params.aiv = Some(on_off(id, raw)?),
            ArgId::AivMode => params.aiv_mode = Some(profiling_mode(id, raw)?),
            ArgId::AivMetrics => params.aiv_metrics = Some(metrics::normalize(id, raw, self.platform)?),
            ArgId::AivFreq => params.aiv_freq = Some(range(id, raw, 1, 100)?),

            ArgId::SysDevices => params.devices = Some(sys_devices(raw)?),
            ArgId::SysPeriod => params.profiling_period_secs = Some(range(id, raw, 1, MAX_SYS_PERIOD_SECS)?),
            ArgId::SysProfiling => params.sys_profiling = Some(on_off(id, raw)?),
            ArgId::SysSamplingFreq => params.sys_sampling_freq = Some(range(id, raw, 1, 10)?),
            ArgId::SysPidProfiling => params.sys_pid_profiling = Some(on_off(id, raw)?),
            ArgId::SysPidSamplingFreq => params.sys_pid_sampling_freq = Some(range(id, raw, 1, 10)?),
            ArgId::SysCpuProfiling => {
                let on = on_off(id, raw)?;
                // On the device control CPU the samples come from perf
                if on && self.platform.soc_side() && find_on_path("perf").is_none() {
                    return Err(ValidationError::ToolMissing { tool: "perf".to_string() });
                }
                params.sys_cpu_profiling = Some(on);
            }
            ArgId::SysCpuFreq => params.sys_cpu_freq = Some(range(id, raw, 1, 50)?),
            ArgId::SysIoProfiling => params.sys_io_profiling = Some(on_off(id, raw)?),
            ArgId::SysIoSamplingFreq => params.sys_io_sampling_freq = Some(range(id, raw, 1, 100)?),
            ArgId::SysInterconnectionProfiling => params.sys_interconnection_profiling = Some(on_off(id, raw)?),
            ArgId::SysInterconnectionFreq => params.sys_interconnection_freq = Some(range(id, raw, 1, 50)?),
            ArgId::DvppProfiling => params.dvpp_profiling = Some(on_off(id, raw)?),
            ArgId::DvppFreq => params.dvpp_freq = Some(range(id, raw, 1, 100)?),
            ArgId::SysHardwareMem => params.hardware_mem = Some(on_off(id, raw)?),
            ArgId::SysHardwareMemFreq => {
                let max = if self.platform.supports(Feature::HardwareMemHighFreq) { 10_000 } else { 100 };
                params.hardware_mem_freq = Some(range(id, raw, 1, max)?);
            }
            ArgId::LlcProfiling => {
                let allowed: &[&str] = if self.platform.supports(Feature::LlcCapacityBandwidth) {
                    &["capacity", "bandwidth"]
                } else {
                    &["read", "write"]
                };
                params.llc_profiling = Some(one_of(id, raw, allowed)?.to_string());
            }
            ArgId::SysLp => {
                self.require(Feature::SysLowPower, id, raw)?;
                params.sys_lp = Some(on_off(id, raw)?);
            }
            ArgId::SysLpFreq => params.sys_lp_freq = Some(range(id, raw, 1, 100)?),
            ArgId::InstrProfiling => {
                self.require(Feature::InstrProfiling, id, raw)?;
                params.instr_profiling = Some(on_off(id, raw)?);
            }
            ArgId::InstrProfilingFreq => params.instr_profiling_freq = Some(range(id, raw, 300, 30_000)?),

            ArgId::HostSys => {
                let all = [HostSys::Cpu, HostSys::Mem, HostSys::Disk, HostSys::Network, HostSys::Osrt];
                let sources = host_sys_list(id, raw, &all)?;
                preflight::check_host_tools(&sources)?;
                params.host_sys = sources;
            }
            ArgId::HostSysPid => {
                let pid = range(id, raw, 0, PROF_MAX_DYNAMIC_PID)?;
                if !process_exists(pid) {
                    return Err(ValidationError::invalid(id, raw, "The process does not exist"));
                }
                params.host_sys_pid = Some(pid);
            }
            ArgId::HostSysUsage => params.host_sys_usage = host_sys_list(id, raw, &[HostSys::Cpu, HostSys::Mem])?,
            ArgId::HostSysUsageFreq => params.host_sys_usage_freq = Some(range(id, raw, 1, 50)?),

            ArgId::Parse => params.parse = on_off(id, raw)?,
            ArgId::Query => params.query = on_off(id, raw)?,
            ArgId::Export => params.export = on_off(id, raw)?,
            ArgId::Analyze => params.analyze = on_off(id, raw)?,
            ArgId::Rule => params.rule = Some(rule(raw)?),
            ArgId::Clear => params.clear = on_off(id, raw)?,
            ArgId::ExportType => {
                params.export_type = match one_of(id, raw, &["text", "db"])? {
                    "db" => ExportType::Db,
                    _ => ExportType::Text,
                };
            }
            ArgId::SummaryFormat => {
                params.summary_format = match one_of(id, raw, &["csv", "json"])? {
                    "json" => SummaryFormat::Json,
                    _ => SummaryFormat::Csv,
                };
            }
            ArgId::IterationId => params.iteration_id = Some(range(id, raw, 0, u32::MAX)?),
            ArgId::ModelId => params.model_id = Some(range(id, raw, 0, u32::MAX)?),
            ArgId::Reports => params.reports = Some(paths::reports(raw)?),
        }
        Ok(())
    }

    fn task_time(&self, raw: &str) -> Result<String, ValidationError> {
        let mut levels = vec!["on", "off", "l0", "l1", "l2"];
        if self.platform.supports(Feature::TaskTimeL3) {
            levels.push("l3");
        }
        one_of(ArgId::TaskTime, raw, &levels).map(String::from)
    }

    fn require(&self, feature: Feature, id: ArgId, raw: &str) -> Result<(), ValidationError> {
        if self.platform.supports(feature) {
            Ok(())
        } else {
            Err(ValidationError::invalid(id, raw, "The option is not supported on this platform"))
        }
    }
}

fn non_empty(id: ArgId, raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        Err(ValidationError::Empty(id))
    } else {
        Ok(raw.to_string())
    }
}

fn on_off(id: ArgId, raw: &str) -> Result<bool, ValidationError> {
    match one_of(id, raw, &["on", "off"])? {
        "on" => Ok(true),
        _ => Ok(false),
    }
}

/// Accept `raw` if it is one of `allowed`, returning the matching entry.
fn one_of<'s>(id: ArgId, raw: &str, allowed: &[&'s str]) -> Result<&'s str, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    allowed.iter().copied().find(|v| *v == raw).ok_or_else(|| {
        let quoted: Vec<String> = allowed.iter().map(|v| format!("'{v}'")).collect();
        ValidationError::invalid(id, raw, format!("Please input {}.", quoted.join(" or ")))
    })
}

fn profiling_mode(id: ArgId, raw: &str) -> Result<ProfilingMode, ValidationError> {
    match one_of(id, raw, &["task-based", "sample-based"])? {
        "sample-based" => Ok(ProfilingMode::SampleBased),
        _ => Ok(ProfilingMode::TaskBased),
    }
}

/// Unsigned integer in `[min, max]`.
///
/// # Errors
/// Empty, non-numeric or out of range.
pub fn range(id: ArgId, raw: &str, min: u32, max: u32) -> Result<u32, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid(id, raw, format!("Please input an integer value in {min}-{max}.")));
    }
    let out_of_range =
        || ValidationError::OutOfRange { arg: id, value: raw.to_string(), min: min.into(), max: max.into() };
    let value: u64 = raw.parse().map_err(|_| out_of_range())?;
    if value < u64::from(min) || value > u64::from(max) {
        return Err(out_of_range());
    }
    u32::try_from(value).map_err(|_| out_of_range())
}

/// `<N>MB` with N in `[200, u32::MAX]`.
fn storage_limit(raw: &str) -> Result<u32, ValidationError> {
    let id = ArgId::StorageLimit;
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    let invalid = || {
        ValidationError::invalid(id, raw, format!("Valid range is {STORAGE_LIMIT_MIN_MB}MB~{}MB", u32::MAX))
    };
    let digits = raw.strip_suffix("MB").ok_or_else(invalid)?;
    if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    if value < u64::from(STORAGE_LIMIT_MIN_MB) {
        return Err(invalid());
    }
    u32::try_from(value).map_err(|_| invalid())
}

/// `all`, or comma-separated device ids below [`MAX_DEVICE_ID`].
fn sys_devices(raw: &str) -> Result<String, ValidationError> {
    let id = ArgId::SysDevices;
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    if raw == "all" {
        return Ok(raw.to_string());
    }
    for device in raw.split(',') {
        let valid = !device.is_empty()
            && device.bytes().all(|b| b.is_ascii_digit())
            && device.parse::<u32>().is_ok_and(|d| d < MAX_DEVICE_ID);
        if !valid {
            return Err(ValidationError::invalid(id, raw, format!("{device} is not a valid device id.")));
        }
    }
    Ok(raw.to_string())
}

fn host_sys_list(id: ArgId, raw: &str, allowed: &[HostSys]) -> Result<Vec<HostSys>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    let mut out = Vec::new();
    for item in raw.split(',') {
        let kind = HostSys::parse(item)
            .filter(|k| allowed.contains(k))
            .ok_or_else(|| ValidationError::invalid(id, raw, format!("{item} is not a supported host statistic.")))?;
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    Ok(out)
}

fn rule(raw: &str) -> Result<String, ValidationError> {
    let id = ArgId::Rule;
    if raw.is_empty() {
        return Err(ValidationError::Empty(id));
    }
    for item in raw.split(',') {
        if !RULES.contains(&item) {
            return Err(ValidationError::invalid(
                id,
                raw,
                "Please input 'communication' or 'communication_matrix'.",
            ));
        }
    }
    Ok(raw.to_string())
}

/// `--pid` needs dynamic mode; dynamic mode needs exactly one target and
/// excludes fixed-period system collection.
fn check_dynamic(params: &ProfileParams) -> Result<(), ValidationError> {
    if !params.dynamic {
        if params.dynamic_pid.is_some() {
            return Err(ValidationError::Requires { arg: ArgId::Pid, requirement: "--dynamic=on".to_string() });
        }
        return Ok(());
    }
    match (params.application.is_some(), params.dynamic_pid.is_some()) {
        (false, false) => {
            return Err(ValidationError::Requires {
                arg: ArgId::Dynamic,
                requirement: "one of --application or --pid".to_string(),
            })
        }
        (true, true) => return Err(ValidationError::Conflict { first: ArgId::Application, second: ArgId::Pid }),
        _ => {}
    }
    for conflict in [ArgId::SysDevices, ArgId::SysPeriod, ArgId::SysCpuProfiling] {
        if params.is_used(conflict) {
            return Err(ValidationError::Conflict { first: ArgId::Dynamic, second: conflict });
        }
    }
    Ok(())
}

fn check_mstx(params: &ProfileParams) -> Result<(), ValidationError> {
    let include = params.mstx_domain_include.is_some();
    let exclude = params.mstx_domain_exclude.is_some();
    if params.msproftx != Some(true) {
        if include || exclude {
            let arg = if include { ArgId::MstxDomainInclude } else { ArgId::MstxDomainExclude };
            return Err(ValidationError::Requires { arg, requirement: "--msproftx=on".to_string() });
        }
        return Ok(());
    }
    if include && exclude {
        return Err(ValidationError::Conflict { first: ArgId::MstxDomainInclude, second: ArgId::MstxDomainExclude });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HostPlatform, PlatformType};
    use clap::Parser;

    fn validate(argv: &[&str]) -> Result<ProfileParams, ValidationError> {
        let platform = HostPlatform::new(PlatformType::CloudV2, false);
        let args = Args::try_parse_from(std::iter::once("msprof").chain(argv.iter().copied())).unwrap();
        ParamValidator::new(&platform).validate(&args)
    }

    /// Every bounded numeric option outside the pid ones, with its range on
    /// a CloudV2 host.
    const BOUNDED: &[(&str, u64, u64)] = &[
        ("--aic-freq", 1, 100),
        ("--aiv-freq", 1, 100),
        ("--sys-sampling-freq", 1, 10),
        ("--sys-pid-sampling-freq", 1, 10),
        ("--sys-cpu-freq", 1, 50),
        ("--sys-io-sampling-freq", 1, 100),
        ("--sys-interconnection-freq", 1, 50),
        ("--dvpp-freq", 1, 100),
        ("--sys-hardware-mem-freq", 1, 10_000),
        ("--sys-lp-freq", 1, 100),
        ("--instr-profiling-freq", 300, 30_000),
        ("--host-sys-usage-freq", 1, 50),
        ("--sys-period", 1, MAX_SYS_PERIOD_SECS as u64),
        ("--delay", 1, u32::MAX as u64),
        ("--duration", 1, u32::MAX as u64),
        ("--iteration-id", 0, u32::MAX as u64),
        ("--model-id", 0, u32::MAX as u64),
    ];

    #[test]
    fn test_numeric_boundaries() {
        for &(flag, min, max) in BOUNDED {
            let at = |v: u64| validate(&[&format!("{flag}={v}")]);
            if min > 0 {
                assert!(
                    matches!(at(min - 1), Err(ValidationError::OutOfRange { .. })),
                    "{flag}={} accepted",
                    min - 1
                );
            }
            assert!(at(min).is_ok(), "{flag}={min} rejected");
            assert!(at(max).is_ok(), "{flag}={max} rejected");
            assert!(matches!(at(max + 1), Err(ValidationError::OutOfRange { .. })), "{flag}={} accepted", max + 1);
        }
    }

    #[test]
    fn test_hardware_mem_freq_capped_without_high_frequency() {
        let mini = HostPlatform::new(PlatformType::Mini, false);
        let at = |v: u32| {
            let args = Args::try_parse_from(["msprof".to_string(), format!("--sys-hardware-mem-freq={v}")]).unwrap();
            ParamValidator::new(&mini).validate(&args)
        };
        assert!(at(100).is_ok());
        assert!(matches!(at(101), Err(ValidationError::OutOfRange { max: 100, .. })));
    }

    #[test]
    fn test_pid_boundaries() {
        let me = std::process::id();
        let max = PROF_MAX_DYNAMIC_PID;
        for pid in [0, max + 1] {
            let err = validate(&["--dynamic=on", &format!("--pid={pid}")]).unwrap_err();
            assert!(matches!(err, ValidationError::OutOfRange { min: 1, .. }), "--pid={pid}: {err}");
        }
        assert!(validate(&["--dynamic=on", &format!("--pid={me}")]).is_ok());

        let err = validate(&[&format!("--host-sys-pid={}", max + 1)]).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { min: 0, .. }));
        assert!(validate(&[&format!("--host-sys-pid={me}")]).is_ok());
    }

    #[test]
    fn test_range_rejects_garbage() {
        assert!(matches!(range(ArgId::AicFreq, "1x", 1, 100), Err(ValidationError::InvalidValue { .. })));
        assert!(matches!(range(ArgId::AicFreq, "", 1, 100), Err(ValidationError::Empty(_))));
        assert!(range(ArgId::Delay, "99999999999999999999", 1, u32::MAX).is_err());
    }

    #[test]
    fn test_storage_limit() {
        assert_eq!(storage_limit("200MB").unwrap(), 200);
        assert_eq!(storage_limit("4294967295MB").unwrap(), u32::MAX);
        assert!(storage_limit("199MB").is_err());
        assert!(storage_limit("4294967296MB").is_err());
        assert!(storage_limit("500").is_err());
        assert!(storage_limit("MB").is_err());
        assert!(storage_limit("+500MB").is_err());
    }

    #[test]
    fn test_switches_and_levels() {
        let params = validate(&["--ascendcl=off", "--task-time=l3", "--ge-api=l1", "--type=db"]).unwrap();
        assert_eq!(params.acl, Some(false));
        assert_eq!(params.task_time.as_deref(), Some("l3"));
        assert_eq!(params.export_type, ExportType::Db);
        assert!(params.is_used(ArgId::GeApi));

        assert!(validate(&["--ascendcl=yes"]).is_err());
        let mini = HostPlatform::new(PlatformType::Mini, false);
        let args = Args::try_parse_from(["msprof", "--task-time=l3"]).unwrap();
        assert!(ParamValidator::new(&mini).validate(&args).is_err());
    }

    #[test]
    fn test_sys_devices() {
        assert!(validate(&["--sys-devices=all"]).is_ok());
        assert_eq!(validate(&["--sys-devices=0,3"]).unwrap().device_list(), vec!["0", "3"]);
        assert!(validate(&["--sys-devices=64"]).is_err());
        assert!(validate(&["--sys-devices=a"]).is_err());
        assert!(validate(&["--sys-devices=0,,1"]).is_err());
        assert!(validate(&["--sys-period=0"]).is_err());
        assert!(validate(&["--sys-period=2592000"]).is_ok());
    }

    #[test]
    fn test_host_sys_dedup_and_usage_subset() {
        let params = validate(&["--host-sys=cpu,mem,cpu", "--host-sys-usage=mem"]).unwrap();
        assert_eq!(params.host_sys, vec![HostSys::Cpu, HostSys::Mem]);
        assert!(params.host_profiling);
        assert!(validate(&["--host-sys-usage=network"]).is_err());
        assert!(validate(&["--host-sys=gpu"]).is_err());
    }

    #[test]
    fn test_dynamic_rules() {
        let me = std::process::id().to_string();
        let pid = format!("--pid={me}");
        assert!(validate(&[&pid]).is_err(), "--pid without --dynamic");
        assert!(validate(&["--dynamic=on"]).is_err(), "no target");
        let params = validate(&["--dynamic=on", &pid]).unwrap();
        assert_eq!(params.dynamic_pid, Some(std::process::id()));
        let err = validate(&["--dynamic=on", &pid, "--sys-period=5"]).unwrap_err();
        assert!(matches!(err, ValidationError::Conflict { second: ArgId::SysPeriod, .. }));
        assert!(validate(&["--dynamic=on", "--pid=0"]).is_err());
    }

    #[test]
    fn test_mstx_domains() {
        assert!(validate(&["--mstx-domain-include=a"]).is_err());
        assert!(validate(&["--msproftx=on", "--mstx-domain-include=a"]).is_ok());
        let err = validate(&["--msproftx=on", "--mstx-domain-include=a", "--mstx-domain-exclude=b"]).unwrap_err();
        assert!(matches!(err, ValidationError::Conflict { .. }));
    }

    #[test]
    fn test_rule_list() {
        assert!(validate(&["--rule=communication,communication_matrix"]).is_ok());
        assert!(validate(&["--rule=communication,memory"]).is_err());
    }

    #[test]
    fn test_output_and_positional_app() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("myapp");
        std::fs::write(&app, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&app, std::fs::Permissions::from_mode(0o755)).unwrap();
        let out = format!("--output={}", dir.path().join("out").display());
        let app_arg = app.display().to_string();
        let params = validate(&[&out, &app_arg, "--batch", "8"]).unwrap();
        assert!(params.result_dir.ends_with("out"));
        assert_eq!(params.application.as_deref(), Some("myapp"));
        assert_eq!(params.app_parameters, vec!["--batch", "8"]);
        assert!(params.is_used(ArgId::Application));
    }
}
