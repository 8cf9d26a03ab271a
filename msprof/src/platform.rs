//! Platform capability service
//!
//! Answers "what does this accelerator generation support" for validation and
//! default-setting: feature flags, metric whitelists, container detection.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformType {
    Mini,
    Cloud,
    MiniV3,
    CloudV2,
}

/// Optional capabilities that gate option values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// AI core low-power-mode counters.
    AicoreLpm,
    /// `--task-time=l3`.
    TaskTimeL3,
    /// `--llc-profiling=capacity|bandwidth` instead of `read|write`.
    LlcCapacityBandwidth,
    /// `--sys-hardware-mem-freq` up to 10000.
    HardwareMemHighFreq,
    InstrProfiling,
    SysLowPower,
}

const MINI_METRICS: &[&str] = &[
    "ArithmeticUtilization",
    "PipeUtilization",
    "Memory",
    "MemoryL0",
    "ResourceConflictRatio",
    "MemoryUB",
];

const CLOUD_METRICS: &[&str] = &[
    "ArithmeticUtilization",
    "PipeUtilization",
    "Memory",
    "MemoryL0",
    "ResourceConflictRatio",
    "MemoryUB",
    "L2Cache",
];

const V2_METRICS: &[&str] = &[
    "ArithmeticUtilization",
    "PipeUtilization",
    "Memory",
    "MemoryL0",
    "ResourceConflictRatio",
    "MemoryUB",
    "L2Cache",
    "PipeExecuteUtilization",
    "MemoryAccess",
];

pub trait Platform: Send + Sync {
    fn platform_type(&self) -> PlatformType;

    /// Running inside a virtualized container.
    fn in_container(&self) -> bool;

    /// Running on the device's own control CPU rather than the host.
    fn soc_side(&self) -> bool {
        false
    }

    fn supports(&self, feature: Feature) -> bool {
        let ty = self.platform_type();
        match feature {
            Feature::AicoreLpm | Feature::TaskTimeL3 | Feature::HardwareMemHighFreq => {
                matches!(ty, PlatformType::CloudV2 | PlatformType::MiniV3)
            }
            Feature::LlcCapacityBandwidth => ty == PlatformType::Mini,
            Feature::InstrProfiling => ty == PlatformType::CloudV2,
            Feature::SysLowPower => ty != PlatformType::Mini,
        }
    }

    /// Metric groups accepted by `--aic-metrics` / `--aiv-metrics`.
    fn metrics_whitelist(&self) -> &'static [&'static str] {
        match self.platform_type() {
            PlatformType::Mini => MINI_METRICS,
            PlatformType::Cloud => CLOUD_METRICS,
            PlatformType::MiniV3 | PlatformType::CloudV2 => V2_METRICS,
        }
    }

    /// Default `--aic-metrics` when AI core profiling is on.
    fn default_metrics(&self) -> &'static str {
        "PipeUtilization"
    }
}

/// Capability service for the machine msprof runs on.
pub struct HostPlatform {
    platform_type: PlatformType,
    in_container: bool,
}

impl HostPlatform {
    /// Probe the host. The chip generation comes from the driver, which is
    /// not linked here, so the newest generation's capability table is used.
    #[must_use]
    pub fn detect() -> Self {
        Self { platform_type: PlatformType::CloudV2, in_container: detect_container() }
    }

    #[must_use]
    pub fn new(platform_type: PlatformType, in_container: bool) -> Self {
        Self { platform_type, in_container }
    }
}

impl Platform for HostPlatform {
    fn platform_type(&self) -> PlatformType {
        self.platform_type
    }

    fn in_container(&self) -> bool {
        self.in_container
    }
}

fn detect_container() -> bool {
    if Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists() {
        return true;
    }
    let Ok(cgroup) = std::fs::read_to_string("/proc/1/cgroup") else {
        return false;
    };
    cgroup_indicates_container(&cgroup)
}

fn cgroup_indicates_container(cgroup: &str) -> bool {
    ["docker", "kubepods", "containerd", "lxc"].iter().any(|marker| cgroup.contains(marker))
}
